//! Guild build guides served by the build commands.

use crate::reply::{NEUTRAL_COLOR, Reply, SUCCESS_COLOR};

/// One linked build in a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLink {
    pub name: &'static str,
    pub url: &'static str,
    pub inline: bool,
}

/// A titled list of builds.
#[derive(Debug, Clone, Copy)]
pub struct BuildGuide {
    pub title: &'static str,
    pub description: &'static str,
    pub color: u32,
    pub builds: &'static [BuildLink],
}

impl BuildGuide {
    pub fn to_reply(&self) -> Reply {
        self.builds
            .iter()
            .fold(
                Reply::new(self.title, self.description, self.color),
                |reply, build| reply.with_field(build.name, build.url, build.inline),
            )
    }
}

pub const SUPPORT_BUILDS: BuildGuide = BuildGuide {
    title: "Support Builds",
    description: "Current EK meta support builds",
    color: SUCCESS_COLOR,
    builds: &[
        BuildLink {
            name: "Firebrand",
            url: "http://en.gw2skills.net/editor/?PWyAYl7lRwwYdMJmJmyXqvdA-zRJYjRNfZkZKUdF47hIANLtfAA-e",
            inline: false,
        },
        BuildLink {
            name: "Scrapper (Medic)",
            url: "http://en.gw2skills.net/editor/?Pe0AIp7lNwcYPMP2Je6TntKA-zRJYjRN/ZkpSoaZgknl2PAA-e",
            inline: false,
        },
        BuildLink {
            name: "Tempest",
            url: "http://gw2skills.net/editor/?PG0AgiZlRwSYNMGWJm2WrtdA-zVhYBRQIEdwYYnBfIBJByUF0tQwhXig0bp9DA-w",
            inline: true,
        },
    ],
};

pub const DPS_BUILDS: BuildGuide = BuildGuide {
    title: "DPS Builds",
    description: "Current EK meta DPS builds",
    color: NEUTRAL_COLOR,
    builds: &[
        BuildLink {
            name: "Reaper (Power)",
            url: "http://en.gw2skills.net/editor/?PS0AEd3lVwOYIsEWJeeXntbA-zRRYBRNnvYQBFSThQmVQFJgKDA-e",
            inline: true,
        },
        BuildLink {
            name: "Guardian (Burn)",
            url: "http://en.gw2skills.net/editor/?PWwAYt/lFwQCbdstC3IO+KZrNA-zVRYcRNHPZQDjRiKoeK44iEE9W45TD-w",
            inline: true,
        },
        BuildLink {
            name: "Dragon Hunter",
            url: "http://gw2skills.net/editor/?PWiAENlFwwYdMHWJO0X3tVA-zRJYiRFfh0SEkZJUbCo0hIANL8fGB-e",
            inline: true,
        },
        BuildLink {
            name: "Scrapper (Bomb)",
            url: "https://metabattle.com/wiki/Build:Scrapper_-_Big_Bomb_Kit",
            inline: true,
        },
        BuildLink {
            name: "Renegade",
            url: "http://en.gw2skills.net/editor/?PmiAIZldQIMHKi1QSsHCi9RgsASgFzU57G-zRJYnRF/ZkpUIdVgGvEhpHA-e",
            inline: true,
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_guide_lists_three_builds() {
        let reply = SUPPORT_BUILDS.to_reply();
        assert_eq!(reply.title, "Support Builds");
        assert_eq!(reply.color, SUCCESS_COLOR);
        let names: Vec<_> = reply.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Firebrand", "Scrapper (Medic)", "Tempest"]);
    }

    #[test]
    fn dps_guide_fields_are_inline() {
        let reply = DPS_BUILDS.to_reply();
        assert_eq!(reply.fields.len(), 5);
        assert!(reply.fields.iter().all(|f| f.inline));
    }

    #[test]
    fn urls_have_no_stray_whitespace() {
        for build in SUPPORT_BUILDS.builds.iter().chain(DPS_BUILDS.builds) {
            assert_eq!(build.url, build.url.trim(), "{}", build.name);
            assert!(build.url.starts_with("http"), "{}", build.name);
        }
    }
}
