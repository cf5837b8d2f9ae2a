//! Chat commands: prefixed messages answered with static content.

pub mod builds;

use crate::reply::{HELP_COLOR, Reply, WARNING_COLOR};

pub use builds::{BuildGuide, BuildLink, DPS_BUILDS, SUPPORT_BUILDS};

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    BuildsSupport,
    BuildsDps,
    /// Prefixed, but not a command we know. Holds the name as typed.
    Unknown(String),
}

/// Commands listed by the help menu, with their descriptions.
const HELP_ENTRIES: &[(&str, &str)] = &[
    ("builds_support", "Prints the current EK Support Builds"),
    ("builds_dps", "Prints the current EK DPS Builds"),
];

/// Parses prefixed messages and renders command replies.
#[derive(Debug, Clone)]
pub struct CommandResponder {
    prefix: String,
}

impl CommandResponder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Parse `content` as a command. Returns `None` if it does not start
    /// with the prefix. Only the first word counts; the rest is ignored.
    pub fn parse(&self, content: &str) -> Option<Command> {
        let rest = content.trim().strip_prefix(self.prefix.as_str())?;
        let name = rest.split_whitespace().next().unwrap_or_default();

        let command = match name.to_lowercase().as_str() {
            "help" => Command::Help,
            "builds_support" => Command::BuildsSupport,
            "builds_dps" => Command::BuildsDps,
            _ => Command::Unknown(name.to_string()),
        };
        Some(command)
    }

    pub fn respond(&self, command: &Command) -> Reply {
        match command {
            Command::Help => self.help(),
            Command::BuildsSupport => SUPPORT_BUILDS.to_reply(),
            Command::BuildsDps => DPS_BUILDS.to_reply(),
            Command::Unknown(name) => Reply::new(
                "Unknown Command",
                format!(
                    "Unknown command '{}{}'. Try {}help for a list of commands.",
                    self.prefix, name, self.prefix
                ),
                WARNING_COLOR,
            ),
        }
    }

    fn help(&self) -> Reply {
        HELP_ENTRIES.iter().fold(
            Reply::new(
                "Help Menu",
                "Current commands supported by the bot",
                HELP_COLOR,
            ),
            |reply, (name, description)| {
                reply.with_field(format!("{}{}", self.prefix, name), *description, false)
            },
        )
    }
}

impl Default for CommandResponder {
    fn default() -> Self {
        Self::new("!")
    }
}
