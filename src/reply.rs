//! Embed-style replies shared by commands and onboarding.

use serde::{Deserialize, Serialize};

/// Accent colour for normal progress replies.
pub const SUCCESS_COLOR: u32 = 0x00_FF_00;
/// Accent colour for retryable failures.
pub const WARNING_COLOR: u32 = 0xE0_3B_24;
/// Accent colour for the help menu.
pub const HELP_COLOR: u32 = 0xEE_E6_57;
/// Accent colour for build listings without a specific colour.
pub const NEUTRAL_COLOR: u32 = 0x12_83_D8;

/// A named field inside a reply (e.g. a build name and its link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A titled, coloured reply. Channels decide how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ReplyField>,
}

impl Reply {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Plain-text rendering for channels without rich embeds.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("== {} ==", self.title);
        if !self.description.is_empty() {
            out.push('\n');
            out.push_str(&self.description);
        }
        for field in &self.fields {
            out.push_str(&format!("\n- {}: {}", field.name, field.value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_includes_fields() {
        let reply = Reply::new("DPS Builds", "Current meta", NEUTRAL_COLOR)
            .with_field("Reaper", "http://example.com/reaper", true);
        assert_eq!(
            reply.to_plain_text(),
            "== DPS Builds ==\nCurrent meta\n- Reaper: http://example.com/reaper"
        );
    }

    #[test]
    fn plain_text_without_description() {
        let reply = Reply::new("Title", "", SUCCESS_COLOR);
        assert_eq!(reply.to_plain_text(), "== Title ==");
    }
}
