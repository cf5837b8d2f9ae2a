//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default root of the Guild Wars 2 REST API.
pub const DEFAULT_GW2_API_BASE_URL: &str = "https://api.guildwars2.com";

/// Bot configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token. The Discord channel is disabled when unset.
    pub discord_token: Option<SecretString>,
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Prefix that marks a message as a command (e.g. `!builds_dps`).
    pub command_prefix: String,
    /// Whether to run the local stdin/stdout channel.
    pub cli_enabled: bool,
    /// Root URL of the game API.
    pub api_base_url: String,
    /// Timeout applied to each API request and to each ingestion phase.
    pub api_timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: None,
            db_path: PathBuf::from("./data/rallybot.db"),
            command_prefix: "!".to_string(),
            cli_enabled: false,
            api_base_url: DEFAULT_GW2_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(10),
        }
    }
}

impl BotConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let discord_token = lookup("DISCORD_BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let db_path = lookup("RALLYBOT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let command_prefix = lookup("RALLYBOT_COMMAND_PREFIX")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.command_prefix);

        let cli_enabled = lookup("RALLYBOT_CLI")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.cli_enabled);

        let api_base_url = lookup("GW2_API_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let api_timeout = match lookup("GW2_API_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "Invalid GW2_API_TIMEOUT_SECS, using default");
                    defaults.api_timeout
                }
            },
            None => defaults.api_timeout,
        };

        Self {
            discord_token,
            db_path,
            command_prefix,
            cli_enabled,
            api_base_url,
            api_timeout,
        }
    }

    /// Fail if no chat channel would be started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord_token.is_none() && !self.cli_enabled {
            return Err(ConfigError::NoChannels {
                hint: "Set DISCORD_BOT_TOKEN or RALLYBOT_CLI=1.".to_string(),
            });
        }
        Ok(())
    }
}
