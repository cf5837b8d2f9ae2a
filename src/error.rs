//! Error types for rallybot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Game API error: {0}")]
    Api(#[from] ApiError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No chat channel enabled. {hint}")]
    NoChannels { hint: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Errors returned by the Guild Wars 2 API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The API answered with a non-success status. `text` is the upstream
    /// error message (the `text` field of the JSON body when present).
    #[error("{text}")]
    Status { status: u16, text: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the API rejected the credential itself rather than failing.
    pub fn is_invalid_credential(&self) -> bool {
        match self {
            Self::Status { status, text } => {
                matches!(status, 401 | 403)
                    || (*status == 400 && text.to_lowercase().contains("access token"))
            }
            _ => false,
        }
    }

    /// The message to surface to the user.
    pub fn upstream_text(&self) -> String {
        match self {
            Self::Status { text, .. } => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Onboarding failures the user cannot fix by resubmitting a message.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
