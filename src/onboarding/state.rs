//! Registration state machine — tracks which step a member is in.

use serde::{Deserialize, Serialize};

/// The steps of the registration conversation.
///
/// Progresses linearly: Welcome → ApiKey → SelectMain → Complete. Persisted
/// as the integers 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    Welcome,
    ApiKey,
    SelectMain,
    Complete,
}

impl RegistrationStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: RegistrationStep) -> bool {
        use RegistrationStep::*;
        matches!(
            (self, target),
            (Welcome, ApiKey) | (ApiKey, SelectMain) | (SelectMain, Complete)
        )
    }

    /// Whether this step is terminal (registration is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<RegistrationStep> {
        use RegistrationStep::*;
        match self {
            Welcome => Some(ApiKey),
            ApiKey => Some(SelectMain),
            SelectMain => Some(Complete),
            Complete => None,
        }
    }

    /// The integer stored in the `registration_step` column.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Welcome => 0,
            Self::ApiKey => 1,
            Self::SelectMain => 2,
            Self::Complete => 3,
        }
    }

    /// Parse the stored integer. Returns `None` outside 0–3.
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Welcome),
            1 => Some(Self::ApiKey),
            2 => Some(Self::SelectMain),
            3 => Some(Self::Complete),
            _ => None,
        }
    }

    /// Title shown to the user while they are being asked to complete this
    /// step. Only the two steps that need input are numbered.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Welcome | Self::ApiKey => "Registration Step 1 of 2",
            Self::SelectMain => "Registration Step 2 of 2",
            Self::Complete => "Registration Complete",
        }
    }
}

impl Default for RegistrationStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::ApiKey => "api_key",
            Self::SelectMain => "select_main",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
