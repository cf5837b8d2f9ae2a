//! API-key ingestion — resolves an API key into account and character data.
//!
//! Runs two fan-out phases against the game API:
//! 1. character names + account summary,
//! 2. home world name + one core lookup per character.
//!
//! Phase 2 needs the world id from phase 1. Within phase 2 the first failure
//! aborts the join and any in-flight lookups are dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::{join, try_join, try_join_all};

use crate::error::ApiError;
use crate::gw2::GameApi;

/// Everything onboarding keeps from a verified API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub acct_name: String,
    pub server: String,
    /// Character name → profession.
    pub characters: BTreeMap<String, String>,
}

/// Which fan-out phase a timeout happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    /// Character list and account summary.
    Account,
    /// World name and per-character details.
    Characters,
}

impl std::fmt::Display for IngestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Account => write!(f, "account lookup"),
            Self::Characters => write!(f, "character lookup"),
        }
    }
}

/// Why an API key could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// The API rejected the key.
    #[error("invalid API key: {text}")]
    InvalidKey { text: String },

    /// The API failed for reasons unrelated to the key.
    #[error("game API unavailable: {text}")]
    Upstream { text: String },

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: IngestPhase, after: Duration },

    #[error("no characters on this account")]
    NoCharacters,
}

impl IngestError {
    /// Whether resending the same key may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }

    fn from_api(err: ApiError) -> Self {
        if err.is_invalid_credential() {
            Self::InvalidKey {
                text: err.upstream_text(),
            }
        } else {
            Self::Upstream {
                text: err.upstream_text(),
            }
        }
    }
}

/// Resolve `api_key` into an `AccountProfile`.
///
/// Each phase is bounded by `phase_timeout`. An empty key fails without any
/// network calls.
pub async fn ingest_api_key(
    api: &dyn GameApi,
    api_key: &str,
    phase_timeout: Duration,
) -> Result<AccountProfile, IngestError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(IngestError::InvalidKey {
            text: "no API key provided".to_string(),
        });
    }

    // Phase 1: both requests run to completion; the character list is
    // checked first.
    let (names, account) = tokio::time::timeout(
        phase_timeout,
        join(api.character_names(api_key), api.account(api_key)),
    )
    .await
    .map_err(|_| IngestError::Timeout {
        phase: IngestPhase::Account,
        after: phase_timeout,
    })?;

    let names = names.map_err(IngestError::from_api)?;
    let account = account.map_err(IngestError::from_api)?;

    if names.is_empty() {
        return Err(IngestError::NoCharacters);
    }

    // Phase 2: fail fast on the first error.
    let world = api.world_name(account.world);
    let cores = try_join_all(names.iter().map(|name| api.character_core(api_key, name)));
    let (server, cores) = tokio::time::timeout(phase_timeout, try_join(world, cores))
        .await
        .map_err(|_| IngestError::Timeout {
            phase: IngestPhase::Characters,
            after: phase_timeout,
        })?
        .map_err(IngestError::from_api)?;

    let characters = cores
        .into_iter()
        .map(|core| (core.name, core.profession))
        .collect();

    Ok(AccountProfile {
        acct_name: account.name,
        server,
        characters,
    })
}
