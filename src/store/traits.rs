//! Async interface for per-member persistence.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::onboarding::RegistrationStep;

/// One guild member's registration record, keyed by platform user id.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRecord {
    pub id: String,
    pub registration_step: RegistrationStep,
    /// Display name captured at first contact.
    pub discord_name: String,
    /// Character name → profession, written once the API key is verified.
    pub characters: BTreeMap<String, String>,
    pub acct_name: Option<String>,
    pub server: Option<String>,
    pub main_character: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberUpdate {
    pub characters: Option<BTreeMap<String, String>>,
    pub acct_name: Option<String>,
    pub server: Option<String>,
    pub main_character: Option<String>,
}

/// Backend-agnostic member store.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    /// Get a member by id.
    async fn get_member(&self, id: &str) -> Result<Option<MemberRecord>, DatabaseError>;

    /// Create the member at the welcome step if absent, then return the
    /// stored record. An existing record is returned unchanged.
    async fn create_member(
        &self,
        id: &str,
        discord_name: &str,
    ) -> Result<MemberRecord, DatabaseError>;

    /// Write the non-`None` fields of `update`, creating the member at the
    /// welcome step with an empty display name if absent.
    async fn update_member(&self, id: &str, update: &MemberUpdate) -> Result<(), DatabaseError>;

    /// Atomically apply `update` and advance the registration step by one,
    /// only if the stored step still equals `expected`.
    ///
    /// Returns `false` (and changes nothing) when the step has moved on or
    /// `expected` is terminal.
    async fn advance_step(
        &self,
        id: &str,
        expected: RegistrationStep,
        update: &MemberUpdate,
    ) -> Result<bool, DatabaseError>;
}
