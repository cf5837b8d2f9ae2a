//! Onboarding system — registration over direct messages.
//!
//! A new member is walked through a fixed sequence of steps: welcome, API key
//! submission, main character selection. The API key is resolved against the
//! game API into account and character data, which is stored on the member
//! record. Steps only ever advance one at a time.

pub mod ingest;
pub mod manager;
pub mod prompts;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use ingest::{AccountProfile, IngestError, IngestPhase, ingest_api_key};
pub use manager::OnboardingManager;
pub use session::{InMemorySessions, SessionTracker};
pub use state::RegistrationStep;
