//! User-facing text for each registration step.

use std::collections::BTreeMap;

use super::ingest::IngestError;
use super::state::RegistrationStep;

/// Sent on first contact.
pub const WELCOME: &str = "\
Welcome to EK Discord! We require an API key to register, which we use to \
retrieve account/character names, guild status, home world and build info.
The API does not provide us with sensitive information such as real name, \
email address, or passwords.
Please direct message this bot your API key with access to account, \
characters, builds and progression to continue registration.";

pub const ALREADY_COMPLETED: &str = "Registration already completed!";

pub const INTERNAL_ERROR: &str =
    "Something went wrong on our side while saving your registration. Please try again later.";

/// Reminder of what the API key step expects.
const SEND_API_KEY: &str = "Please respond with a valid GW2 API key with account, \
characters, builds and progression information.";

/// One line per character: `Name (Profession)`.
pub fn characters_to_string(characters: &BTreeMap<String, String>) -> String {
    characters
        .iter()
        .map(|(name, profession)| format!("{name} ({profession})\n"))
        .collect()
}

/// Sent once the API key has been verified.
pub fn api_verified(characters: &BTreeMap<String, String>) -> String {
    format!(
        "API Successfully Verified!\nPlease select your main from the list of characters below:\n{}Respond with the name of your selection.",
        characters_to_string(characters)
    )
}

/// Sent when the API key could not be ingested.
pub fn ingest_failed(err: &IngestError) -> String {
    match err {
        IngestError::InvalidKey { text } => {
            format!("Problem using API Key: '{text}'\n{SEND_API_KEY}")
        }
        IngestError::NoCharacters => {
            format!("That account has no characters yet. Create one in game, or use a different key.\n{SEND_API_KEY}")
        }
        IngestError::Upstream { text } => format!(
            "The Guild Wars 2 API could not be used right now: '{text}'\nPlease try again shortly by sending your API key again."
        ),
        IngestError::Timeout { .. } => "The Guild Wars 2 API took too long to respond.\nPlease try again shortly by sending your API key again.".to_string(),
    }
}

/// Sent when the selection is not one of the member's characters.
pub fn selection_not_found(characters: &BTreeMap<String, String>) -> String {
    format!(
        "Selection not found!\nPlease respond with the name of your main character from the list below:\n{}",
        characters_to_string(characters)
    )
}

/// Sent when the main character has been recorded.
pub fn main_selected(name: &str) -> String {
    format!("{name} Selected\nRegistration Complete!")
}

/// Prompt for a member whose message was already handled by a concurrent
/// one; repeats what the current step expects.
pub fn resume(step: RegistrationStep, characters: &BTreeMap<String, String>) -> String {
    let prompt = match step {
        RegistrationStep::Welcome | RegistrationStep::ApiKey => SEND_API_KEY.to_string(),
        RegistrationStep::SelectMain => format!(
            "Please respond with the name of your main character from the list below:\n{}",
            characters_to_string(characters)
        ),
        RegistrationStep::Complete => ALREADY_COMPLETED.to_string(),
    };
    format!("Your previous message was already processed.\n{prompt}")
}
