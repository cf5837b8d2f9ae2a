//! Rallybot — guild chat bot with build commands and member registration.

pub mod bot;
pub mod channels;
pub mod commands;
pub mod config;
pub mod error;
pub mod gw2;
pub mod onboarding;
pub mod reply;
pub mod store;
