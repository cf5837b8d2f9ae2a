//! Guild Wars 2 API integration.
//!
//! `GameApi` is the seam the onboarding flow depends on; `Gw2Client` is the
//! reqwest-backed implementation used in production.

pub mod client;
pub mod model;

pub use client::{GameApi, Gw2Client};
pub use model::{Account, CharacterCore, World};
