//! Response types for the Guild Wars 2 API endpoints the bot reads.

use serde::{Deserialize, Serialize};

/// `GET /v2/account`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// Display name, e.g. `Alice.1234`.
    pub name: String,
    /// Home world id.
    pub world: u32,
}

/// `GET /v2/characters/{name}/core`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCore {
    pub name: String,
    pub profession: String,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
}

/// One entry of `GET /v2/worlds?ids=…`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub population: Option<String>,
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub text: String,
}
