//! HTTP client for the Guild Wars 2 REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::model::{Account, CharacterCore, ErrorBody, World};
use crate::error::ApiError;

/// Read operations the bot needs from the game API.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Names of every character on the account owning `api_key`.
    async fn character_names(&self, api_key: &str) -> Result<Vec<String>, ApiError>;

    /// Account summary for `api_key`.
    async fn account(&self, api_key: &str) -> Result<Account, ApiError>;

    /// Display name of a world.
    async fn world_name(&self, world_id: u32) -> Result<String, ApiError>;

    /// Core details (including profession) of one character.
    async fn character_core(&self, api_key: &str, name: &str)
        -> Result<CharacterCore, ApiError>;
}

/// `GameApi` over HTTPS via reqwest.
pub struct Gw2Client {
    base_url: String,
    client: reqwest::Client,
}

impl Gw2Client {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rallybot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build `{base}/v2/{segments…}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("base URL {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push("v2")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        api_key: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.get(url);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                text: error_text(&body, status),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Extract the upstream error message from a non-success body.
fn error_text(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.text;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl GameApi for Gw2Client {
    async fn character_names(&self, api_key: &str) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["characters"])?;
        self.get_json(url, Some(api_key)).await
    }

    async fn account(&self, api_key: &str) -> Result<Account, ApiError> {
        let url = self.endpoint(&["account"])?;
        self.get_json(url, Some(api_key)).await
    }

    async fn world_name(&self, world_id: u32) -> Result<String, ApiError> {
        let mut url = self.endpoint(&["worlds"])?;
        url.query_pairs_mut()
            .append_pair("ids", &world_id.to_string());
        let worlds: Vec<World> = self.get_json(url, None).await?;
        worlds
            .into_iter()
            .find(|w| w.id == world_id)
            .map(|w| w.name)
            .ok_or_else(|| ApiError::Decode(format!("world {world_id} not found")))
    }

    async fn character_core(
        &self,
        api_key: &str,
        name: &str,
    ) -> Result<CharacterCore, ApiError> {
        let url = self.endpoint(&["characters", name, "core"])?;
        self.get_json(url, Some(api_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Gw2Client {
        Gw2Client::new("https://api.guildwars2.com/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_joins_segments() {
        let url = client().endpoint(&["account"]).unwrap();
        assert_eq!(url.as_str(), "https://api.guildwars2.com/v2/account");
    }

    #[test]
    fn endpoint_encodes_character_names() {
        let url = client()
            .endpoint(&["characters", "Sir Alice", "core"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.guildwars2.com/v2/characters/Sir%20Alice/core"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = Gw2Client::new("http://127.0.0.1:8080/proxy", Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["characters"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/v2/characters");
    }

    #[test]
    fn error_text_prefers_json_text() {
        let text = error_text(
            r#"{"text":"Invalid access token"}"#,
            reqwest::StatusCode::UNAUTHORIZED,
        );
        assert_eq!(text, "Invalid access token");
    }

    #[test]
    fn error_text_falls_back_to_body_then_status() {
        assert_eq!(
            error_text("  upstream down ", reqwest::StatusCode::BAD_GATEWAY),
            "upstream down"
        );
        assert_eq!(
            error_text("", reqwest::StatusCode::SERVICE_UNAVAILABLE),
            "503 Service Unavailable"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let client = Gw2Client::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.account("key").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    }
}
