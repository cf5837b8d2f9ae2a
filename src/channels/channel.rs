//! Core channel types: inbound messages, outbound replies, and the trait
//! every chat transport implements.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::ChannelError;
use crate::reply::Reply;

/// A message received from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Name of the channel it arrived on (`"discord"`, `"cli"`).
    pub channel: String,
    /// Platform user id (opaque, stable per user).
    pub user_id: String,
    /// Display name of the sender, if the platform provides one.
    pub user_name: Option<String>,
    pub content: String,
    /// Whether this is a private/direct message to the bot.
    pub is_direct: bool,
    /// Channel-specific routing data (e.g. Discord `channel_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            is_direct: false,
            metadata: serde_json::json!({}),
            received_at: Utc::now(),
        }
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn direct(mut self) -> Self {
        self.is_direct = true;
        self
    }

    /// Best available display name, falling back to the user id.
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_id)
    }
}

/// A reply to send back on the channel a message came from.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub reply: Reply,
}

impl OutgoingResponse {
    pub fn new(reply: Reply) -> Self {
        Self { reply }
    }
}

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name, matched against `IncomingMessage::channel`.
    fn name(&self) -> &str;

    /// Connect and start producing inbound messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Send a reply to the origin of `msg`.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Check the transport is reachable.
    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}
