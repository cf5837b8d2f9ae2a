//! ChannelManager — starts every channel and routes replies back.

use futures::stream::{self, StreamExt};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

/// Owns the configured channels.
#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Check every channel, logging failures. Returns the names of the
    /// channels that failed.
    pub async fn health_check_all(&self) -> Vec<String> {
        let mut failed = Vec::new();
        for channel in &self.channels {
            match channel.health_check().await {
                Ok(()) => tracing::debug!(channel = channel.name(), "Channel healthy"),
                Err(e) => {
                    tracing::warn!(channel = channel.name(), "Channel health check failed: {}", e);
                    failed.push(channel.name().to_string());
                }
            }
        }
        failed
    }

    /// Start every channel and merge their inbound streams.
    ///
    /// A channel that fails to start is logged and skipped; it is an error
    /// only if none start.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            match channel.start().await {
                Ok(s) => {
                    tracing::info!(channel = channel.name(), "Channel started");
                    streams.push(s);
                }
                Err(e) => {
                    tracing::error!(channel = channel.name(), "Channel failed to start: {}", e);
                }
            }
        }

        if streams.is_empty() {
            return Err(ChannelError::StartupFailed {
                name: "all".into(),
                reason: "no channel started".into(),
            });
        }

        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Send a reply on the channel `msg` arrived from.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.name() == msg.channel)
            .ok_or_else(|| ChannelError::SendFailed {
                name: msg.channel.clone(),
                reason: "unknown channel".into(),
            })?;
        channel.respond(msg, response).await
    }

    pub async fn shutdown_all(&self) {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), "Channel shutdown failed: {}", e);
            }
        }
    }
}
