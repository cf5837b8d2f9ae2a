//! Bot — the main dispatch loop.
//!
//! Reads merged inbound messages from every channel and answers each one to
//! completion before reading the next.

use std::sync::Arc;

use futures::StreamExt;

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::commands::CommandResponder;
use crate::error::Error;
use crate::onboarding::OnboardingManager;
use crate::reply::Reply;

pub struct Bot {
    channels: Arc<ChannelManager>,
    commands: CommandResponder,
    onboarding: Arc<OnboardingManager>,
}

impl Bot {
    pub fn new(
        channels: Arc<ChannelManager>,
        commands: CommandResponder,
        onboarding: Arc<OnboardingManager>,
    ) -> Self {
        Self {
            channels,
            commands,
            onboarding,
        }
    }

    /// Run until Ctrl+C or until every channel stream has ended.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        tracing::info!(channels = ?self.channels.names(), "Bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let Some(reply) = self.handle_message(&message).await else {
                continue;
            };
            match self
                .channels
                .respond(&message, OutgoingResponse::new(reply))
                .await
            {
                Ok(()) => tracing::debug!(
                    channel = %message.channel,
                    latency_ms = (chrono::Utc::now() - message.received_at).num_milliseconds(),
                    "Reply sent"
                ),
                Err(e) => {
                    tracing::warn!(channel = %message.channel, "Failed to send reply: {}", e)
                }
            }
        }

        self.channels.shutdown_all().await;
        Ok(())
    }

    /// Decide what, if anything, to answer `message` with.
    ///
    /// Commands are answered anywhere. Other direct messages drive
    /// registration. Anything else is ignored.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<Reply> {
        if let Some(command) = self.commands.parse(&message.content) {
            tracing::debug!(
                channel = %message.channel,
                user_id = %message.user_id,
                ?command,
                "Command received"
            );
            return Some(self.commands.respond(&command));
        }

        if !message.is_direct {
            return None;
        }

        Some(
            self.onboarding
                .handle_message(&message.user_id, message.display_name(), &message.content)
                .await,
        )
    }
}
