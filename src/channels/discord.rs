//! Discord channel: gateway events in, embeds out, via serenity.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serenity::all::{
    ChannelId, Client, Context, CreateEmbed, CreateMessage, EventHandler, GatewayIntents, Http,
    Message, Ready, ShardManager,
};
use tokio::sync::{Mutex, mpsc};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;
use crate::reply::Reply;

/// Maximum length of an embed description.
const DISCORD_EMBED_DESC_LIMIT: usize = 4096;
/// Maximum number of fields in one embed.
const DISCORD_EMBED_FIELD_LIMIT: usize = 25;

/// Connects to the Discord gateway and replies with embeds.
pub struct DiscordChannel {
    token: SecretString,
    http: Arc<Http>,
    shard_manager: Mutex<Option<Arc<ShardManager>>>,
}

impl DiscordChannel {
    pub fn new(token: SecretString) -> Self {
        let http = Arc::new(Http::new(token.expose_secret()));
        Self {
            token,
            http,
            shard_manager: Mutex::new(None),
        }
    }
}

/// Gateway event handler forwarding user messages into the channel stream.
struct Handler {
    tx: mpsc::UnboundedSender<IncomingMessage>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        // Ignore bots, including ourselves.
        if msg.author.bot {
            return;
        }

        let content = msg.content.trim();
        if content.is_empty() {
            return;
        }

        let mut incoming = IncomingMessage::new("discord", &msg.author.id.to_string(), content)
            .with_user_name(&msg.author.tag())
            .with_metadata(serde_json::json!({
                "channel_id": msg.channel_id.get(),
                "guild_id": msg.guild_id.map(|g| g.get()),
            }));
        if msg.guild_id.is_none() {
            incoming = incoming.direct();
        }

        tracing::debug!(
            user_id = %incoming.user_id,
            direct = incoming.is_direct,
            "Discord message received"
        );

        if self.tx.send(incoming).is_err() {
            tracing::info!("Discord listener channel closed");
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(bot = %ready.user.name, "Discord bot connected");
    }
}

/// Read the Discord channel id stored in message metadata.
fn channel_id_from(metadata: &serde_json::Value) -> Option<ChannelId> {
    metadata
        .get("channel_id")
        .and_then(|v| v.as_u64())
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}

/// Cut `text` to at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Render a reply as a Discord embed.
fn build_embed(reply: &Reply) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&reply.title)
        .description(truncate_chars(&reply.description, DISCORD_EMBED_DESC_LIMIT))
        .color(reply.color);
    for field in reply.fields.iter().take(DISCORD_EMBED_FIELD_LIMIT) {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    embed
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let mut client = Client::builder(self.token.expose_secret(), intents)
            .event_handler(Handler { tx })
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "discord".into(),
                reason: e.to_string(),
            })?;

        *self.shard_manager.lock().await = Some(Arc::clone(&client.shard_manager));

        tokio::spawn(async move {
            if let Err(e) = client.start().await {
                tracing::error!("Discord client stopped: {}", e);
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel_id =
            channel_id_from(&msg.metadata).ok_or_else(|| ChannelError::SendFailed {
                name: "discord".into(),
                reason: "No channel_id in message metadata".into(),
            })?;

        let message = CreateMessage::new().embed(build_embed(&response.reply));
        channel_id
            .send_message(self.http.as_ref(), message)
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "discord".into(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        self.http
            .get_current_user()
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::Disconnected {
                name: "discord".into(),
                reason: e.to_string(),
            })
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Discord channel shutting down");
        if let Some(manager) = self.shard_manager.lock().await.take() {
            manager.shutdown_all().await;
        }
        Ok(())
    }
}
