use std::sync::Arc;

use rallybot::bot::Bot;
use rallybot::channels::{ChannelManager, CliChannel, DiscordChannel};
use rallybot::commands::CommandResponder;
use rallybot::config::BotConfig;
use rallybot::gw2::{GameApi, Gw2Client};
use rallybot::onboarding::{InMemorySessions, OnboardingManager, SessionTracker};
use rallybot::store::{LibSqlBackend, MemberStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        eprintln!("  export DISCORD_BOT_TOKEN=...   # run on Discord");
        eprintln!("  export RALLYBOT_CLI=1          # run in this terminal");
        std::process::exit(1);
    }

    eprintln!("🛡️  Rallybot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   GW2 API: {}", config.api_base_url);
    eprintln!("   Command prefix: {}", config.command_prefix);

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn MemberStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    eprintln!("   Database: {}", config.db_path.display());

    // ── Onboarding ───────────────────────────────────────────────────────
    let api: Arc<dyn GameApi> = Arc::new(Gw2Client::new(
        config.api_base_url.clone(),
        config.api_timeout,
    )?);
    let sessions: Arc<dyn SessionTracker> = Arc::new(InMemorySessions::new());
    let onboarding = Arc::new(OnboardingManager::new(
        store,
        api,
        sessions,
        config.api_timeout,
    ));

    // ── Channels ─────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    let mut active_channels = Vec::new();

    if let Some(token) = config.discord_token.clone() {
        channels.add(Box::new(DiscordChannel::new(token)));
        active_channels.push("discord");
    }

    if config.cli_enabled {
        channels.add(Box::new(CliChannel::default()));
        active_channels.push("cli");
    }

    eprintln!("   Channels: {}\n", active_channels.join(", "));

    let unhealthy = channels.health_check_all().await;
    if !unhealthy.is_empty() {
        eprintln!("Warning: channel check failed for: {}", unhealthy.join(", "));
    }

    let bot = Bot::new(
        Arc::new(channels),
        CommandResponder::new(config.command_prefix.clone()),
        onboarding,
    );
    bot.run().await?;

    Ok(())
}
