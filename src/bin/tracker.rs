use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use atbat_tracker::api;
use atbat_tracker::config::{AppConfig, CONFIG_PATH};
use atbat_tracker::cycle::{CycleSettings, poll_cycle};
use atbat_tracker::feed::{AtBatFeed, MlbFeed, SimulatedFeed};
use atbat_tracker::formatter::format_startup_message;
use atbat_tracker::notifier::{LogNotifier, Notifier, XClient};
use atbat_tracker::reporter;
use atbat_tracker::state::TrackerState;

/// gamePk used for simulated at-bats.
const SIMULATED_GAME_PK: u64 = 1;

#[derive(Parser)]
#[command(name = "tracker", about = "Post a player's at-bats to X as they happen")]
struct Args {
    /// Log tweets instead of posting them
    #[arg(long, conflicts_with = "live")]
    dry_run: bool,

    /// Post tweets to the configured X account
    #[arg(long, conflicts_with = "dry_run")]
    live: bool,

    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override `player.id` from the config
    #[arg(long)]
    player_id: Option<u32>,

    /// Generate random at-bats instead of reading the MLB feed
    #[arg(long)]
    simulate: bool,

    /// Post a one-off deployment test message on startup
    #[arg(long)]
    announce_startup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Require exactly one mode
    if !args.dry_run && !args.live {
        anyhow::bail!("Must specify either --dry-run or --live");
    }

    let mut config = AppConfig::load(&args.config)?;
    config.apply_env_overrides();
    if let Some(id) = args.player_id {
        config.player.id = id;
    }
    config.validate()?;
    info!("Loaded config from {}", args.config.display());

    if args.live && config.account.access_token.trim().is_empty() {
        anyhow::bail!("--live requires account.access_token (or X_ACCESS_TOKEN); run setup-account first");
    }

    let poll_interval_secs = config.settings.poll_interval_secs;
    let mode = if args.dry_run { "dry-run" } else { "live" };
    info!(
        "Starting tracker ({mode}) — player={} ({}) style={:?} poll={}s simulate={}",
        config.player.name,
        config.player.id,
        config.settings.style,
        poll_interval_secs,
        args.simulate,
    );

    let http = reqwest::Client::new();

    let feed: Box<dyn AtBatFeed> = if args.simulate {
        Box::new(SimulatedFeed::new(SIMULATED_GAME_PK))
    } else {
        Box::new(MlbFeed::new(http.clone()))
    };

    let notifier: Box<dyn Notifier> = if args.live {
        let client = XClient::new(http.clone(), config.account.access_token.clone());
        match client.me().await {
            Ok(user) => info!("Authenticated as @{} ({})", user.username, user.name),
            Err(e) => anyhow::bail!("X authentication failed: {e:#}"),
        }
        Box::new(client)
    } else {
        Box::new(LogNotifier::new())
    };

    if args.announce_startup {
        info!("Sending deployment test message...");
        let text = format_startup_message(&config.player, chrono::Utc::now());
        match notifier.post(&text).await {
            Ok(receipt) => info!("Deployment test message sent (id: {:?})", receipt.id),
            Err(e) => error!("Failed to send deployment test message: {e:#}"),
        }
    }

    let settings = CycleSettings {
        player: config.player.clone(),
        style: config.settings.style,
        inter_post_delay: Duration::from_millis(config.settings.inter_post_delay_ms),
    };
    let mut state = TrackerState::new(
        config.player.id,
        Duration::from_secs(config.settings.season_stats_ttl_secs),
    );

    // --- Polling loop ---
    info!("Entering polling loop (interval: {poll_interval_secs}s). Press Ctrl+C to stop.");
    let poll_duration = Duration::from_secs(poll_interval_secs);
    let mut first = true;

    loop {
        // First poll runs immediately; later ones wait out the interval.
        let wait = if first { Duration::ZERO } else { poll_duration };
        first = false;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = poll_cycle(feed.as_ref(), notifier.as_ref(), &settings, &mut state).await {
                    warn!("Poll cycle error: {e:#}");
                }
                if let Some(url) = &config.settings.keepalive_url {
                    api::keep_alive(&http, url).await;
                }
                info!("{}", state.status_line());
            }
        }
    }

    reporter::report_run_summary(&state.summary());

    Ok(())
}
