//! setup-account — First-time setup for the at-bat tracker.
//!
//! Expects `config.toml` to already exist (copied from `config.toml.template`).
//! Verifies the X access token against `GET /2/users/me`, prints the
//! account it belongs to, and writes the token into the config file.
//!
//! By default, reads the token interactively (hidden input) to avoid
//! leaking it into shell history. Use `--access-token` only for scripted/CI use.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use atbat_tracker::config::{AppConfig, CONFIG_PATH};
use atbat_tracker::notifier::XClient;

#[derive(Parser)]
#[command(
    name = "setup-account",
    about = "Verify an X access token and save it to config.toml"
)]
struct Cli {
    /// OAuth 2.0 user-context access token.
    /// If omitted, reads interactively with hidden input (recommended).
    #[arg(long)]
    access_token: Option<String>,

    /// Path to the TOML config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_path();

    // Load existing config
    let mut app_config = AppConfig::load(config_path).with_context(|| {
        format!(
            "{} not found — copy config.toml.template to config.toml first",
            config_path.display()
        )
    })?;

    println!("=== At-Bat Tracker — Account Setup ===\n");

    // ── Step 1: Read access token ──────────────────────────────────
    let access_token = match cli.access_token {
        Some(token) => token.trim().to_string(),
        None => {
            let token = rpassword::prompt_password("Enter X access token: ")
                .context("failed to read access token")?;
            token.trim().to_string()
        }
    };
    if access_token.is_empty() {
        bail!("access token cannot be empty");
    }

    // ── Step 2: Verify against the X API ───────────────────────────
    println!("Verifying access token...");
    let client = XClient::new(reqwest::Client::new(), access_token.clone());
    let user = client
        .me()
        .await
        .context("X authentication failed — check your access token")?;
    println!("  Account: @{} ({})", user.username, user.name);
    println!("  User id: {}", user.id);
    println!();

    // ── Step 3: Update access token in config.toml ─────────────────
    println!("Updating access token in {}...", config_path.display());
    app_config.account.access_token = access_token;
    app_config.save(config_path)?;
    println!("  Config updated successfully");
    println!();

    // ── Summary ────────────────────────────────────────────────────
    println!("=== Setup Complete ===");
    println!();
    println!("Tracking: {} (MLB id {})", app_config.player.name, app_config.player.id);
    println!();
    println!("Next steps:");
    println!("  cargo run --bin tracker -- --dry-run");
    println!("  cargo run --bin tracker -- --live --announce-startup");

    Ok(())
}
