//! Probe: MLB Stats API live feed
//!
//! Resolves the player's team, lists the team's games for a date, and prints
//! every at-bat extracted for the player along with the tweet each would produce:
//! - Schedule lookup and game states
//! - Live feed latency per game
//! - Extracted event ids, outcomes and metrics
//! - Season stats as fetched

use std::time::Instant;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;

use atbat_tracker::api;
use atbat_tracker::config::{PlayerConfig, TweetStyle};
use atbat_tracker::feed::{extract_at_bats, game_date};
use atbat_tracker::formatter::format_tweet;

#[derive(Parser)]
#[command(name = "probe_feed", about = "Inspect the at-bats the MLB feed yields for a player")]
struct Args {
    /// MLBAM player id
    #[arg(long, default_value_t = 596019)]
    player_id: u32,

    /// Game date (YYYY-MM-DD); defaults to today in US/Eastern
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let date = args.date.unwrap_or_else(|| game_date(Utc::now()));

    println!("=== Probe: MLB live feed ===");
    println!("Player: {}  Date: {date}", args.player_id);
    println!();

    println!("--- 1. Current team ---");
    let Some(team_id) = api::fetch_current_team(&client, args.player_id).await? else {
        println!("Player has no current team");
        return Ok(());
    };
    println!("Team id: {team_id}");
    println!();

    println!("--- 2. Schedule ---");
    let games = api::fetch_games_on(&client, team_id, date).await?;
    if games.is_empty() {
        println!("No games scheduled");
    }
    for game in &games {
        println!("gamePk={} state={}", game.game_pk, game.status.abstract_game_state);
    }
    println!();

    println!("--- 3. Season stats ---");
    let season = api::fetch_season_stats(&client, args.player_id, date.year()).await?;
    println!("{}", serde_json::to_string_pretty(&season)?);
    println!();

    let player = PlayerConfig {
        id: args.player_id,
        name: format!("Player {}", args.player_id),
        hashtag: None,
    };

    println!("--- 4. At-bats ---");
    for game in games.iter().filter(|g| g.has_started()) {
        let start = Instant::now();
        let feed = api::fetch_live_feed(&client, game.game_pk).await?;
        let latency = start.elapsed();
        let events = extract_at_bats(&feed, args.player_id);
        println!(
            "gamePk={} plays={} player at-bats={} (latency: {:?})",
            game.game_pk,
            feed.live_data.plays.all_plays.len(),
            events.len(),
            latency
        );
        for event in &events {
            println!();
            println!(
                "[{}] inning {} {:?} metrics={:?}",
                event.event_id,
                event.inning,
                event.outcome.kind(),
                event.metrics()
            );
            println!("{}", format_tweet(event, Some(&season), &player, TweetStyle::Enhanced));
        }
        println!();
    }

    Ok(())
}
