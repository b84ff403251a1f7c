use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::America::New_York;
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api::{self, LiveFeed, Play};
use crate::types::{
    AtBatEvent, BattedBall, HitKind, Outcome, SeasonStats, StrikeoutDetail, StrikeoutKind,
};

/// Source of the tracked player's completed at-bats.
#[async_trait]
pub trait AtBatFeed: Send + Sync {
    /// All completed at-bats for the player's game(s) today, in feed order.
    async fn fetch_at_bats(&self, player_id: u32) -> Result<Vec<AtBatEvent>>;

    /// Season hitting line, if this source has one.
    async fn fetch_season_stats(&self, _player_id: u32) -> Result<Option<SeasonStats>> {
        Ok(None)
    }
}

/// Before this hour (US/Eastern) the previous day's games may still be live.
const LATE_GAME_CUTOFF_HOUR: u32 = 4;

/// The MLB schedule date at `now`. The schedule is keyed by US/Eastern days.
pub fn game_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&New_York).date_naive()
}

/// Schedule dates to query at `now`, oldest first.
///
/// In the small hours the previous date is included so extra-inning and
/// west-coast games that started yesterday keep reporting.
pub fn schedule_dates(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let eastern = now.with_timezone(&New_York);
    let today = eastern.date_naive();
    match today.pred_opt() {
        Some(previous) if eastern.hour() < LATE_GAME_CUTOFF_HOUR => vec![previous, today],
        _ => vec![today],
    }
}

/// Reads the tracked player's games from the public MLB Stats API.
pub struct MlbFeed {
    client: Client,
}

impl MlbFeed {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// At-bats for the player in the games relevant at `now`.
    ///
    /// Games from the previous date count only while still live; finished
    /// ones were reported when they ended.
    pub async fn fetch_at_bats_at(&self, player_id: u32, now: DateTime<Utc>) -> Result<Vec<AtBatEvent>> {
        let Some(team_id) = api::fetch_current_team(&self.client, player_id).await? else {
            warn!("Player {player_id} has no current team");
            return Ok(Vec::new());
        };

        let today = game_date(now);
        let mut events = Vec::new();
        for date in schedule_dates(now) {
            let games = api::fetch_games_on(&self.client, team_id, date).await?;
            let wanted = games
                .iter()
                .filter(|g| if date == today { g.has_started() } else { g.is_live() });
            for game in wanted {
                let feed = api::fetch_live_feed(&self.client, game.game_pk).await?;
                events.extend(extract_at_bats(&feed, player_id));
            }
        }
        debug!("Extracted {} at-bat(s) for player {player_id}", events.len());
        Ok(events)
    }
}

#[async_trait]
impl AtBatFeed for MlbFeed {
    async fn fetch_at_bats(&self, player_id: u32) -> Result<Vec<AtBatEvent>> {
        self.fetch_at_bats_at(player_id, Utc::now()).await
    }

    async fn fetch_season_stats(&self, player_id: u32) -> Result<Option<SeasonStats>> {
        let season = game_date(Utc::now()).year();
        api::fetch_season_stats(&self.client, player_id, season)
            .await
            .map(Some)
    }
}

/// Completed plate appearances by `player_id` in a live feed.
pub fn extract_at_bats(feed: &LiveFeed, player_id: u32) -> Vec<AtBatEvent> {
    feed.live_data
        .plays
        .all_plays
        .iter()
        .filter(|p| p.about.is_complete && p.matchup.batter.id == player_id)
        .map(|p| to_event(feed.game_pk, p))
        .collect()
}

fn to_event(game_pk: u64, play: &Play) -> AtBatEvent {
    let description = play.result.description.clone().unwrap_or_default();
    AtBatEvent {
        event_id: format!("{game_pk}-{}", play.about.at_bat_index),
        sequence_number: play.about.at_bat_index,
        game_pk,
        inning: play.about.inning,
        description,
        rbi: play.result.rbi,
        outcome: classify(play),
    }
}

/// Batted-ball data from the last event that carries `hitData`.
fn batted_ball(play: &Play) -> BattedBall {
    play.play_events
        .iter()
        .rev()
        .find_map(|e| e.hit_data.as_ref())
        .map(|h| BattedBall {
            exit_velocity: h.launch_speed,
            launch_angle: h.launch_angle,
            distance: h.total_distance,
            is_barrel: h.is_barrel.unwrap_or(false),
        })
        .unwrap_or_default()
}

fn strikeout_detail(play: &Play) -> StrikeoutDetail {
    let called = play
        .result
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains("called"));
    let last_pitch = play.play_events.iter().rev().find(|e| e.is_pitch);
    StrikeoutDetail {
        kind: if called {
            StrikeoutKind::Looking
        } else {
            StrikeoutKind::Swinging
        },
        pitch_type: last_pitch
            .and_then(|e| e.details.pitch_type.as_ref())
            .and_then(|t| t.description.clone()),
        pitch_speed: last_pitch
            .and_then(|e| e.pitch_data.as_ref())
            .and_then(|p| p.start_speed),
        zone: last_pitch
            .and_then(|e| e.pitch_data.as_ref())
            .and_then(|p| p.zone),
    }
}

/// Map the feed's `eventType` onto an outcome.
fn classify(play: &Play) -> Outcome {
    let event_type = play.result.event_type.as_deref().unwrap_or("");
    match event_type {
        "home_run" => Outcome::HomeRun(batted_ball(play)),
        "single" => Outcome::Hit {
            kind: HitKind::Single,
            ball: batted_ball(play),
        },
        "double" => Outcome::Hit {
            kind: HitKind::Double,
            ball: batted_ball(play),
        },
        "triple" => Outcome::Hit {
            kind: HitKind::Triple,
            ball: batted_ball(play),
        },
        "walk" | "intent_walk" => Outcome::Walk,
        "strikeout" | "strikeout_double_play" => Outcome::Strikeout(strikeout_detail(play)),
        _ => Outcome::Other {
            event: play
                .result
                .event
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            ball: batted_ball(play),
        },
    }
}

/// Random at-bats for dry runs without a live game.
///
/// Every poll yields one at-bat; about a third of polls redeliver the previous
/// one, as a live feed does between plate appearances.
pub struct SimulatedFeed {
    game_pk: u64,
    next_index: Mutex<u32>,
}

const OTHER_EVENTS: &[&str] = &["Groundout", "Flyout", "Lineout", "Pop Out"];
const PITCH_TYPES: &[&str] = &[
    "Four-Seam Fastball",
    "Slider",
    "Curveball",
    "Changeup",
    "Cutter",
    "Sinker",
    "Knuckle Curve",
];

impl SimulatedFeed {
    pub fn new(game_pk: u64) -> Self {
        Self {
            game_pk,
            next_index: Mutex::new(0),
        }
    }

    fn generate(&self, index: u32) -> AtBatEvent {
        let mut rng = rand::thread_rng();
        let roll: f64 = rng.r#gen();
        let ball = |rng: &mut rand::rngs::ThreadRng, ev: (f64, f64), la: (f64, f64), dist: (f64, f64)| {
            BattedBall {
                exit_velocity: Some(round1(rng.gen_range(ev.0..ev.1))),
                launch_angle: Some(round1(rng.gen_range(la.0..la.1))),
                distance: Some(rng.gen_range(dist.0..dist.1).round()),
                is_barrel: false,
            }
        };

        let (outcome, description) = if roll < 0.25 {
            let mut b = ball(&mut rng, (100.0, 118.0), (22.0, 35.0), (380.0, 470.0));
            b.is_barrel = rng.gen_bool(0.6);
            (Outcome::HomeRun(b), "homers to deep left field.")
        } else if roll < 0.50 {
            let kind = *[HitKind::Single, HitKind::Double, HitKind::Triple]
                .choose(&mut rng)
                .unwrap_or(&HitKind::Single);
            let b = ball(&mut rng, (65.0, 112.0), (-5.0, 30.0), (200.0, 350.0));
            (Outcome::Hit { kind, ball: b }, "lines a hit to center field.")
        } else if roll < 0.65 {
            (Outcome::Walk, "walks.")
        } else if roll < 0.85 {
            let kind = if rng.gen_bool(0.5) {
                StrikeoutKind::Looking
            } else {
                StrikeoutKind::Swinging
            };
            let detail = StrikeoutDetail {
                kind,
                pitch_type: PITCH_TYPES.choose(&mut rng).map(|s| s.to_string()),
                pitch_speed: Some(round1(rng.gen_range(82.0..101.0))),
                zone: Some(rng.gen_range(1..=14)),
            };
            (Outcome::Strikeout(detail), "strikes out.")
        } else {
            let event = OTHER_EVENTS.choose(&mut rng).copied().unwrap_or("Groundout");
            let b = ball(&mut rng, (60.0, 105.0), (-15.0, 45.0), (20.0, 320.0));
            (
                Outcome::Other {
                    event: event.to_string(),
                    ball: b,
                },
                "puts the ball in play.",
            )
        };

        AtBatEvent {
            event_id: format!("{}-{index}", self.game_pk),
            sequence_number: index,
            game_pk: self.game_pk,
            inning: index / 8 + 1,
            description: description.to_string(),
            rbi: if matches!(outcome, Outcome::HomeRun(_)) {
                rng.gen_range(1..=4)
            } else {
                0
            },
            outcome,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[async_trait]
impl AtBatFeed for SimulatedFeed {
    async fn fetch_at_bats(&self, _player_id: u32) -> Result<Vec<AtBatEvent>> {
        let index = {
            let mut next = self
                .next_index
                .lock()
                .map_err(|_| anyhow::anyhow!("simulated feed lock poisoned"))?;
            // Occasionally redeliver the previous at-bat to exercise dedup.
            if *next > 0 && rand::thread_rng().gen_bool(0.3) {
                *next - 1
            } else {
                *next += 1;
                *next - 1
            }
        };
        let event = self.generate(index);
        info!("Simulated at-bat {} ({})", event.event_id, event.outcome.kind().label());
        Ok(vec![event])
    }
}
