use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::{PlayerConfig, TweetStyle};
use crate::feed::AtBatFeed;
use crate::formatter::{format_tweet, outcome_label};
use crate::notifier::Notifier;
use crate::reporter;
use crate::state::TrackerState;
use crate::tracker::{self, Decision};
use crate::types::{AnnouncementEvent, AtBatEvent};

/// Per-cycle knobs taken from config.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub player: PlayerConfig,
    pub style: TweetStyle,
    /// Pause between consecutive posts within one cycle.
    pub inter_post_delay: Duration,
}

/// What one poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub announced: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub failed_posts: usize,
}

/// One poll: fetch at-bats, pass them through the dedup gate, announce the new ones.
///
/// An event is only left in the seen set once its post succeeds; a failed post
/// releases it so the next cycle offers it again.
pub async fn poll_cycle<F, N>(
    feed: &F,
    notifier: &N,
    settings: &CycleSettings,
    state: &mut TrackerState,
) -> Result<CycleReport>
where
    F: AtBatFeed + ?Sized,
    N: Notifier + ?Sized,
{
    state.total_polls += 1;
    info!("Checking for at-bats... (seen: {} at-bats)", state.seen.len());

    let events = match feed.fetch_at_bats(settings.player.id).await {
        Ok(events) => events,
        Err(e) => {
            state.total_poll_errors += 1;
            state.record_check(format!("Error occurred: {e}"));
            return Err(e);
        }
    };

    let mut report = CycleReport {
        fetched: events.len(),
        ..Default::default()
    };

    let mut pending: Vec<&AtBatEvent> = Vec::new();
    for event in &events {
        match tracker::evaluate(&mut state.seen, event) {
            Ok(Decision::Announce) => pending.push(event),
            Ok(Decision::Skip) => {
                debug!("At-bat {} already announced, skipping", event.event_id);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("Discarding at-bat: {e}");
                report.invalid += 1;
            }
        }
    }

    if !pending.is_empty() {
        info!("Found {} new at-bat(s)", pending.len());
        refresh_season_stats(feed, settings.player.id, state).await;
    }

    let mut last_label = None;
    for (idx, event) in pending.iter().enumerate() {
        if idx > 0 && !settings.inter_post_delay.is_zero() {
            tokio::time::sleep(settings.inter_post_delay).await;
        }

        let text = format_tweet(
            event,
            state.season_stats.get(),
            &settings.player,
            settings.style,
        );

        let (posted, post_id, error_msg) = match notifier.post(&text).await {
            Ok(receipt) => {
                info!("Announced at-bat {} ({})", event.event_id, event.outcome.kind().label());
                report.announced += 1;
                state.season_stats.record_at_bat(event);
                last_label = Some(outcome_label(&event.outcome));
                (true, receipt.id, None)
            }
            Err(e) => {
                warn!("Post failed for at-bat {}: {e:#}", event.event_id);
                state.seen.release(event.event_id.trim());
                report.failed_posts += 1;
                (false, None, Some(format!("{e:#}")))
            }
        };

        reporter::report_announcement(&AnnouncementEvent {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_id: event.event_id.clone(),
            outcome: event.outcome.kind(),
            metrics: event.metrics(),
            text,
            posted,
            post_id,
            error_msg,
        });
    }

    state.total_announced += report.announced as u64;
    state.total_skipped += report.skipped as u64;
    state.total_invalid += report.invalid as u64;
    state.total_failed_posts += report.failed_posts as u64;

    let status = match last_label {
        Some(label) => format!("Found at-bat: {label}"),
        None if report.failed_posts > 0 => {
            format!("{} post(s) failed, will retry", report.failed_posts)
        }
        None if report.skipped > 0 => "Duplicate at-bat(s) skipped".to_string(),
        None => "No new at-bats found".to_string(),
    };
    info!("Check completed. Status: {status}");
    state.record_check(status);

    Ok(report)
}

/// Refetch season stats if stale; keep the old value when the fetch fails.
async fn refresh_season_stats<F>(feed: &F, player_id: u32, state: &mut TrackerState)
where
    F: AtBatFeed + ?Sized,
{
    if state.season_stats.is_fresh(Instant::now()) {
        return;
    }
    match feed.fetch_season_stats(player_id).await {
        Ok(Some(stats)) => state.season_stats.store(stats, Instant::now()),
        Ok(None) => {}
        Err(e) => warn!("Error fetching season stats, using cached values: {e:#}"),
    }
}
