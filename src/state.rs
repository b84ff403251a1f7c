use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::tracker::SeenSet;
use crate::types::{AtBatEvent, RunSummary, SeasonStats};

/// Everything the poll loop carries between cycles.
pub struct TrackerState {
    pub player_id: u32,
    /// Event ids already announced.
    pub seen: SeenSet,
    pub season_stats: SeasonStatsCache,
    pub started_at: DateTime<Utc>,
    pub last_check_time: Option<DateTime<Utc>>,
    pub last_check_status: String,
    pub total_polls: u64,
    pub total_poll_errors: u64,
    pub total_announced: u64,
    pub total_skipped: u64,
    pub total_invalid: u64,
    pub total_failed_posts: u64,
}

impl TrackerState {
    pub fn new(player_id: u32, season_stats_ttl: Duration) -> Self {
        Self {
            player_id,
            seen: SeenSet::new(),
            season_stats: SeasonStatsCache::new(season_stats_ttl),
            started_at: Utc::now(),
            last_check_time: None,
            last_check_status: "Initializing...".to_string(),
            total_polls: 0,
            total_poll_errors: 0,
            total_announced: 0,
            total_skipped: 0,
            total_invalid: 0,
            total_failed_posts: 0,
        }
    }

    /// Record the end of a poll attempt.
    pub fn record_check(&mut self, status: impl Into<String>) {
        self.last_check_time = Some(Utc::now());
        self.last_check_status = status.into();
    }

    /// Human-readable one-liner, e.g. for a status endpoint or log line.
    pub fn status_line(&self) -> String {
        match self.last_check_time {
            None => "Initializing...".to_string(),
            Some(t) => format!(
                "Last check: {} - {}",
                t.format("%Y-%m-%d %H:%M:%S"),
                self.last_check_status
            ),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            player_id: self.player_id,
            started_at: self.started_at.to_rfc3339(),
            last_check_time: self.last_check_time.map(|t| t.to_rfc3339()),
            last_check_status: self.last_check_status.clone(),
            total_polls: self.total_polls,
            total_poll_errors: self.total_poll_errors,
            total_announced: self.total_announced,
            total_skipped: self.total_skipped,
            total_invalid: self.total_invalid,
            total_failed_posts: self.total_failed_posts,
            seen_event_ids: self.seen.len(),
        }
    }
}

/// Season stats with a freshness window, so each announcement does not
/// refetch them.
pub struct SeasonStatsCache {
    ttl: Duration,
    value: Option<SeasonStats>,
    fetched_at: Option<Instant>,
}

impl SeasonStatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            value: None,
            fetched_at: None,
        }
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => self.value.is_some() && now.duration_since(at) < self.ttl,
            None => false,
        }
    }

    /// Cached value regardless of age.
    pub fn get(&self) -> Option<&SeasonStats> {
        self.value.as_ref()
    }

    pub fn store(&mut self, stats: SeasonStats, now: Instant) {
        self.value = Some(stats);
        self.fetched_at = Some(now);
    }

    /// Count an announced at-bat into the cached line, so the next tweet
    /// before a refetch does not repeat the same totals.
    pub fn record_at_bat(&mut self, event: &AtBatEvent) {
        if let Some(stats) = self.value.as_mut() {
            stats.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BattedBall, Outcome};

    #[test]
    fn new_state_is_empty() {
        let state = TrackerState::new(596019, Duration::from_secs(600));
        assert!(state.seen.is_empty());
        assert_eq!(state.status_line(), "Initializing...");
        let summary = state.summary();
        assert_eq!(summary.player_id, 596019);
        assert_eq!(summary.total_polls, 0);
        assert!(summary.last_check_time.is_none());
    }

    #[test]
    fn record_check_updates_status() {
        let mut state = TrackerState::new(1, Duration::from_secs(600));
        state.record_check("No new at-bats");
        assert!(state.status_line().starts_with("Last check: "));
        assert!(state.status_line().ends_with(" - No new at-bats"));
        assert!(state.summary().last_check_time.is_some());
    }

    #[test]
    fn cache_freshness_window() {
        let mut cache = SeasonStatsCache::new(Duration::from_secs(600));
        let t0 = Instant::now();
        assert!(!cache.is_fresh(t0));
        assert!(cache.get().is_none());

        cache.store(SeasonStats::default(), t0);
        assert!(cache.is_fresh(t0 + Duration::from_secs(599)));
        assert!(!cache.is_fresh(t0 + Duration::from_secs(600)));
        // Stale values stay readable.
        assert!(cache.get().is_some());
    }

    #[test]
    fn recorded_at_bats_advance_cached_totals() {
        let mut cache = SeasonStatsCache::new(Duration::from_secs(600));
        let event = AtBatEvent {
            event_id: "745001-4".into(),
            sequence_number: 4,
            game_pk: 745001,
            inning: 3,
            description: String::new(),
            rbi: 1,
            outcome: Outcome::HomeRun(BattedBall::default()),
        };
        // Nothing cached yet: nothing to advance.
        cache.record_at_bat(&event);
        assert!(cache.get().is_none());

        let t0 = Instant::now();
        cache.store(
            SeasonStats {
                home_runs: 26,
                ..Default::default()
            },
            t0,
        );
        cache.record_at_bat(&event);
        let stats = cache.get().unwrap();
        assert_eq!(stats.home_runs, 27);
        assert_eq!(stats.rbi, 1);
        // Counting does not extend the freshness window.
        assert!(!cache.is_fresh(t0 + Duration::from_secs(600)));
    }

    #[test]
    fn zero_ttl_is_never_fresh() {
        let mut cache = SeasonStatsCache::new(Duration::ZERO);
        let t0 = Instant::now();
        cache.store(SeasonStats::default(), t0);
        assert!(!cache.is_fresh(t0));
    }
}
