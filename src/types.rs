use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome classification of a plate appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    HomeRun,
    Hit,
    Walk,
    Strikeout,
    Other,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::HomeRun => "home_run",
            OutcomeKind::Hit => "hit",
            OutcomeKind::Walk => "walk",
            OutcomeKind::Strikeout => "strikeout",
            OutcomeKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    Single,
    Double,
    Triple,
}

impl HitKind {
    pub fn label(&self) -> &'static str {
        match self {
            HitKind::Single => "SINGLE",
            HitKind::Double => "DOUBLE",
            HitKind::Triple => "TRIPLE",
        }
    }
}

/// Statcast data for a ball put in play. Any field may be missing from the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattedBall {
    /// mph
    pub exit_velocity: Option<f64>,
    /// degrees
    pub launch_angle: Option<f64>,
    /// feet
    pub distance: Option<f64>,
    pub is_barrel: bool,
}

impl BattedBall {
    /// Contact quality tag: barrels first, then anything 95+ mph.
    pub fn contact_label(&self) -> Option<&'static str> {
        if self.is_barrel {
            Some("Barrel")
        } else if self.exit_velocity.is_some_and(|ev| ev >= 95.0) {
            Some("Hard Hit")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeoutKind {
    Looking,
    Swinging,
}

impl StrikeoutKind {
    pub fn label(&self) -> &'static str {
        match self {
            StrikeoutKind::Looking => "looking",
            StrikeoutKind::Swinging => "swinging",
        }
    }
}

/// Final pitch of a strikeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeoutDetail {
    pub kind: StrikeoutKind,
    pub pitch_type: Option<String>,
    /// mph
    pub pitch_speed: Option<f64>,
    pub zone: Option<u32>,
}

/// Result of a plate appearance with the metrics that apply to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    HomeRun(BattedBall),
    Hit { kind: HitKind, ball: BattedBall },
    Walk,
    Strikeout(StrikeoutDetail),
    Other { event: String, ball: BattedBall },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::HomeRun(_) => OutcomeKind::HomeRun,
            Outcome::Hit { .. } => OutcomeKind::Hit,
            Outcome::Walk => OutcomeKind::Walk,
            Outcome::Strikeout(_) => OutcomeKind::Strikeout,
            Outcome::Other { .. } => OutcomeKind::Other,
        }
    }

    pub fn batted_ball(&self) -> Option<&BattedBall> {
        match self {
            Outcome::HomeRun(ball) | Outcome::Hit { ball, .. } | Outcome::Other { ball, .. } => {
                Some(ball)
            }
            Outcome::Walk | Outcome::Strikeout(_) => None,
        }
    }
}

/// One completed plate appearance by the tracked player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtBatEvent {
    /// Unique within a game; used for deduplication.
    pub event_id: String,
    /// Order within the game (feed `atBatIndex`).
    pub sequence_number: u32,
    pub game_pk: u64,
    pub inning: u32,
    /// Play-by-play text from the feed.
    pub description: String,
    pub rbi: u32,
    pub outcome: Outcome,
}

impl AtBatEvent {
    /// Present metrics keyed by name.
    pub fn metrics(&self) -> BTreeMap<&'static str, f64> {
        let mut out = BTreeMap::new();
        if let Some(ball) = self.outcome.batted_ball() {
            if let Some(v) = ball.exit_velocity {
                out.insert("exit_velocity", v);
            }
            if let Some(v) = ball.launch_angle {
                out.insert("launch_angle", v);
            }
            if let Some(v) = ball.distance {
                out.insert("distance", v);
            }
        }
        if let Outcome::Strikeout(detail) = &self.outcome {
            if let Some(v) = detail.pitch_speed {
                out.insert("pitch_speed", v);
            }
        }
        out
    }
}

/// Season batting line. Rate stats stay as the feed's strings (".285").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub avg: Option<String>,
    pub obp: Option<String>,
    pub slg: Option<String>,
    pub ops: Option<String>,
    pub home_runs: u32,
    pub rbi: u32,
    pub hits: u32,
    pub walks: u32,
    pub strikeouts: u32,
    pub plate_appearances: u32,
    pub war: Option<f64>,
    pub wrc_plus: Option<f64>,
}

impl SeasonStats {
    /// Fold an announced at-bat into the counting stats.
    ///
    /// Rate stats are left alone until the next fetch replaces them.
    pub fn record(&mut self, event: &AtBatEvent) {
        self.plate_appearances += 1;
        self.rbi += event.rbi;
        match event.outcome {
            Outcome::HomeRun(_) => {
                self.home_runs += 1;
                self.hits += 1;
            }
            Outcome::Hit { .. } => self.hits += 1,
            Outcome::Walk => self.walks += 1,
            Outcome::Strikeout(_) => self.strikeouts += 1,
            Outcome::Other { .. } => {}
        }
    }
}

/// Emitted to stdout for every at-bat the bot tried to announce.
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementEvent {
    pub timestamp: String,
    pub event_id: String,
    pub outcome: OutcomeKind,
    pub metrics: BTreeMap<&'static str, f64>,
    pub text: String,
    pub posted: bool,
    pub post_id: Option<String>,
    pub error_msg: Option<String>,
}

/// Printed once on shutdown.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub player_id: u32,
    pub started_at: String,
    pub last_check_time: Option<String>,
    pub last_check_status: String,
    pub total_polls: u64,
    pub total_poll_errors: u64,
    pub total_announced: u64,
    pub total_skipped: u64,
    pub total_invalid: u64,
    pub total_failed_posts: u64,
    pub seen_event_ids: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(ev: Option<f64>, la: Option<f64>, dist: Option<f64>) -> BattedBall {
        BattedBall {
            exit_velocity: ev,
            launch_angle: la,
            distance: dist,
            is_barrel: false,
        }
    }

    fn event(outcome: Outcome) -> AtBatEvent {
        AtBatEvent {
            event_id: "1-1".into(),
            sequence_number: 1,
            game_pk: 1,
            inning: 1,
            description: String::new(),
            rbi: 0,
            outcome,
        }
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Outcome::Walk.kind(), OutcomeKind::Walk);
        assert_eq!(Outcome::HomeRun(BattedBall::default()).kind(), OutcomeKind::HomeRun);
        let hit = Outcome::Hit {
            kind: HitKind::Double,
            ball: BattedBall::default(),
        };
        assert_eq!(hit.kind(), OutcomeKind::Hit);
    }

    #[test]
    fn metrics_only_present_values() {
        let e = event(Outcome::HomeRun(ball(Some(108.2), None, Some(421.0))));
        let m = e.metrics();
        assert_eq!(m.len(), 2);
        assert_eq!(m["exit_velocity"], 108.2);
        assert_eq!(m["distance"], 421.0);
        assert!(!m.contains_key("launch_angle"));
    }

    #[test]
    fn walk_has_no_metrics() {
        assert!(event(Outcome::Walk).metrics().is_empty());
    }

    #[test]
    fn strikeout_reports_pitch_speed() {
        let e = event(Outcome::Strikeout(StrikeoutDetail {
            kind: StrikeoutKind::Swinging,
            pitch_type: Some("Slider".into()),
            pitch_speed: Some(88.4),
            zone: Some(14),
        }));
        assert_eq!(e.metrics()["pitch_speed"], 88.4);
    }

    #[test]
    fn record_counts_home_run_as_hit() {
        let mut stats = SeasonStats {
            home_runs: 26,
            hits: 149,
            rbi: 78,
            plate_appearances: 599,
            ..Default::default()
        };
        let mut e = event(Outcome::HomeRun(BattedBall::default()));
        e.rbi = 2;
        stats.record(&e);
        assert_eq!(stats.home_runs, 27);
        assert_eq!(stats.hits, 150);
        assert_eq!(stats.rbi, 80);
        assert_eq!(stats.plate_appearances, 600);

        stats.record(&event(Outcome::Walk));
        assert_eq!(stats.walks, 1);
        assert_eq!(stats.home_runs, 27);
        assert_eq!(stats.plate_appearances, 601);
    }

    #[test]
    fn contact_label_tiers() {
        let mut b = ball(Some(101.0), None, None);
        assert_eq!(b.contact_label(), Some("Hard Hit"));
        b.is_barrel = true;
        assert_eq!(b.contact_label(), Some("Barrel"));
        assert_eq!(ball(Some(80.0), None, None).contact_label(), None);
        assert_eq!(ball(None, None, None).contact_label(), None);
    }
}
