use chrono::{DateTime, Utc};

use crate::config::{PlayerConfig, TweetStyle};
use crate::types::{AtBatEvent, BattedBall, HitKind, Outcome, SeasonStats, StrikeoutDetail};

/// Render an at-bat as tweet text.
///
/// Season counting stats are taken as of before this at-bat, so totals the
/// at-bat adds to (HR, hits, BB, K) are shown incremented by one.
///
/// Every tweet ends with the inning and play number, so two at-bats never
/// render the same text.
pub fn format_tweet(
    event: &AtBatEvent,
    season: Option<&SeasonStats>,
    player: &PlayerConfig,
    style: TweetStyle,
) -> String {
    let mut out = match style {
        TweetStyle::Enhanced => format_enhanced(event, season, &player.name),
        TweetStyle::Compact => format_compact(event, season, &player.name),
    };
    push_hashtag(&mut out, player);
    out
}

/// One-off message posted on startup to confirm credentials work.
pub fn format_startup_message(player: &PlayerConfig, now: DateTime<Utc>) -> String {
    let name = &player.name;
    let mut out = String::new();
    out.push_str(&format!("🚀 {name} Bot - Deployment Test\n\n"));
    out.push_str("✅ Bot successfully deployed and running!\n");
    out.push_str(&format!("📅 Deployed: {} UTC\n", now.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("⚾ Ready to track {name}'s at-bats!\n\n"));
    out.push_str("🤖 This is an automated deployment test");
    push_hashtag(&mut out, player);
    out
}

/// Short human label for the result ("Home Run", "Double", "Lineout").
pub fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::HomeRun(_) => "Home Run".to_string(),
        Outcome::Hit { kind, .. } => match kind {
            HitKind::Single => "Single".to_string(),
            HitKind::Double => "Double".to_string(),
            HitKind::Triple => "Triple".to_string(),
        },
        Outcome::Walk => "Walk".to_string(),
        Outcome::Strikeout(_) => "Strikeout".to_string(),
        Outcome::Other { event, .. } => event.clone(),
    }
}

fn push_hashtag(out: &mut String, player: &PlayerConfig) {
    if let Some(tag) = player.hashtag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        out.push_str(&format!("\n\n#{}", tag.trim_start_matches('#')));
    }
}

/// "1st", "2nd", "3rd", "11th", "22nd".
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Where the at-bat happened in the game.
fn play_context(event: &AtBatEvent) -> String {
    let play = event.sequence_number + 1;
    if event.inning == 0 {
        format!("play #{play}")
    } else {
        format!("{} inning, play #{play}", ordinal(event.inning))
    }
}

fn rate(count: u32, plate_appearances: u32) -> f64 {
    let pa = plate_appearances.max(1) as f64;
    (count as f64 / pa * 1000.0).round() / 10.0
}

fn slash_line(s: &SeasonStats) -> String {
    format!(
        "{}/{}/{}",
        s.avg.as_deref().unwrap_or(".000"),
        s.obp.as_deref().unwrap_or(".000"),
        s.slg.as_deref().unwrap_or(".000"),
    )
}

fn push_value_line(out: &mut String, s: &SeasonStats) {
    let mut parts = Vec::new();
    if let Some(war) = s.war {
        parts.push(format!("WAR: {war:.1}"));
    }
    if let Some(wrc) = s.wrc_plus {
        parts.push(format!("wRC+: {wrc:.0}"));
    }
    if !parts.is_empty() {
        out.push_str(&format!("📈 {}\n", parts.join(" · ")));
    }
}

fn push_ball_lines(out: &mut String, ball: &BattedBall, with_distance: bool) {
    if let Some(ev) = ball.exit_velocity {
        out.push_str(&format!("💥 Exit Velocity: {ev:.1} mph\n"));
    }
    if with_distance {
        if let Some(d) = ball.distance {
            out.push_str(&format!("📏 Distance: {d:.0} ft\n"));
        }
    }
    if let Some(la) = ball.launch_angle {
        out.push_str(&format!("📐 Launch Angle: {la:.0}°\n"));
    }
}

// ── Enhanced ───────────────────────────────────────────────────────

fn format_enhanced(event: &AtBatEvent, season: Option<&SeasonStats>, name: &str) -> String {
    let mut out = String::new();
    match &event.outcome {
        Outcome::HomeRun(ball) => {
            out.push_str(&format!("🚨 {name} GOES YARD! 🚨\n\n"));
            push_ball_lines(&mut out, ball, true);
            if let Some(label) = ball.contact_label() {
                out.push_str(&format!("🎯 {label}\n"));
            }
            if let Some(s) = season {
                out.push_str(&format!("\n🏆 Season HR #{}\n", s.home_runs + 1));
                out.push_str(&format!("📊 Season Stats: {}\n", slash_line(s)));
                if let Some(ops) = &s.ops {
                    out.push_str(&format!("💪 OPS: {ops}\n"));
                }
                out.push_str(&format!("🏃 RBI: {}\n", s.rbi + event.rbi));
                push_value_line(&mut out, s);
            }
        }
        Outcome::Hit { kind, ball } => {
            let emoji = match kind {
                HitKind::Single => "💫",
                HitKind::Double => "⚡",
                HitKind::Triple => "🔥",
            };
            out.push_str(&format!("{emoji} {name} with a {}!\n\n", kind.label()));
            push_ball_lines(&mut out, ball, true);
            if let Some(label) = ball.contact_label() {
                out.push_str(&format!("🎯 {label}\n"));
            }
            if let Some(s) = season {
                out.push_str(&format!(
                    "\n📊 Season: {} AVG, {} OPS\n",
                    s.avg.as_deref().unwrap_or(".000"),
                    s.ops.as_deref().unwrap_or(".000"),
                ));
                out.push_str(&format!("🏃 {} hits, {} RBI\n", s.hits + 1, s.rbi + event.rbi));
                push_value_line(&mut out, s);
            }
        }
        Outcome::Walk => {
            out.push_str(&format!("👁️ {name} draws a WALK!\n\n"));
            if let Some(s) = season {
                let walks = s.walks + 1;
                let bb_rate = rate(walks, s.plate_appearances + 1);
                out.push_str(&format!("🎯 Plate Discipline: {bb_rate:.1}% BB rate\n"));
                out.push_str(&format!("📊 Season: {walks} BB, {} K\n", s.strikeouts));
                if let Some(obp) = &s.obp {
                    out.push_str(&format!("👀 OBP: {obp}\n"));
                }
            }
        }
        Outcome::Strikeout(detail) => {
            push_strikeout(&mut out, name, detail);
            if let Some(s) = season {
                let strikeouts = s.strikeouts + 1;
                let k_rate = rate(strikeouts, s.plate_appearances + 1);
                out.push_str(&format!("\n📊 Season K Rate: {k_rate:.1}%\n"));
                out.push_str(&format!("⚾ {strikeouts} K, {} BB\n", s.walks));
            }
        }
        Outcome::Other { event: result, ball } => {
            out.push_str(&format!("⚾ {name}: {result}\n\n"));
            push_ball_lines(&mut out, ball, false);
            if let Some(s) = season {
                out.push_str(&format!("\n📊 Season: {}\n", slash_line(s)));
            }
        }
    }
    format!("{}\n\n📍 {}", out.trim_end(), play_context(event))
}

fn push_strikeout(out: &mut String, name: &str, detail: &StrikeoutDetail) {
    out.push_str(&format!("❌ {name} strikes out {}\n\n", detail.kind.label()));
    if let Some(pitch) = &detail.pitch_type {
        out.push_str(&format!("🎯 Final Pitch: {pitch}\n"));
    }
    if let Some(speed) = detail.pitch_speed {
        out.push_str(&format!("⚡ Speed: {speed:.1} mph\n"));
    }
    if let Some(zone) = detail.zone {
        out.push_str(&format!("📍 Location: Zone {zone}\n"));
    }
}

// ── Compact ────────────────────────────────────────────────────────

fn format_compact(event: &AtBatEvent, season: Option<&SeasonStats>, name: &str) -> String {
    let mut out = String::new();
    match &event.outcome {
        Outcome::HomeRun(ball) => {
            out.push_str(&format!("🚨 {} HOME RUN! 🚨\n\n", name.to_uppercase()));
            if let Some(ev) = ball.exit_velocity {
                out.push_str(&format!("Exit Velocity: {ev:.1} mph\n"));
            }
            if let Some(d) = ball.distance {
                out.push_str(&format!("Distance: {d:.0} ft\n"));
            }
            if let Some(la) = ball.launch_angle {
                out.push_str(&format!("Launch Angle: {la:.0}°\n"));
            }
            if let Some(s) = season {
                out.push_str(&format!("Season HR #{}\n", s.home_runs + 1));
            }
        }
        other => {
            out.push_str(&format!("{name}'s at-bat result:\n"));
            let description = event.description.trim();
            if description.is_empty() {
                out.push_str(&format!("Result: {}\n", outcome_label(other)));
            } else {
                out.push_str(&format!("Result: {description}\n"));
            }
            if let Some(ball) = other.batted_ball() {
                if let Some(ev) = ball.exit_velocity {
                    out.push_str(&format!("Exit Velocity: {ev:.1} mph\n"));
                }
                if let Some(la) = ball.launch_angle {
                    out.push_str(&format!("Launch Angle: {la:.0}°\n"));
                }
            }
        }
    }
    format!("{}\n{}", out.trim_end(), play_context(event))
}
