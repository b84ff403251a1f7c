use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::MLB_API_BASE;
use crate::types::SeasonStats;

// ── Response shapes (only the fields we read) ──────────────────────

#[derive(Debug, Deserialize)]
struct PeopleResponse {
    #[serde(default)]
    people: Vec<Person>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    current_team: Option<TeamRef>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    #[serde(default)]
    games: Vec<ScheduledGame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGame {
    pub game_pk: u64,
    #[serde(default)]
    pub status: GameStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    /// "Preview", "Live" or "Final".
    #[serde(default)]
    pub abstract_game_state: String,
}

impl ScheduledGame {
    /// A game that has started; finished games still carry today's at-bats.
    pub fn has_started(&self) -> bool {
        matches!(self.status.abstract_game_state.as_str(), "Live" | "Final")
    }

    pub fn is_live(&self) -> bool {
        self.status.abstract_game_state == "Live"
    }
}

/// `GET /api/v1.1/game/{gamePk}/feed/live`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeed {
    pub game_pk: u64,
    #[serde(default)]
    pub live_data: LiveData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveData {
    #[serde(default)]
    pub plays: Plays,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plays {
    #[serde(default)]
    pub all_plays: Vec<Play>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    #[serde(default)]
    pub result: PlayResult,
    pub about: PlayAbout,
    pub matchup: Matchup,
    #[serde(default)]
    pub play_events: Vec<PlayEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResult {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rbi: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAbout {
    pub at_bat_index: u32,
    #[serde(default)]
    pub inning: u32,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Matchup {
    pub batter: PersonRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonRef {
    pub id: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    #[serde(default)]
    pub is_pitch: bool,
    #[serde(default)]
    pub details: EventDetails,
    #[serde(default)]
    pub pitch_data: Option<PitchData>,
    #[serde(default)]
    pub hit_data: Option<HitData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(default, rename = "type")]
    pub pitch_type: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchData {
    #[serde(default)]
    pub start_speed: Option<f64>,
    #[serde(default)]
    pub zone: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitData {
    #[serde(default)]
    pub launch_speed: Option<f64>,
    #[serde(default)]
    pub launch_angle: Option<f64>,
    #[serde(default)]
    pub total_distance: Option<f64>,
    #[serde(default)]
    pub is_barrel: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: Vec<StatGroup>,
}

#[derive(Debug, Deserialize)]
struct StatGroup {
    #[serde(default)]
    splits: Vec<StatSplit>,
}

#[derive(Debug, Deserialize)]
struct StatSplit {
    stat: serde_json::Value,
}

// ── Requests ───────────────────────────────────────────────────────

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    path: &str,
    query: &[(&str, String)],
) -> Result<T> {
    let url = format!("{MLB_API_BASE}{path}");
    let resp = client
        .get(&url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("MLB API request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("MLB API non-2xx: {url}"))?;
    resp.json::<T>()
        .await
        .with_context(|| format!("failed to decode MLB API response: {url}"))
}

/// Look up the team the player currently plays for.
pub async fn fetch_current_team(client: &Client, player_id: u32) -> Result<Option<u32>> {
    let resp: PeopleResponse = get_json(
        client,
        &format!("/api/v1/people/{player_id}"),
        &[("hydrate", "currentTeam".to_string())],
    )
    .await?;
    let team = resp
        .people
        .into_iter()
        .next()
        .and_then(|p| p.current_team)
        .map(|t| t.id);
    debug!("Player {player_id} current team: {team:?}");
    Ok(team)
}

/// Fetch the team's games scheduled on `date` (doubleheaders yield two).
pub async fn fetch_games_on(
    client: &Client,
    team_id: u32,
    date: NaiveDate,
) -> Result<Vec<ScheduledGame>> {
    let resp: ScheduleResponse = get_json(
        client,
        "/api/v1/schedule",
        &[
            ("sportId", "1".to_string()),
            ("teamId", team_id.to_string()),
            ("date", date.format("%Y-%m-%d").to_string()),
        ],
    )
    .await?;
    let games: Vec<ScheduledGame> = resp.dates.into_iter().flat_map(|d| d.games).collect();
    debug!("Fetched {} game(s) for team {team_id} on {date}", games.len());
    Ok(games)
}

/// Fetch the full live feed for a game.
pub async fn fetch_live_feed(client: &Client, game_pk: u64) -> Result<LiveFeed> {
    let feed: LiveFeed =
        get_json(client, &format!("/api/v1.1/game/{game_pk}/feed/live"), &[]).await?;
    debug!(
        "Fetched live feed for game {game_pk} ({} plays)",
        feed.live_data.plays.all_plays.len()
    );
    Ok(feed)
}

/// Fetch the player's hitting line for `season`, merged with the advanced split.
///
/// The advanced request is best-effort: its failure leaves those fields empty.
pub async fn fetch_season_stats(client: &Client, player_id: u32, season: i32) -> Result<SeasonStats> {
    let path = format!("/api/v1/people/{player_id}/stats");
    let base: StatsResponse = get_json(
        client,
        &path,
        &[
            ("stats", "season".to_string()),
            ("season", season.to_string()),
            ("group", "hitting".to_string()),
        ],
    )
    .await?;

    let mut stats = SeasonStats::default();
    if let Some(stat) = first_split(&base) {
        apply_hitting_line(&mut stats, stat);
    }

    let advanced: Result<StatsResponse> = get_json(
        client,
        &path,
        &[
            ("stats", "seasonAdvanced".to_string()),
            ("season", season.to_string()),
            ("group", "hitting".to_string()),
        ],
    )
    .await;
    match advanced {
        Ok(resp) => {
            if let Some(stat) = first_split(&resp) {
                apply_advanced_line(&mut stats, stat);
            }
        }
        Err(e) => warn!("Failed to fetch advanced stats: {e:#}"),
    }

    Ok(stats)
}

fn first_split(resp: &StatsResponse) -> Option<&serde_json::Value> {
    resp.stats.first()?.splits.first().map(|s| &s.stat)
}

fn str_field(v: &serde_json::Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|s| s.to_string())
}

fn u32_field(v: &serde_json::Value, key: &str) -> u32 {
    v.get(key).and_then(|x| x.as_u64()).unwrap_or(0) as u32
}

/// Numbers sometimes arrive as strings ("3.4").
fn f64_field(v: &serde_json::Value, key: &str) -> Option<f64> {
    let x = v.get(key)?;
    x.as_f64().or_else(|| x.as_str()?.parse().ok())
}

fn apply_hitting_line(stats: &mut SeasonStats, stat: &serde_json::Value) {
    stats.avg = str_field(stat, "avg");
    stats.obp = str_field(stat, "obp");
    stats.slg = str_field(stat, "slg");
    stats.ops = str_field(stat, "ops");
    stats.home_runs = u32_field(stat, "homeRuns");
    stats.rbi = u32_field(stat, "rbi");
    stats.hits = u32_field(stat, "hits");
    stats.walks = u32_field(stat, "baseOnBalls");
    stats.strikeouts = u32_field(stat, "strikeOuts");
    stats.plate_appearances = u32_field(stat, "plateAppearances");
}

fn apply_advanced_line(stats: &mut SeasonStats, stat: &serde_json::Value) {
    stats.war = f64_field(stat, "war");
    stats.wrc_plus = f64_field(stat, "wrcPlus");
}

/// Self-ping so the hosting platform does not idle the process. Never fails.
pub async fn keep_alive(client: &Client, url: &str) {
    match client.get(url).send().await {
        Ok(resp) => info!("Keep-alive ping sent ({})", resp.status()),
        Err(e) => warn!("Keep-alive ping failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hitting_line_parses() {
        let resp: StatsResponse = serde_json::from_value(json!({
            "stats": [{
                "splits": [{
                    "stat": {
                        "avg": ".271", "obp": ".344", "slg": ".499", "ops": ".843",
                        "homeRuns": 27, "rbi": 80, "runs": 95, "hits": 150,
                        "doubles": 30, "triples": 2, "baseOnBalls": 60,
                        "strikeOuts": 120, "stolenBases": 25, "atBats": 550,
                        "plateAppearances": 630
                    }
                }]
            }]
        }))
        .unwrap();
        let mut stats = SeasonStats::default();
        apply_hitting_line(&mut stats, first_split(&resp).unwrap());
        assert_eq!(stats.avg.as_deref(), Some(".271"));
        assert_eq!(stats.ops.as_deref(), Some(".843"));
        assert_eq!(stats.home_runs, 27);
        assert_eq!(stats.walks, 60);
        assert_eq!(stats.strikeouts, 120);
        assert_eq!(stats.plate_appearances, 630);
    }

    #[test]
    fn empty_stats_has_no_split() {
        let resp: StatsResponse = serde_json::from_value(json!({ "stats": [] })).unwrap();
        assert!(first_split(&resp).is_none());
        let resp: StatsResponse =
            serde_json::from_value(json!({ "stats": [{ "splits": [] }] })).unwrap();
        assert!(first_split(&resp).is_none());
    }

    #[test]
    fn advanced_line_accepts_string_numbers() {
        let stat = json!({ "babip": ".301", "war": "4.1", "wrcPlus": 131 });
        let mut stats = SeasonStats::default();
        apply_advanced_line(&mut stats, &stat);
        assert_eq!(stats.war, Some(4.1));
        assert_eq!(stats.wrc_plus, Some(131.0));
    }

    #[test]
    fn schedule_flattens_dates() {
        let resp: ScheduleResponse = serde_json::from_value(json!({
            "dates": [{
                "games": [
                    { "gamePk": 1, "status": { "abstractGameState": "Final" } },
                    { "gamePk": 2, "status": { "abstractGameState": "Preview" } },
                    { "gamePk": 3, "status": { "abstractGameState": "Live" } }
                ]
            }]
        }))
        .unwrap();
        let games: Vec<ScheduledGame> = resp.dates.into_iter().flat_map(|d| d.games).collect();
        assert_eq!(games.len(), 3);
        assert!(games[0].has_started());
        assert!(!games[0].is_live());
        assert!(!games[1].has_started());
        assert!(games[2].has_started());
        assert!(games[2].is_live());
    }

    #[test]
    fn person_without_team() {
        let resp: PeopleResponse =
            serde_json::from_value(json!({ "people": [{ "id": 5 }] })).unwrap();
        assert!(resp.people[0].current_team.is_none());
    }
}
