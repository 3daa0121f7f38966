// MLB Stats API client.
//
// Thin JSON-over-HTTP glue: every endpoint is fetched with reqwest and picked
// apart as `serde_json::Value`, since the API reports most rates as strings
// (".812") and omits fields freely. A failed category fetch degrades to an
// absent signal instead of failing the hitter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use matchcast_baseball::lineup::{decode_batting_order, BattingObservation};
use matchcast_baseball::signals::{BatSide, Hand, HeadToHead, OpsSplit};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    DateWindow, HitterProfile, LineupHistory, PitcherProfile, PlayerRef, ProviderError,
    ScheduledGame, StatsProvider, TeamRef,
};
use crate::config::ProviderConfig;

const SPORT_ID: &str = "1";
const SPLIT_CODES: &str = "vl,vr,h,a";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct MlbStatsApi {
    http: reqwest::Client,
    base_url: String,
}

impl MlbStatsApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Decode {
                url,
                message: e.to_string(),
            })
    }

    async fn boxscore(&self, game_pk: u64) -> Result<Value, ProviderError> {
        self.get_json(&format!("game/{game_pk}/boxscore"), &[]).await
    }

    async fn person(&self, id: u32) -> Result<Value, ProviderError> {
        self.get_json(&format!("people/{id}"), &[]).await
    }

    async fn player_stats(&self, id: u32, query: Vec<(&str, String)>) -> Result<Value, ProviderError> {
        self.get_json(&format!("people/{id}/stats"), &query).await
    }
}

/// Log a failed category fetch and carry on without it.
fn degrade(result: Result<Value, ProviderError>, what: &str, player_id: u32) -> Option<Value> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(player_id, "{what} unavailable: {e}");
            None
        }
    }
}

#[async_trait]
impl StatsProvider for MlbStatsApi {
    async fn schedule(&self, date: NaiveDate) -> Result<Vec<ScheduledGame>, ProviderError> {
        let body = self
            .get_json(
                "schedule",
                &[
                    ("sportId", SPORT_ID.to_string()),
                    ("date", date.to_string()),
                    ("hydrate", "probablePitcher".to_string()),
                ],
            )
            .await?;
        Ok(parse_schedule(&body))
    }

    async fn lineup_history(
        &self,
        team_id: u32,
        window: DateWindow,
    ) -> Result<LineupHistory, ProviderError> {
        let body = self
            .get_json(
                "schedule",
                &[
                    ("sportId", SPORT_ID.to_string()),
                    ("teamId", team_id.to_string()),
                    ("startDate", window.start.to_string()),
                    ("endDate", window.end.to_string()),
                ],
            )
            .await?;
        let games = parse_final_games(&body);
        debug!(team_id, games = games.len(), "completed games in lineup window");

        let boxscores = join_all(games.iter().map(|g| self.boxscore(g.game_pk))).await;

        let mut history = LineupHistory::default();
        for (game, boxscore) in games.iter().zip(boxscores) {
            match boxscore {
                Ok(body) => parse_boxscore_side(&body, team_id, game.official_date, &mut history),
                Err(e) => warn!(team_id, game_pk = game.game_pk, "skipping boxscore: {e}"),
            }
        }
        Ok(history)
    }

    async fn pitcher_profile(
        &self,
        pitcher_id: u32,
        season: i32,
        recent: DateWindow,
    ) -> Result<PitcherProfile, ProviderError> {
        let (person, season_stats, splits, recent_stats) = tokio::join!(
            self.person(pitcher_id),
            self.player_stats(
                pitcher_id,
                vec![
                    ("stats", "season".into()),
                    ("group", "pitching".into()),
                    ("season", season.to_string()),
                ],
            ),
            self.player_stats(
                pitcher_id,
                vec![
                    ("stats", "statSplits".into()),
                    ("group", "pitching".into()),
                    ("season", season.to_string()),
                    ("sitCodes", SPLIT_CODES.into()),
                ],
            ),
            self.player_stats(
                pitcher_id,
                vec![
                    ("stats", "byDateRange".into()),
                    ("group", "pitching".into()),
                    ("startDate", recent.start.to_string()),
                    ("endDate", recent.end.to_string()),
                ],
            ),
        );

        let mut profile = PitcherProfile::default();
        if let Some(body) = degrade(person, "pitcher bio", pitcher_id) {
            profile.hand = person_code(&body, "pitchHand").and_then(Hand::from_code);
        }
        if let Some(body) = degrade(season_stats, "pitcher season line", pitcher_id) {
            profile.h9_season = first_split_stat(&body, None).and_then(|s| stat_f64(s, "hitsPer9Inn"));
        }
        if let Some(body) = degrade(splits, "pitcher splits", pitcher_id) {
            let h9 = |code: &str| split_stat(&body, code).and_then(|s| stat_f64(s, "hitsPer9Inn"));
            profile.h9_vs_left = h9("vl");
            profile.h9_vs_right = h9("vr");
            profile.h9_home = h9("h");
            profile.h9_away = h9("a");
        }
        if let Some(body) = degrade(recent_stats, "pitcher recent line", pitcher_id) {
            profile.h9_recent = first_split_stat(&body, None).and_then(|s| stat_f64(s, "hitsPer9Inn"));
        }
        Ok(profile)
    }

    async fn hitter_profile(
        &self,
        batter_id: u32,
        pitcher_id: u32,
        season: i32,
        recent: DateWindow,
    ) -> Result<HitterProfile, ProviderError> {
        let (person, season_stats, vs_pitcher, splits, recent_stats) = tokio::join!(
            self.person(batter_id),
            self.player_stats(
                batter_id,
                vec![
                    ("stats", "season".into()),
                    ("group", "hitting".into()),
                    ("season", season.to_string()),
                ],
            ),
            self.player_stats(
                batter_id,
                vec![
                    ("stats", "vsPlayer".into()),
                    ("group", "hitting".into()),
                    ("opposingPlayerId", pitcher_id.to_string()),
                ],
            ),
            self.player_stats(
                batter_id,
                vec![
                    ("stats", "statSplits".into()),
                    ("group", "hitting".into()),
                    ("season", season.to_string()),
                    ("sitCodes", SPLIT_CODES.into()),
                ],
            ),
            self.player_stats(
                batter_id,
                vec![
                    ("stats", "byDateRange".into()),
                    ("group", "hitting".into()),
                    ("startDate", recent.start.to_string()),
                    ("endDate", recent.end.to_string()),
                ],
            ),
        );

        let mut profile = HitterProfile::default();
        if let Some(body) = degrade(person, "hitter bio", batter_id) {
            profile.bat_side = person_code(&body, "batSide").and_then(BatSide::from_code);
        }
        if let Some(body) = degrade(season_stats, "hitter season line", batter_id) {
            if let Some(stat) = first_split_stat(&body, None) {
                profile.season_hits = stat_u32(stat, "hits");
                profile.season_pa = stat_u32(stat, "plateAppearances");
            }
        }
        if let Some(body) = degrade(vs_pitcher, "head-to-head line", batter_id) {
            let stat = first_split_stat(&body, Some("vsPlayerTotal"))
                .or_else(|| first_split_stat(&body, None));
            if let Some(stat) = stat {
                profile.vs_pitcher = HeadToHead {
                    ab: stat_u32(stat, "atBats"),
                    pa: stat_u32(stat, "plateAppearances"),
                    ops: stat_f64(stat, "ops"),
                };
            }
        }
        if let Some(body) = degrade(splits, "hitter splits", batter_id) {
            let split = |code: &str| split_stat(&body, code).map(ops_split).unwrap_or_default();
            profile.vs_left = split("vl");
            profile.vs_right = split("vr");
            profile.home = split("h");
            profile.away = split("a");
        }
        if let Some(body) = degrade(recent_stats, "hitter recent line", batter_id) {
            profile.recent = first_split_stat(&body, None).map(ops_split).unwrap_or_default();
        }
        Ok(profile)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Numeric stat that may arrive as a number or a string (".812", "-.--").
pub(crate) fn stat_f64(stat: &Value, key: &str) -> Option<f64> {
    let value = match stat.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

pub(crate) fn stat_u32(stat: &Value, key: &str) -> Option<u32> {
    stat_f64(stat, key)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u32)
}

fn ops_split(stat: &Value) -> OpsSplit {
    OpsSplit {
        pa: stat_u32(stat, "plateAppearances"),
        ops: stat_f64(stat, "ops"),
    }
}

fn as_u32(value: Option<&Value>) -> Option<u32> {
    value?.as_u64().and_then(|v| u32::try_from(v).ok())
}

/// `stat` object of the first split, optionally restricted to a stats type.
pub(crate) fn first_split_stat<'a>(body: &'a Value, type_name: Option<&str>) -> Option<&'a Value> {
    body.get("stats")?
        .as_array()?
        .iter()
        .filter(|group| match type_name {
            Some(name) => group.pointer("/type/displayName").and_then(Value::as_str) == Some(name),
            None => true,
        })
        .find_map(|group| group.get("splits")?.as_array()?.first()?.get("stat"))
}

/// `stat` object of the split whose `split.code` matches.
pub(crate) fn split_stat<'a>(body: &'a Value, code: &str) -> Option<&'a Value> {
    body.get("stats")?
        .as_array()?
        .iter()
        .filter_map(|group| group.get("splits")?.as_array())
        .flatten()
        .find(|split| split.pointer("/split/code").and_then(Value::as_str) == Some(code))?
        .get("stat")
}

/// `people[0].<field>.code`, e.g. `batSide` or `pitchHand`.
pub(crate) fn person_code<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.pointer("/people/0")?
        .get(field)?
        .get("code")?
        .as_str()
}

fn team_ref(side: &Value) -> Option<TeamRef> {
    let team = side.get("team")?;
    Some(TeamRef {
        id: as_u32(team.get("id"))?,
        name: team.get("name")?.as_str()?.to_string(),
    })
}

fn probable(side: &Value) -> Option<PlayerRef> {
    let p = side.get("probablePitcher")?;
    Some(PlayerRef {
        id: as_u32(p.get("id"))?,
        name: p.get("fullName")?.as_str()?.to_string(),
    })
}

fn games(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("dates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|d| d.get("games")?.as_array())
        .flatten()
}

pub(crate) fn parse_schedule(body: &Value) -> Vec<ScheduledGame> {
    let mut out = Vec::new();
    for game in games(body) {
        let Some(game_pk) = game.get("gamePk").and_then(Value::as_u64) else {
            warn!("skipping schedule entry without gamePk");
            continue;
        };
        let (Some(home_side), Some(away_side)) = (
            game.pointer("/teams/home"),
            game.pointer("/teams/away"),
        ) else {
            warn!(game_pk, "skipping schedule entry without teams");
            continue;
        };
        let (Some(home), Some(away)) = (team_ref(home_side), team_ref(away_side)) else {
            warn!(game_pk, "skipping schedule entry with malformed teams");
            continue;
        };
        out.push(ScheduledGame {
            game_pk,
            game_date: game
                .get("gameDate")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            home,
            away,
            home_probable: probable(home_side),
            away_probable: probable(away_side),
        });
    }
    out
}

/// A completed game in the lineup window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinalGame {
    pub game_pk: u64,
    pub official_date: NaiveDate,
    pub game_date: String,
}

/// Completed games, oldest first (doubleheaders ordered by start time).
pub(crate) fn parse_final_games(body: &Value) -> Vec<FinalGame> {
    let mut out: Vec<FinalGame> = games(body)
        .filter(|g| g.pointer("/status/abstractGameState").and_then(Value::as_str) == Some("Final"))
        .filter_map(|g| {
            Some(FinalGame {
                game_pk: g.get("gamePk")?.as_u64()?,
                official_date: g.get("officialDate")?.as_str()?.parse().ok()?,
                game_date: g
                    .get("gameDate")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect();
    out.sort_by(|a, b| {
        (a.official_date, &a.game_date, a.game_pk).cmp(&(b.official_date, &b.game_date, b.game_pk))
    });
    out
}

/// Append the batting orders of `team_id`'s side of a boxscore. Rows for the
/// pitcher position and players without a batting-order code are left out.
pub(crate) fn parse_boxscore_side(
    body: &Value,
    team_id: u32,
    game_date: NaiveDate,
    history: &mut LineupHistory,
) {
    let side = ["home", "away"].into_iter().find_map(|s| {
        let side = body.pointer(&format!("/teams/{s}"))?;
        (as_u32(side.pointer("/team/id")) == Some(team_id)).then_some(side)
    });
    let Some(players) = side.and_then(|s| s.get("players")).and_then(Value::as_object) else {
        warn!(team_id, "boxscore has no players for team");
        return;
    };

    let mut rows: Vec<(u32, u32, u8, String)> = players
        .values()
        .filter(|p| p.pointer("/position/abbreviation").and_then(Value::as_str) != Some("P"))
        .filter_map(|p| {
            let code = p.get("battingOrder")?.as_str()?;
            let slot = decode_batting_order(code)?;
            let id = as_u32(p.pointer("/person/id"))?;
            let name = p
                .pointer("/person/fullName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((code.trim().parse().ok()?, id, slot, name))
        })
        .collect();
    rows.sort();

    for (_, id, slot, name) in rows {
        history.observations.push(BattingObservation {
            player_id: id,
            game_date,
            slot: Some(slot),
            is_pitcher_position: false,
        });
        if !name.is_empty() {
            history.names.insert(id, name);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
