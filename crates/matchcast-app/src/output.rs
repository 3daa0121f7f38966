// JSON documents handed to the presentation layer.
//
// games-<date>.json   per-game, per-starter rankings
// hitters-<date>.json slate-wide ranking with the season-PA floor applied

use matchcast_baseball::scorer::ScoreBreakdown;
use matchcast_baseball::signals::{BatSide, Hand, HeadToHead, OpsSplit, Site};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::pipeline::{GameReport, MatchupReport, RankedHitter, Report};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {document}: {source}")]
    Json {
        document: &'static str,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Document shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesDocument {
    pub date: String,
    pub games_analyzed: usize,
    pub games: Vec<GameEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
    pub game_pk: u64,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub matchups: Vec<MatchupEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupEntry {
    pub pitcher: String,
    pub pitcher_id: u32,
    pub pitcher_hand: Option<Hand>,
    pub opponent: String,
    pub hitters: Vec<HitterRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedDocument {
    pub date: String,
    pub games_analyzed: usize,
    pub hitter_count: usize,
    pub hitters: Vec<HitterRecord>,
}

/// Hits per nine allowed by the opposing starter, every variant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PitcherH9Record {
    pub vs_side: Option<f64>,
    pub season: Option<f64>,
    pub site: Option<f64>,
    pub vs_left: Option<f64>,
    pub vs_right: Option<f64>,
    pub home: Option<f64>,
    pub away: Option<f64>,
    pub last_28_days: Option<f64>,
}

/// One hitter with the context needed to display it on its own.
///
/// Key casing mixes camelCase and snake_case to match what the presentation
/// layer reads.
#[derive(Debug, Clone, Serialize)]
pub struct HitterRecord {
    #[serde(rename = "gamePk")]
    pub game_pk: u64,
    #[serde(rename = "gameDate")]
    pub game_date: String,
    #[serde(rename = "playerId")]
    pub player_id: u32,
    pub name: String,
    pub team: String,
    pub opponent: String,
    pub pitcher: String,
    #[serde(rename = "pitcherId")]
    pub pitcher_id: u32,
    pub site: Site,
    pub score: u32,
    pub score_breakdown: ScoreBreakdown,
    #[serde(rename = "projectedBattingOrder")]
    pub projected_batting_order: u8,
    pub wtb_percent: Option<f64>,
    pub season_pa: Option<u32>,
    pub ops_vs_pitcher: HeadToHead,
    pub ops_site: OpsSplit,
    pub ops_vs_pitcher_hand: OpsSplit,
    pub ops_last_7_days: OpsSplit,
    pub pitcher_hits_per_9: PitcherH9Record,
    pub bat_side: Option<BatSide>,
    pub pitcher_hand: Option<Hand>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Season hit rate as a percentage with one decimal.
fn wtb_percent(wtb: Option<f64>) -> Option<f64> {
    wtb.filter(|v| v.is_finite())
        .map(|v| (v * 1000.0).round() / 10.0)
}

pub fn hitter_record(game: &GameReport, matchup: &MatchupReport, hitter: &RankedHitter) -> HitterRecord {
    let s = &hitter.signals;
    let p = &hitter.pitcher_h9;
    HitterRecord {
        game_pk: game.game_pk,
        game_date: game.game_date.clone(),
        player_id: hitter.player_id,
        name: hitter.name.clone(),
        team: matchup.opponent.name.clone(),
        opponent: matchup.pitcher_team.name.clone(),
        pitcher: matchup.pitcher.name.clone(),
        pitcher_id: matchup.pitcher.id,
        site: hitter.site,
        score: hitter.score,
        score_breakdown: hitter.breakdown,
        projected_batting_order: hitter.projected_slot,
        wtb_percent: wtb_percent(s.season_wtb),
        season_pa: s.season_pa,
        ops_vs_pitcher: s.vs_pitcher,
        ops_site: s.vs_site,
        ops_vs_pitcher_hand: s.vs_pitcher_hand,
        ops_last_7_days: s.last_7_days,
        pitcher_hits_per_9: PitcherH9Record {
            vs_side: s.pitcher_h9.vs_side,
            season: s.pitcher_h9.season,
            site: s.pitcher_h9.site,
            vs_left: p.h9_vs_left,
            vs_right: p.h9_vs_right,
            home: p.h9_home,
            away: p.h9_away,
            last_28_days: s.pitcher_h9.last_28_days,
        },
        bat_side: s.bat_side,
        pitcher_hand: s.pitcher_hand,
    }
}

pub fn games_document(report: &Report) -> GamesDocument {
    GamesDocument {
        date: report.date.to_string(),
        games_analyzed: report.games_analyzed(),
        games: report
            .games
            .iter()
            .map(|game| GameEntry {
                game_pk: game.game_pk,
                game_date: game.game_date.clone(),
                home_team: game.home.name.clone(),
                away_team: game.away.name.clone(),
                matchups: game
                    .matchups
                    .iter()
                    .map(|m| MatchupEntry {
                        pitcher: m.pitcher.name.clone(),
                        pitcher_id: m.pitcher.id,
                        pitcher_hand: m.pitcher_hand,
                        opponent: m.opponent.name.clone(),
                        hitters: m.hitters.iter().map(|h| hitter_record(game, m, h)).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn combined_document(report: &Report, min_season_pa: u32) -> CombinedDocument {
    let hitters: Vec<HitterRecord> = report
        .combined(min_season_pa)
        .into_iter()
        .map(|e| hitter_record(e.game, e.matchup, e.hitter))
        .collect();
    CombinedDocument {
        date: report.date.to_string(),
        games_analyzed: report.games_analyzed(),
        hitter_count: hitters.len(),
        hitters,
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Paths of the two documents written for one slate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDocuments {
    pub games: PathBuf,
    pub hitters: PathBuf,
}

fn write_pretty<T: Serialize>(
    value: &T,
    document: &'static str,
    path: PathBuf,
) -> Result<PathBuf, OutputError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| OutputError::Json { document, source })?;
    std::fs::write(&path, json).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write both documents for `report` into `dir`, creating it if needed.
pub fn write_documents(
    report: &Report,
    min_season_pa: u32,
    dir: &Path,
) -> Result<WrittenDocuments, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let date = report.date;
    let games = write_pretty(
        &games_document(report),
        "games document",
        dir.join(format!("games-{date}.json")),
    )?;
    let combined = combined_document(report, min_season_pa);
    let hitter_count = combined.hitter_count;
    let hitters = write_pretty(
        &combined,
        "hitters document",
        dir.join(format!("hitters-{date}.json")),
    )?;

    info!(
        games = %games.display(),
        hitters = %hitters.display(),
        hitter_count,
        "documents written"
    );
    Ok(WrittenDocuments { games, hitters })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{PitcherProfile, PlayerRef, TeamRef};
    use chrono::NaiveDate;
    use matchcast_baseball::signals::SignalBundle;

    fn hitter(id: u32, name: &str, score: u32, season_pa: u32) -> RankedHitter {
        let mut signals = SignalBundle::empty(Site::Away);
        signals.season_pa = Some(season_pa);
        signals.season_wtb = Some(0.2567);
        signals.projected_slot = Some(2);
        RankedHitter {
            player_id: id,
            name: name.to_string(),
            projected_slot: 2,
            slot_sample: 6,
            score,
            breakdown: ScoreBreakdown {
                wtb: score,
                ..ScoreBreakdown::default()
            },
            h2h_share: 0.02,
            site: Site::Away,
            signals,
            pitcher_h9: PitcherProfile {
                h9_vs_left: Some(8.4),
                ..PitcherProfile::default()
            },
        }
    }

    fn report() -> Report {
        let team = |id, name: &str| TeamRef {
            id,
            name: name.to_string(),
        };
        let game = |pk, hitters| GameReport {
            game_pk: pk,
            game_date: "2025-06-10T23:05:00Z".into(),
            home: team(1, "Hosts"),
            away: team(2, "Visitors"),
            matchups: vec![MatchupReport {
                pitcher: PlayerRef {
                    id: 900 + pk as u32,
                    name: format!("Starter {pk}"),
                },
                pitcher_team: team(1, "Hosts"),
                pitcher_hand: Some(Hand::Right),
                opponent: team(2, "Visitors"),
                hitters,
            }],
        };
        Report {
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            games: vec![
                game(1, vec![hitter(10, "Alpha", 61, 300), hitter(11, "Bravo", 40, 60)]),
                game(2, vec![hitter(20, "Charlie", 72, 150)]),
            ],
        }
    }

    #[test]
    fn wtb_as_percent() {
        assert_eq!(wtb_percent(Some(0.2567)), Some(25.7));
        assert_eq!(wtb_percent(None), None);
        assert_eq!(wtb_percent(Some(f64::NAN)), None);
    }

    #[test]
    fn combined_document_filters_and_ranks() {
        let doc = combined_document(&report(), 85);
        assert_eq!(doc.games_analyzed, 2);
        assert_eq!(doc.hitter_count, 2);
        let names: Vec<&str> = doc.hitters.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Alpha"]);
    }

    #[test]
    fn hitter_record_keys() {
        let doc = combined_document(&report(), 0);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["hitterCount"], 3);
        let first = &value["hitters"][0];
        assert_eq!(first["gamePk"], 2);
        assert_eq!(first["projectedBattingOrder"], 2);
        assert_eq!(first["team"], "Visitors");
        assert_eq!(first["opponent"], "Hosts");
        assert_eq!(first["site"], "away");
        assert_eq!(first["score_breakdown"]["wtb"], 72);
        assert_eq!(first["wtb_percent"], 25.7);
        assert_eq!(first["pitcher_hits_per_9"]["vs_left"], 8.4);
        assert!(first["ops_vs_pitcher"].get("ab").is_some());
        assert!(first["ops_last_7_days"].get("pa").is_some());
    }

    #[test]
    fn games_document_shape() {
        let value = serde_json::to_value(games_document(&report())).unwrap();
        assert_eq!(value["date"], "2025-06-10");
        assert_eq!(value["gamesAnalyzed"], 2);
        let matchup = &value["games"][0]["matchups"][0];
        assert_eq!(matchup["pitcher"], "Starter 1");
        assert_eq!(matchup["pitcherHand"], "R");
        assert_eq!(matchup["hitters"].as_array().unwrap().len(), 2);
        assert_eq!(value["games"][0]["homeTeam"], "Hosts");
    }

    #[test]
    fn writes_both_documents() {
        let dir = std::env::temp_dir().join(format!("matchcast_output_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let written = write_documents(&report(), 85, &dir.join("out")).unwrap();
        assert!(written.games.ends_with("games-2025-06-10.json"));
        assert!(written.hitters.ends_with("hitters-2025-06-10.json"));

        let text = std::fs::read_to_string(&written.hitters).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["hitterCount"], 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
