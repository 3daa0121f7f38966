// Data-access collaborator: schedule, lineup history, and per-player splits.
//
// The scoring engine never fetches anything; the pipeline pulls fully
// resolved profiles through `StatsProvider` and turns them into signal
// bundles.

pub mod statsapi;

use async_trait::async_trait;
use chrono::NaiveDate;
use matchcast_baseball::lineup::BattingObservation;
use matchcast_baseball::signals::{BatSide, Hand, HeadToHead, OpsSplit};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

pub use statsapi::MlbStatsApi;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

// ---------------------------------------------------------------------------
// Schedule types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub id: u32,
    pub name: String,
}

/// One game on the slate with its announced probable starters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledGame {
    pub game_pk: u64,
    /// Scheduled start as reported by the provider (ISO-8601).
    pub game_date: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub home_probable: Option<PlayerRef>,
    pub away_probable: Option<PlayerRef>,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` days ending the day before `date`.
    pub fn trailing(date: NaiveDate, days: u32) -> Self {
        let end = date.pred_opt().unwrap_or(date);
        let start = end - chrono::Duration::days(i64::from(days.max(1)) - 1);
        Self { start, end }
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// A team's recent batting orders, oldest game first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineupHistory {
    pub observations: Vec<BattingObservation>,
    pub names: HashMap<u32, String>,
}

/// Hits allowed per nine innings for a starter, by split.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitcherProfile {
    pub hand: Option<Hand>,
    pub h9_vs_left: Option<f64>,
    pub h9_vs_right: Option<f64>,
    pub h9_season: Option<f64>,
    pub h9_home: Option<f64>,
    pub h9_away: Option<f64>,
    pub h9_recent: Option<f64>,
}

impl PitcherProfile {
    pub fn h9_vs(&self, side: Option<Hand>) -> Option<f64> {
        match side? {
            Hand::Left => self.h9_vs_left,
            Hand::Right => self.h9_vs_right,
        }
    }
}

/// One hitter's season line and splits relevant to a single matchup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitterProfile {
    pub bat_side: Option<BatSide>,
    pub season_hits: Option<u32>,
    pub season_pa: Option<u32>,
    pub vs_pitcher: HeadToHead,
    pub vs_left: OpsSplit,
    pub vs_right: OpsSplit,
    pub home: OpsSplit,
    pub away: OpsSplit,
    pub recent: OpsSplit,
}

impl HitterProfile {
    pub fn vs_hand(&self, hand: Option<Hand>) -> OpsSplit {
        match hand {
            Some(Hand::Left) => self.vs_left,
            Some(Hand::Right) => self.vs_right,
            None => OpsSplit::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Games scheduled on `date`.
    async fn schedule(&self, date: NaiveDate) -> Result<Vec<ScheduledGame>, ProviderError>;

    /// Batting orders from the team's completed games inside `window`.
    async fn lineup_history(
        &self,
        team_id: u32,
        window: DateWindow,
    ) -> Result<LineupHistory, ProviderError>;

    async fn pitcher_profile(
        &self,
        pitcher_id: u32,
        season: i32,
        recent: DateWindow,
    ) -> Result<PitcherProfile, ProviderError>;

    async fn hitter_profile(
        &self,
        batter_id: u32,
        pitcher_id: u32,
        season: i32,
        recent: DateWindow,
    ) -> Result<HitterProfile, ProviderError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
