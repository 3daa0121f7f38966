// Projection pipeline: schedule -> lineups -> signal bundles -> ranked hitters.
//
// All network work goes through `StatsProvider`; the scoring engine only sees
// resolved `SignalBundle` values. Upstream failures below the schedule level
// degrade to absent signals (or an empty matchup) and are logged, never
// propagated.

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use futures_util::stream::{self, StreamExt};
use matchcast_baseball::lineup::{build_profiles, LineupProfile};
use matchcast_baseball::scorer::{ScoreBreakdown, Scorer};
use matchcast_baseball::signals::{weighted_hit_rate, Hand, PitcherHits, SignalBundle, Site};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use crate::config::{Config, EligibilityConfig, WindowsConfig};
use crate::provider::{
    DateWindow, HitterProfile, LineupHistory, PitcherProfile, PlayerRef, ScheduledGame,
    StatsProvider, TeamRef,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub eligibility: EligibilityConfig,
    pub windows: WindowsConfig,
    pub max_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            eligibility: EligibilityConfig::default(),
            windows: WindowsConfig::default(),
            max_concurrency: 4,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            eligibility: config.eligibility.clone(),
            windows: config.windows.clone(),
            max_concurrency: config.provider.max_concurrency,
        }
    }
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One scored hitter in one pitcher matchup.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHitter {
    pub player_id: u32,
    pub name: String,
    pub projected_slot: u8,
    /// Games in the lineup window the slot projection rests on.
    pub slot_sample: u32,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub h2h_share: f64,
    pub site: Site,
    /// Inputs the score was computed from, kept for display.
    pub signals: SignalBundle,
    /// Every hits-per-9 variant of the opposing starter, for display.
    pub pitcher_h9: PitcherProfile,
}

/// A probable starter and the opposing hitters ranked against him.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupReport {
    pub pitcher: PlayerRef,
    pub pitcher_team: TeamRef,
    pub pitcher_hand: Option<Hand>,
    pub opponent: TeamRef,
    pub hitters: Vec<RankedHitter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub game_pk: u64,
    pub game_date: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub matchups: Vec<MatchupReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub date: NaiveDate,
    pub games: Vec<GameReport>,
}

/// A hitter in the slate-wide list, with the game and matchup it came from.
#[derive(Debug, Clone, Copy)]
pub struct CombinedEntry<'a> {
    pub game: &'a GameReport,
    pub matchup: &'a MatchupReport,
    pub hitter: &'a RankedHitter,
}

impl Report {
    pub fn games_analyzed(&self) -> usize {
        self.games.len()
    }

    /// Every ranked hitter on the slate with at least `min_season_pa` season
    /// plate appearances, best first.
    pub fn combined(&self, min_season_pa: u32) -> Vec<CombinedEntry<'_>> {
        let mut entries: Vec<CombinedEntry<'_>> = self
            .games
            .iter()
            .flat_map(|game| {
                game.matchups.iter().flat_map(move |matchup| {
                    matchup
                        .hitters
                        .iter()
                        .map(move |hitter| CombinedEntry { game, matchup, hitter })
                })
            })
            .filter(|e| e.hitter.signals.season_pa.unwrap_or(0) >= min_season_pa)
            .collect();
        entries.sort_by(|a, b| by_rank(a.hitter, b.hitter));
        entries
    }
}

/// Score descending, then name.
fn by_rank(a: &RankedHitter, b: &RankedHitter) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

pub fn sort_ranked(hitters: &mut [RankedHitter]) {
    hitters.sort_by(by_rank);
}

// ---------------------------------------------------------------------------
// Bundle assembly and eligibility
// ---------------------------------------------------------------------------

/// Build the scorer input for one hitter against one starter.
///
/// `site` is the hitter's; the starter pitches at the other one. Hand splits
/// follow the starter's hand and side splits the batter's effective side.
pub fn assemble_bundle(
    hitter: &HitterProfile,
    pitcher: &PitcherProfile,
    site: Site,
    projected_slot: Option<u8>,
) -> SignalBundle {
    let effective_side = hitter.bat_side.and_then(|s| s.effective(pitcher.hand));
    let (vs_site, pitcher_site_h9) = match site {
        Site::Home => (hitter.home, pitcher.h9_away),
        Site::Away => (hitter.away, pitcher.h9_home),
    };

    SignalBundle {
        season_wtb: weighted_hit_rate(hitter.season_hits, hitter.season_pa),
        season_pa: hitter.season_pa,
        vs_pitcher: hitter.vs_pitcher,
        vs_pitcher_hand: hitter.vs_hand(pitcher.hand),
        vs_site,
        last_7_days: hitter.recent,
        pitcher_h9: PitcherHits {
            vs_side: pitcher.h9_vs(effective_side),
            season: pitcher.h9_season,
            site: pitcher_site_h9,
            last_28_days: pitcher.h9_recent,
        },
        bat_side: hitter.bat_side,
        pitcher_hand: pitcher.hand,
        site,
        projected_slot,
    }
}

/// Whether a scored hitter belongs in the per-matchup output.
pub fn is_eligible(signals: &SignalBundle, rules: &EligibilityConfig) -> bool {
    let slot_ok = signals
        .projected_slot
        .is_some_and(|s| (1..=rules.max_projected_slot).contains(&s));
    slot_ok && signals.vs_pitcher.at_bats() >= rules.min_h2h_at_bats
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// One probable starter to evaluate.
#[derive(Debug, Clone)]
struct MatchupTask {
    game_index: usize,
    pitcher: PlayerRef,
    pitcher_team: TeamRef,
    opponent: TeamRef,
    hitter_site: Site,
}

/// A lineup regular to fetch and score.
#[derive(Debug, Clone)]
struct Candidate {
    player_id: u32,
    name: String,
    slot: u8,
    sample: u32,
}

pub struct Pipeline<P> {
    provider: P,
    scorer: Scorer,
    options: PipelineOptions,
}

impl<P: StatsProvider> Pipeline<P> {
    pub fn new(provider: P, scorer: Scorer, options: PipelineOptions) -> Self {
        Self {
            provider,
            scorer,
            options,
        }
    }

    /// Project and rank every probable-starter matchup on `date`.
    pub async fn run(&self, date: NaiveDate) -> anyhow::Result<Report> {
        let schedule = self
            .provider
            .schedule(date)
            .await
            .with_context(|| format!("failed to fetch schedule for {date}"))?;
        info!(%date, games = schedule.len(), "schedule loaded");

        let tasks = matchup_tasks(&schedule);
        debug!(matchups = tasks.len(), "probable-starter matchups");

        let width = self.options.max_concurrency.max(1);
        let evaluated: Vec<(usize, MatchupReport)> = stream::iter(tasks)
            .map(|task| async move {
                let game_index = task.game_index;
                (game_index, self.evaluate_matchup(task, date).await)
            })
            .buffered(width)
            .collect()
            .await;

        let mut games: Vec<GameReport> = schedule
            .into_iter()
            .map(|g| GameReport {
                game_pk: g.game_pk,
                game_date: g.game_date,
                home: g.home,
                away: g.away,
                matchups: Vec::new(),
            })
            .collect();
        for (index, matchup) in evaluated {
            if let Some(game) = games.get_mut(index) {
                game.matchups.push(matchup);
            }
        }

        let ranked: usize = games
            .iter()
            .flat_map(|g| &g.matchups)
            .map(|m| m.hitters.len())
            .sum();
        info!(%date, games = games.len(), hitters = ranked, "projection complete");

        Ok(Report { date, games })
    }

    async fn evaluate_matchup(&self, task: MatchupTask, date: NaiveDate) -> MatchupReport {
        let windows = &self.options.windows;
        let season = date.year();
        let lineup_window = DateWindow::trailing(date, windows.lineup_days);
        let recent_window = DateWindow::trailing(date, windows.recent_form_days);
        let pitcher_window = DateWindow::trailing(date, windows.pitcher_recent_days);

        let (history, pitcher) = tokio::join!(
            self.provider.lineup_history(task.opponent.id, lineup_window),
            self.provider
                .pitcher_profile(task.pitcher.id, season, pitcher_window),
        );

        let history = history.unwrap_or_else(|e| {
            warn!(team = %task.opponent.name, "lineup history unavailable: {e}");
            LineupHistory::default()
        });
        let pitcher = pitcher.unwrap_or_else(|e| {
            warn!(pitcher = %task.pitcher.name, "pitcher profile unavailable: {e}");
            PitcherProfile::default()
        });

        let candidates = self.candidates(&history);
        debug!(
            pitcher = %task.pitcher.name,
            opponent = %task.opponent.name,
            candidates = candidates.len(),
            "lineup projected"
        );

        let width = self.options.max_concurrency.max(1);
        let pitcher_id = task.pitcher.id;
        let scored: Vec<Option<RankedHitter>> = stream::iter(candidates)
            .map(|c| {
                let pitcher = &pitcher;
                let site = task.hitter_site;
                async move {
                    let profile = self
                        .provider
                        .hitter_profile(c.player_id, pitcher_id, season, recent_window)
                        .await
                        .unwrap_or_else(|e| {
                            warn!(player = %c.name, "hitter profile unavailable: {e}");
                            HitterProfile::default()
                        });
                    self.rank(c, &profile, pitcher, site)
                }
            })
            .buffered(width)
            .collect()
            .await;

        let mut hitters: Vec<RankedHitter> = scored.into_iter().flatten().collect();
        sort_ranked(&mut hitters);
        info!(
            pitcher = %task.pitcher.name,
            opponent = %task.opponent.name,
            ranked = hitters.len(),
            "matchup scored"
        );

        MatchupReport {
            pitcher: task.pitcher,
            pitcher_team: task.pitcher_team,
            pitcher_hand: pitcher.hand,
            opponent: task.opponent,
            hitters,
        }
    }

    /// Lineup regulars projected into the slots worth fetching.
    fn candidates(&self, history: &LineupHistory) -> Vec<Candidate> {
        let max_slot = self.options.eligibility.max_projected_slot;
        build_profiles(&history.observations)
            .into_iter()
            .filter_map(|(player_id, profile): (u32, LineupProfile)| {
                let slot = profile.projected_slot()?;
                if slot > max_slot {
                    return None;
                }
                Some(Candidate {
                    player_id,
                    name: history
                        .names
                        .get(&player_id)
                        .cloned()
                        .unwrap_or_else(|| format!("#{player_id}")),
                    slot,
                    sample: profile.sample_size(),
                })
            })
            .collect()
    }

    fn rank(
        &self,
        candidate: Candidate,
        hitter: &HitterProfile,
        pitcher: &PitcherProfile,
        site: Site,
    ) -> Option<RankedHitter> {
        let signals = assemble_bundle(hitter, pitcher, site, Some(candidate.slot));
        if !is_eligible(&signals, &self.options.eligibility) {
            debug!(
                player = %candidate.name,
                at_bats = signals.vs_pitcher.at_bats(),
                "not eligible"
            );
            return None;
        }

        let scored = self.scorer.score(&signals);
        Some(RankedHitter {
            player_id: candidate.player_id,
            name: candidate.name,
            projected_slot: candidate.slot,
            slot_sample: candidate.sample,
            score: scored.score,
            breakdown: scored.breakdown,
            h2h_share: scored.h2h_share,
            site,
            signals,
            pitcher_h9: *pitcher,
        })
    }
}

/// Each announced starter faces the other team's lineup.
fn matchup_tasks(schedule: &[ScheduledGame]) -> Vec<MatchupTask> {
    let mut tasks = Vec::new();
    for (game_index, game) in schedule.iter().enumerate() {
        if let Some(p) = &game.home_probable {
            tasks.push(MatchupTask {
                game_index,
                pitcher: p.clone(),
                pitcher_team: game.home.clone(),
                opponent: game.away.clone(),
                hitter_site: Site::Away,
            });
        }
        if let Some(p) = &game.away_probable {
            tasks.push(MatchupTask {
                game_index,
                pitcher: p.clone(),
                pitcher_team: game.away.clone(),
                opponent: game.home.clone(),
                hitter_site: Site::Home,
            });
        }
        if game.home_probable.is_none() && game.away_probable.is_none() {
            debug!(game_pk = game.game_pk, "no probable starters announced");
        }
    }
    tasks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
