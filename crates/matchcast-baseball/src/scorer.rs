// Composite matchup score.
//
// Eight signals are normalized, weighted with the per-hitter resolved weight
// table, summed into a 0-100 score, and then split back into an integer
// breakdown that sums exactly to the score.

use serde::Serialize;
use tracing::trace;

use crate::h2h_grid::H2hGrid;
use crate::normalize::{finite, norm_h9, norm_ops, norm_wtb, wtb_pa_confidence};
use crate::opportunity::opportunity_multiplier;
use crate::signals::SignalBundle;
use crate::weights::{self, Weights, WeightsError};

/// Lowest score a scored hitter can show.
pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 100;

/// Absorbs float noise so an exact proportional share is not floored one
/// point short.
const FLOOR_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// The eight scoring signals, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Wtb,
    H9Side,
    H9Recent,
    OpsHand,
    OpsSite,
    Last7,
    Opportunity,
    HeadToHead,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::Wtb,
        Signal::H9Side,
        Signal::H9Recent,
        Signal::OpsHand,
        Signal::OpsSite,
        Signal::Last7,
        Signal::Opportunity,
        Signal::HeadToHead,
    ];

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Weighted contribution of each signal to the raw [0, 1] score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contributions([f64; 8]);

impl Contributions {
    pub fn get(&self, signal: Signal) -> f64 {
        self.0[signal.index()]
    }

    pub fn set(&mut self, signal: Signal, value: f64) {
        self.0[signal.index()] = value;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Integer points per signal; sums exactly to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub wtb: u32,
    pub h9_side: u32,
    pub h9_28: u32,
    pub ops_hand: u32,
    pub ops_site: u32,
    pub last7: u32,
    pub opp: u32,
    pub h2h: u32,
}

impl ScoreBreakdown {
    pub fn get(&self, signal: Signal) -> u32 {
        match signal {
            Signal::Wtb => self.wtb,
            Signal::H9Side => self.h9_side,
            Signal::H9Recent => self.h9_28,
            Signal::OpsHand => self.ops_hand,
            Signal::OpsSite => self.ops_site,
            Signal::Last7 => self.last7,
            Signal::Opportunity => self.opp,
            Signal::HeadToHead => self.h2h,
        }
    }

    fn slot_mut(&mut self, signal: Signal) -> &mut u32 {
        match signal {
            Signal::Wtb => &mut self.wtb,
            Signal::H9Side => &mut self.h9_side,
            Signal::H9Recent => &mut self.h9_28,
            Signal::OpsHand => &mut self.ops_hand,
            Signal::OpsSite => &mut self.ops_site,
            Signal::Last7 => &mut self.last7,
            Signal::Opportunity => &mut self.opp,
            Signal::HeadToHead => &mut self.h2h,
        }
    }

    pub fn total(&self) -> u32 {
        Signal::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Split `score` into per-signal points.
///
/// Head-to-head is pinned to its own rounded contribution. The rest of the
/// score is shared among the other seven signals in proportion to their
/// contributions, floored, and the rounding shortfall goes to the largest
/// contributor (the first in `Signal::ALL` order when several tie). With no
/// other contribution the whole score is attributed to head-to-head.
pub fn reconcile(score: u32, contributions: &Contributions) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::default();
    let h2h_points = (contributions.get(Signal::HeadToHead) * 100.0).round().max(0.0) as u32;

    let others: Vec<Signal> = Signal::ALL
        .into_iter()
        .filter(|s| *s != Signal::HeadToHead)
        .collect();
    let other_total: f64 = others.iter().map(|s| contributions.get(*s).max(0.0)).sum();

    if other_total <= 0.0 {
        breakdown.h2h = score;
        return breakdown;
    }

    breakdown.h2h = h2h_points;
    let remaining = score.saturating_sub(h2h_points);

    let mut assigned = 0u32;
    let mut largest = others[0];
    for &signal in &others {
        let share = contributions.get(signal).max(0.0);
        let points = (f64::from(remaining) * share / other_total + FLOOR_EPSILON).floor() as u32;
        *breakdown.slot_mut(signal) = points;
        assigned += points;
        if share > contributions.get(largest).max(0.0) {
            largest = signal;
        }
    }

    let drift = i64::from(remaining) - i64::from(assigned);
    let slot = breakdown.slot_mut(largest);
    *slot = (i64::from(*slot) + drift).max(0) as u32;
    breakdown
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Result of scoring one hitter.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupScore {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub h2h_share: f64,
    /// Resolved weights used for this hitter.
    pub weights: Weights,
    pub contributions: Contributions,
}

/// Composite scorer. Stateless apart from its configuration.
#[derive(Debug, Clone)]
pub struct Scorer {
    base: Weights,
    grid: H2hGrid,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            base: Weights::default(),
            grid: H2hGrid::calibrated().clone(),
        }
    }
}

impl Scorer {
    /// Scorer with custom base weights and the calibrated grid.
    pub fn new(base: Weights) -> Result<Self, WeightsError> {
        base.validate()?;
        Ok(Self {
            base,
            grid: H2hGrid::calibrated().clone(),
        })
    }

    /// Head-to-head share for this bundle.
    pub fn h2h_share(&self, signals: &SignalBundle) -> f64 {
        self.grid.weight(
            signals.vs_pitcher.ab.map(f64::from),
            signals.vs_pitcher.ops,
        )
    }

    /// Resolved weight table for this bundle.
    pub fn resolve_weights(&self, signals: &SignalBundle) -> Weights {
        let last7 = weights::last7_weight(
            self.base.last7,
            signals.last_7_days.pa,
            finite(signals.last_7_days.ops).is_some(),
        );
        weights::resolve(&self.base, self.h2h_share(signals), last7)
    }

    pub fn score(&self, signals: &SignalBundle) -> MatchupScore {
        let w = self.resolve_weights(signals);
        let h2h_share = w.h2h;
        let confidence = wtb_pa_confidence(signals.season_pa.map(f64::from));

        let mut contributions = Contributions::default();
        contributions.set(
            Signal::Wtb,
            norm_wtb(signals.season_wtb) * w.wtb * confidence,
        );
        contributions.set(Signal::H9Side, norm_h9(signals.pitcher_h9.vs_side) * w.h9_side);
        contributions.set(
            Signal::H9Recent,
            norm_h9(signals.pitcher_h9.last_28_days) * w.h9_28,
        );
        contributions.set(Signal::OpsHand, norm_ops(signals.vs_pitcher_hand.ops) * w.ops_hand);
        contributions.set(Signal::OpsSite, norm_ops(signals.vs_site.ops) * w.ops_site);
        contributions.set(Signal::Last7, norm_ops(signals.last_7_days.ops) * w.last7);
        contributions.set(
            Signal::Opportunity,
            opportunity_multiplier(signals.projected_slot, signals.site) * w.opp,
        );
        contributions.set(Signal::HeadToHead, h2h_share);

        let raw = contributions.total().clamp(0.0, 1.0);
        let score = ((raw * 100.0).round() as u32).clamp(MIN_SCORE, MAX_SCORE);
        let breakdown = reconcile(score, &contributions);

        trace!(score, raw, h2h_share, "scored matchup");

        MatchupScore {
            score,
            breakdown,
            h2h_share,
            weights: w,
            contributions,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{HeadToHead, OpsSplit, PitcherHits, Site};
    use proptest::prelude::*;

    fn strong_hitter() -> SignalBundle {
        SignalBundle {
            season_wtb: Some(0.250),
            season_pa: Some(400),
            vs_pitcher: HeadToHead {
                ab: Some(8),
                pa: Some(9),
                ops: Some(0.85),
            },
            last_7_days: OpsSplit {
                pa: Some(10),
                ops: Some(0.90),
            },
            projected_slot: Some(3),
            ..SignalBundle::empty(Site::Home)
        }
    }

    fn weak_hitter() -> SignalBundle {
        SignalBundle {
            season_wtb: Some(0.200),
            season_pa: Some(90),
            vs_pitcher: HeadToHead {
                ab: Some(1),
                pa: Some(1),
                ops: Some(0.40),
            },
            projected_slot: Some(5),
            ..SignalBundle::empty(Site::Away)
        }
    }

    fn h2h_points(result: &MatchupScore) -> u32 {
        (result.h2h_share * 100.0).round() as u32
    }

    // -- End to end --

    #[test]
    fn strong_hitter_outranks_weak_hitter() {
        let scorer = Scorer::default();
        let strong = scorer.score(&strong_hitter());
        let weak = scorer.score(&weak_hitter());
        assert!(
            strong.score > weak.score + 10,
            "strong {} vs weak {}",
            strong.score,
            weak.score
        );
    }

    #[test]
    fn breakdown_sums_to_score_and_pins_h2h() {
        let scorer = Scorer::default();
        for bundle in [strong_hitter(), weak_hitter(), SignalBundle::empty(Site::Home)] {
            let result = scorer.score(&bundle);
            assert_eq!(result.breakdown.total(), result.score);
            assert_eq!(result.breakdown.h2h, h2h_points(&result));
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let scorer = Scorer::default();
        let bundle = strong_hitter();
        assert_eq!(scorer.score(&bundle), scorer.score(&bundle));
    }

    #[test]
    fn empty_bundle_still_scores() {
        let result = Scorer::default().score(&SignalBundle::empty(Site::Away));
        assert!((MIN_SCORE..=MAX_SCORE).contains(&result.score));
        // No at-bats and no OPS: row 1 at the league-baseline OPS.
        assert!((result.h2h_share - 0.02).abs() < 1e-9);
    }

    #[test]
    fn wtb_weight_and_opportunity_base_are_anchored() {
        let scorer = Scorer::default();
        for bundle in [strong_hitter(), weak_hitter()] {
            let w = scorer.resolve_weights(&bundle);
            assert!((w.wtb - 0.30).abs() < 1e-12);
            assert!((w.opp - 0.05).abs() < 1e-12);
        }
    }

    #[test]
    fn wtb_contribution_carries_confidence() {
        let scorer = Scorer::default();
        let mut low = strong_hitter();
        low.season_pa = Some(100);
        let full = scorer.score(&strong_hitter()).contributions.get(Signal::Wtb);
        let damped = scorer.score(&low).contributions.get(Signal::Wtb);
        assert!(damped < full);
        assert!((damped / full - 0.65 / wtb_pa_confidence(Some(400.0))).abs() < 1e-9);
    }

    #[test]
    fn pitcher_splits_feed_h9_signals() {
        let scorer = Scorer::default();
        let mut hittable = strong_hitter();
        hittable.pitcher_h9 = PitcherHits {
            vs_side: Some(11.5),
            season: Some(10.0),
            site: Some(10.0),
            last_28_days: Some(11.0),
        };
        let base = scorer.score(&strong_hitter());
        let boosted = scorer.score(&hittable);
        assert!(
            boosted.contributions.get(Signal::H9Side) > base.contributions.get(Signal::H9Side)
        );
        assert!(boosted.score >= base.score);
    }

    #[test]
    fn custom_weights_are_validated() {
        let bad = Weights {
            ops_hand: -0.15,
            ..Weights::default()
        };
        assert!(Scorer::new(bad).is_err());
        assert!(Scorer::new(Weights::default()).is_ok());
    }

    // -- Reconciliation --

    #[test]
    fn reconcile_gives_drift_to_largest() {
        let mut c = Contributions::default();
        c.set(Signal::Wtb, 0.20);
        c.set(Signal::OpsHand, 0.10);
        c.set(Signal::Opportunity, 0.10);
        c.set(Signal::HeadToHead, 0.05);
        // remaining = 45 - 5 = 40 -> 20 / 10 / 10 exactly.
        let b = reconcile(45, &c);
        assert_eq!(b.h2h, 5);
        assert_eq!(b.wtb, 20);
        assert_eq!(b.ops_hand, 10);
        assert_eq!(b.opp, 10);

        // remaining = 41 -> floors 20 / 10 / 10 with one point of drift.
        let b = reconcile(46, &c);
        assert_eq!(b.wtb, 21);
        assert_eq!(b.total(), 46);
    }

    #[test]
    fn reconcile_tie_breaks_on_signal_order() {
        let mut c = Contributions::default();
        c.set(Signal::OpsSite, 0.1);
        c.set(Signal::Last7, 0.1);
        c.set(Signal::Opportunity, 0.1);
        let b = reconcile(10, &c);
        assert_eq!(b.ops_site, 4);
        assert_eq!(b.last7, 3);
        assert_eq!(b.opp, 3);
    }

    #[test]
    fn reconcile_attributes_everything_to_h2h_without_other_signals() {
        let mut c = Contributions::default();
        c.set(Signal::HeadToHead, 0.12);
        let b = reconcile(12, &c);
        assert_eq!(b.h2h, 12);
        assert_eq!(b.total(), 12);
    }

    fn arb_split() -> impl Strategy<Value = OpsSplit> {
        (proptest::option::of(0u32..60), proptest::option::of(0.0f64..2.5))
            .prop_map(|(pa, ops)| OpsSplit { pa, ops })
    }

    fn arb_bundle() -> impl Strategy<Value = SignalBundle> {
        (
            proptest::option::of(0.0f64..0.45),
            proptest::option::of(0u32..750),
            (proptest::option::of(0u32..80), proptest::option::of(0.0f64..3.0)),
            (arb_split(), arb_split(), arb_split()),
            proptest::option::of(3.0f64..15.0),
            proptest::option::of(3.0f64..15.0),
            proptest::option::of(0u8..11),
            any::<bool>(),
        )
            .prop_map(|(wtb, pa, (ab, h2h_ops), (hand, site_split, last7), side, recent, slot, home)| {
                SignalBundle {
                    season_wtb: wtb,
                    season_pa: pa,
                    vs_pitcher: HeadToHead {
                        ab,
                        pa: ab,
                        ops: h2h_ops,
                    },
                    vs_pitcher_hand: hand,
                    vs_site: site_split,
                    last_7_days: last7,
                    pitcher_h9: PitcherHits {
                        vs_side: side,
                        season: None,
                        site: None,
                        last_28_days: recent,
                    },
                    projected_slot: slot,
                    ..SignalBundle::empty(if home { Site::Home } else { Site::Away })
                }
            })
    }

    proptest! {
        #[test]
        fn score_bounds_and_breakdown_invariants(bundle in arb_bundle()) {
            let scorer = Scorer::default();
            let result = scorer.score(&bundle);
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&result.score));
            prop_assert_eq!(result.breakdown.total(), result.score);
            prop_assert_eq!(result.breakdown.h2h, h2h_points(&result));
            prop_assert!((0.0..=0.30).contains(&result.h2h_share));
            prop_assert!((result.weights.wtb - 0.30).abs() < 1e-12);
        }
    }
}
