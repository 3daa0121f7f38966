// Base signal weights and the per-hitter weight resolution.
//
// Weighted hit-rate, opportunity and the dynamic head-to-head share are held
// fixed. The remaining five weights are rescaled by one factor so the full
// table sums to 1.0, after which last-7 is capped at its base value. The base
// table itself need not sum to 1.0: the calibrated defaults total 0.85.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::sqrt_ramp;

/// Last-7 plate appearances at which the recent-form weight starts ramping.
pub const LAST7_MIN_PA: f64 = 3.0;
/// Last-7 plate appearances at which the recent-form weight is fully earned.
pub const LAST7_FULL_PA: f64 = 20.0;

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight `{name}` must be finite and >= 0, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("at least one of h9_side, h9_28, ops_hand, ops_site, last7 must be > 0")]
    NoFlexibleWeight,
}

/// One weight per signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub wtb: f64,
    pub h9_side: f64,
    pub h9_28: f64,
    pub ops_hand: f64,
    pub ops_site: f64,
    pub last7: f64,
    pub opp: f64,
    /// Nominal only; replaced per hitter by the grid share.
    pub h2h: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            wtb: 0.30,
            h9_side: 0.04,
            h9_28: 0.02,
            ops_hand: 0.15,
            ops_site: 0.04,
            last7: 0.10,
            opp: 0.05,
            h2h: 0.15,
        }
    }
}

impl Weights {
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("wtb", self.wtb),
            ("h9_side", self.h9_side),
            ("h9_28", self.h9_28),
            ("ops_hand", self.ops_hand),
            ("ops_site", self.ops_site),
            ("last7", self.last7),
            ("opp", self.opp),
            ("h2h", self.h2h),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    /// Base weights must be finite and non-negative, with something left in
    /// the five flexible weights to absorb redistribution.
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightsError::Negative { name, value });
            }
        }
        if self.flexible_sum() <= 0.0 {
            return Err(WeightsError::NoFlexibleWeight);
        }
        Ok(())
    }

    /// The five weights that absorb redistribution.
    fn flexible_sum(&self) -> f64 {
        self.h9_side + self.h9_28 + self.ops_hand + self.ops_site + self.last7
    }
}

/// Recent-form weight: 50% of base until there are at least three plate
/// appearances with a known OPS, then a square-root ramp to 100% at 20 PA.
pub fn last7_weight(base: f64, pa: Option<u32>, ops_known: bool) -> f64 {
    match pa {
        Some(pa) if ops_known && f64::from(pa) >= LAST7_MIN_PA => {
            base * (0.5 + 0.5 * sqrt_ramp(f64::from(pa), LAST7_MIN_PA, LAST7_FULL_PA))
        }
        _ => base * 0.5,
    }
}

/// Resolve the weight table for one hitter from the base weights and the
/// two dynamic overrides.
pub fn resolve(base: &Weights, h2h_share: f64, last7: f64) -> Weights {
    let mut resolved = Weights {
        h2h: h2h_share,
        last7,
        ..*base
    };

    let fixed = resolved.wtb + resolved.opp + resolved.h2h;
    let flexible = resolved.flexible_sum();
    let scale = if flexible == 0.0 {
        1.0
    } else {
        ((1.0 - fixed) / flexible).max(0.0)
    };

    resolved.h9_side *= scale;
    resolved.h9_28 *= scale;
    resolved.ops_hand *= scale;
    resolved.ops_site *= scale;
    resolved.last7 = (resolved.last7 * scale).min(base.last7);
    resolved
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_weights_are_valid() {
        let w = Weights::default();
        assert!(w.validate().is_ok());
        // Calibrated base table totals 0.85; resolution brings it to 1.0.
        assert!(approx_eq(w.sum(), 0.85));
        assert!(approx_eq(resolve(&w, 0.15, 0.05).sum(), 1.0));
    }

    #[test]
    fn base_sum_is_not_constrained() {
        let w = Weights {
            wtb: 0.5,
            ..Weights::default()
        };
        assert!(w.validate().is_ok());
    }

    #[test]
    fn rejects_empty_flexible_weights() {
        let w = Weights {
            h9_side: 0.0,
            h9_28: 0.0,
            ops_hand: 0.0,
            ops_site: 0.0,
            last7: 0.0,
            ..Weights::default()
        };
        assert_eq!(w.validate(), Err(WeightsError::NoFlexibleWeight));
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        let w = Weights {
            h2h: f64::NAN,
            ..Weights::default()
        };
        assert!(matches!(
            w.validate(),
            Err(WeightsError::Negative { name: "h2h", .. })
        ));

        let w = Weights {
            opp: -0.05,
            wtb: 0.40,
            ..Weights::default()
        };
        assert_eq!(
            w.validate(),
            Err(WeightsError::Negative {
                name: "opp",
                value: -0.05
            })
        );
    }

    #[test]
    fn last7_is_pinned_at_half_without_sample() {
        assert!(approx_eq(last7_weight(0.10, None, false), 0.05));
        assert!(approx_eq(last7_weight(0.10, Some(2), true), 0.05));
        assert!(approx_eq(last7_weight(0.10, Some(15), false), 0.05));
    }

    #[test]
    fn last7_ramps_to_full() {
        assert!(approx_eq(last7_weight(0.10, Some(3), true), 0.05));
        assert!(approx_eq(last7_weight(0.10, Some(20), true), 0.10));
        assert!(approx_eq(last7_weight(0.10, Some(40), true), 0.10));
        let mid = last7_weight(0.10, Some(10), true);
        assert!(mid > 0.05 && mid < 0.10);
    }

    #[test]
    fn resolved_table_sums_to_one_when_uncapped() {
        let base = Weights::default();
        let resolved = resolve(&base, 0.15, 0.05);
        // Nominal h2h leaves 0.50 for five flexible weights that sum to 0.30.
        assert!(approx_eq(resolved.sum(), 1.0));
        assert!(approx_eq(resolved.ops_hand, 0.15 * 0.50 / 0.30));
    }

    #[test]
    fn last7_is_capped_at_base() {
        let base = Weights::default();
        let resolved = resolve(&base, 0.01, 0.10);
        assert!(resolved.last7 <= base.last7 + 1e-12);
        assert!(approx_eq(resolved.last7, base.last7));
    }

    #[test]
    fn zero_flexible_sum_keeps_scale_of_one() {
        let base = Weights {
            wtb: 0.80,
            h9_side: 0.0,
            h9_28: 0.0,
            ops_hand: 0.0,
            ops_site: 0.0,
            last7: 0.0,
            opp: 0.05,
            h2h: 0.15,
        };
        let resolved = resolve(&base, 0.10, 0.0);
        assert!(approx_eq(resolved.ops_hand, 0.0));
        assert!(approx_eq(resolved.wtb, 0.80));
    }

    proptest! {
        #[test]
        fn fixed_weights_are_untouched(share in 0.0f64..=0.30, last7 in 0.05f64..=0.10) {
            let base = Weights::default();
            let resolved = resolve(&base, share, last7);
            prop_assert!(approx_eq(resolved.wtb, 0.30));
            prop_assert!(approx_eq(resolved.opp, 0.05));
            prop_assert!(approx_eq(resolved.h2h, share));
            prop_assert!(resolved.last7 <= base.last7 + 1e-12);
            prop_assert!(resolved.sum() <= 1.0 + 1e-9);
        }
    }
}
