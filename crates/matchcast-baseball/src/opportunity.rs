// Expected plate appearances by lineup slot and site.
//
// Road teams always bat in the ninth, so their hitters see slightly more
// plate appearances than the same slot at home.

use crate::signals::Site;

const HOME_PA: [f64; 5] = [4.49, 4.40, 4.30, 4.20, 4.10];
const AWAY_PA: [f64; 5] = [4.69, 4.59, 4.49, 4.39, 4.28];

/// Expected PA range across the table; maps onto the opportunity fraction.
pub const PA_RANGE: (f64, f64) = (4.10, 4.69);

/// Fraction used when the expected PA is unknown.
pub const NEUTRAL_FRACTION: f64 = 0.5;

/// Expected plate appearances for a slot (1-5) at a site.
pub fn expected_pa(slot: Option<u8>, site: Site) -> Option<f64> {
    let index = usize::from(slot?).checked_sub(1)?;
    let table = match site {
        Site::Home => &HOME_PA,
        Site::Away => &AWAY_PA,
    };
    table.get(index).copied()
}

/// Position of the expected PA within `PA_RANGE`, in [0, 1].
pub fn opportunity_fraction(slot: Option<u8>, site: Site) -> f64 {
    match expected_pa(slot, site) {
        Some(pa) => ((pa - PA_RANGE.0) / (PA_RANGE.1 - PA_RANGE.0)).clamp(0.0, 1.0),
        None => NEUTRAL_FRACTION,
    }
}

/// Share of the opportunity weight earned: 50% at the low end of the range,
/// 100% at the top.
pub fn opportunity_multiplier(slot: Option<u8>, site: Site) -> f64 {
    0.5 + 0.5 * opportunity_fraction(slot, site)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
