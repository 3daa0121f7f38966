// Normalizers mapping raw stat values onto [0, 1].
//
// Every normalizer returns `NEUTRAL` when its input is missing or non-finite
// so a partially populated signal bundle still produces a score.

/// Value substituted for a missing or non-finite metric.
pub const NEUTRAL: f64 = 0.5;

/// OPS band mapped linearly onto [0, 1].
pub const OPS_BAND: (f64, f64) = (0.40, 1.05);

/// Hits-per-9 band mapped linearly onto [0, 1].
pub const H9_BAND: (f64, f64) = (6.0, 12.0);

/// Plate appearances per game for lineup slots 1-5.
pub const PA_BAND: (f64, f64) = (3.8, 4.8);

/// Weighted hit-rate calibration points: floor (0.0), league baseline (0.5),
/// elite (1.0).
pub const WTB_FLOOR: f64 = 0.190;
pub const WTB_BASELINE: f64 = 0.223;
pub const WTB_ELITE: f64 = 0.272;

/// Season PA at which the weighted hit-rate confidence leaves its floor.
pub const CONFIDENCE_PA_START: f64 = 150.0;
/// Season PA at which the weighted hit-rate is fully trusted.
pub const CONFIDENCE_PA_FULL: f64 = 500.0;
/// Lowest confidence multiplier; some weight always remains.
pub const CONFIDENCE_FLOOR: f64 = 0.65;

/// Returns the value only if present and finite.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Linear position of `value` inside `[lo, hi]`, clamped to [0, 1].
///
/// Returns `NEUTRAL` for missing or non-finite input, and for a degenerate
/// band.
pub fn linear_clamp(value: Option<f64>, lo: f64, hi: f64) -> f64 {
    let Some(v) = finite(value) else {
        return NEUTRAL;
    };
    if (hi - lo).abs() < f64::EPSILON {
        return NEUTRAL;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

pub fn norm_ops(ops: Option<f64>) -> f64 {
    linear_clamp(ops, OPS_BAND.0, OPS_BAND.1)
}

/// Hits allowed per nine innings, mapped directly (not inverted): a higher
/// raw value yields a higher normalized value.
pub fn norm_h9(h9: Option<f64>) -> f64 {
    linear_clamp(h9, H9_BAND.0, H9_BAND.1)
}

pub fn norm_pa(pa_per_game: Option<f64>) -> f64 {
    linear_clamp(pa_per_game, PA_BAND.0, PA_BAND.1)
}

/// Weighted hit-rate, piecewise linear through floor / baseline / elite.
///
/// The lower half-segment `[floor, baseline]` maps onto [0, 0.5] and the upper
/// half-segment `[baseline, elite]` onto [0.5, 1]. Values outside clamp.
pub fn norm_wtb(wtb: Option<f64>) -> f64 {
    let Some(v) = finite(wtb) else {
        return NEUTRAL;
    };
    if v <= WTB_FLOOR {
        0.0
    } else if v >= WTB_ELITE {
        1.0
    } else if v <= WTB_BASELINE {
        0.5 * (v - WTB_FLOOR) / (WTB_BASELINE - WTB_FLOOR)
    } else {
        0.5 + 0.5 * (v - WTB_BASELINE) / (WTB_ELITE - WTB_BASELINE)
    }
}

/// Confidence multiplier for the weighted hit-rate given the season sample.
///
/// Pinned at `CONFIDENCE_FLOOR` below 150 PA (or when unknown), 1.0 from
/// 500 PA, and a square-root ease in between so confidence climbs quickly on
/// small samples and levels off near a full season.
pub fn wtb_pa_confidence(season_pa: Option<f64>) -> f64 {
    let Some(pa) = finite(season_pa) else {
        return CONFIDENCE_FLOOR;
    };
    if pa <= CONFIDENCE_PA_START {
        return CONFIDENCE_FLOOR;
    }
    if pa >= CONFIDENCE_PA_FULL {
        return 1.0;
    }
    let fraction = (pa - CONFIDENCE_PA_START) / (CONFIDENCE_PA_FULL - CONFIDENCE_PA_START);
    CONFIDENCE_FLOOR + (1.0 - CONFIDENCE_FLOOR) * fraction.sqrt()
}

/// Square-root ease of `value` over `[lo, hi]`, clamped to [0, 1].
pub fn sqrt_ramp(value: f64, lo: f64, hi: f64) -> f64 {
    if !value.is_finite() || hi <= lo {
        return 0.0;
    }
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
