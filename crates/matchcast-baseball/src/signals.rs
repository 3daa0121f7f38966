// Value objects describing one hitter facing one probable starter.

use serde::{Deserialize, Serialize};

/// Whether the hitter's team is at home or on the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Home,
    Away,
}

/// Pitcher throwing hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Hand {
    /// Parse a provider hand code ("L" / "R").
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Hand::Left),
            "R" => Some(Hand::Right),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Batter stance. Switch hitters take the side opposite the pitcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatSide {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "S")]
    Switch,
}

impl BatSide {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L" => Some(BatSide::Left),
            "R" => Some(BatSide::Right),
            "S" => Some(BatSide::Switch),
            _ => None,
        }
    }

    /// The side the batter actually hits from against a pitcher of `hand`.
    /// With an unknown pitcher hand a switch hitter has no effective side.
    pub fn effective(&self, hand: Option<Hand>) -> Option<Hand> {
        match self {
            BatSide::Left => Some(Hand::Left),
            BatSide::Right => Some(Hand::Right),
            BatSide::Switch => hand.map(|h| h.opposite()),
        }
    }
}

/// Plate appearances and OPS over some split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpsSplit {
    pub pa: Option<u32>,
    pub ops: Option<f64>,
}

/// Career line of one batter against one pitcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub ab: Option<u32>,
    pub pa: Option<u32>,
    pub ops: Option<f64>,
}

impl HeadToHead {
    pub fn at_bats(&self) -> u32 {
        self.ab.unwrap_or(0)
    }
}

/// Pitcher hits allowed per nine innings, by split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitcherHits {
    /// Versus the batter's effective side.
    pub vs_side: Option<f64>,
    pub season: Option<f64>,
    /// At the pitcher's site for this game.
    pub site: Option<f64>,
    pub last_28_days: Option<f64>,
}

/// Everything the scorer needs about one hitter in one matchup.
///
/// Supplied wholesale by the data collaborator; every field may be missing
/// and missing fields score as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    /// Season hits per plate appearance.
    pub season_wtb: Option<f64>,
    pub season_pa: Option<u32>,
    pub vs_pitcher: HeadToHead,
    pub vs_pitcher_hand: OpsSplit,
    pub vs_site: OpsSplit,
    pub last_7_days: OpsSplit,
    pub pitcher_h9: PitcherHits,
    pub bat_side: Option<BatSide>,
    pub pitcher_hand: Option<Hand>,
    pub site: Site,
    pub projected_slot: Option<u8>,
}

impl SignalBundle {
    /// A bundle with no data besides the site.
    pub fn empty(site: Site) -> Self {
        Self {
            season_wtb: None,
            season_pa: None,
            vs_pitcher: HeadToHead::default(),
            vs_pitcher_hand: OpsSplit::default(),
            vs_site: OpsSplit::default(),
            last_7_days: OpsSplit::default(),
            pitcher_h9: PitcherHits::default(),
            bat_side: None,
            pitcher_hand: None,
            site,
            projected_slot: None,
        }
    }
}

/// Hits per plate appearance, or `None` without a sample.
pub fn weighted_hit_rate(hits: Option<u32>, pa: Option<u32>) -> Option<f64> {
    match (hits, pa) {
        (Some(h), Some(pa)) if pa > 0 => Some(h as f64 / pa as f64),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
