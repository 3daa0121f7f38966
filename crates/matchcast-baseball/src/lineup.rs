// Lineup-slot projection from recent batting-order history.
//
// Observations are folded in chronological order. The projected slot is the
// most frequent one; on a count tie the slot of the most recent game wins,
// and when the latest slot is not among the tied slots the slot that first
// appeared earliest in the fold is kept. First-seen (not last-seen) is the
// chosen rule for that case; `counts` keeps first-appearance order for it.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Valid lineup slots.
pub const SLOTS: std::ops::RangeInclusive<u8> = 1..=9;

/// One hitter's lineup slot in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattingObservation {
    pub player_id: u32,
    pub game_date: NaiveDate,
    pub slot: Option<u8>,
    pub is_pitcher_position: bool,
}

impl BattingObservation {
    /// The slot, if this observation counts toward a projection.
    fn qualifying_slot(&self) -> Option<u8> {
        if self.is_pitcher_position {
            return None;
        }
        self.slot.filter(|s| SLOTS.contains(s))
    }
}

/// Decode a provider batting-order code: the hundreds digit is the slot
/// (`"301"` is slot 3, a substitute in that slot). Zero or out-of-range
/// results mean "no slot".
pub fn decode_batting_order(code: &str) -> Option<u8> {
    let raw: u32 = code.trim().parse().ok()?;
    let slot = raw / 100;
    u8::try_from(slot).ok().filter(|s| SLOTS.contains(s))
}

/// Slot counts for one hitter, folded in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineupProfile {
    /// `(slot, count)` in order of first appearance.
    counts: Vec<(u8, u32)>,
    latest_slot: Option<u8>,
    latest_game_date: Option<NaiveDate>,
    sample_size: u32,
}

impl LineupProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation. Non-qualifying observations (no slot, out of
    /// range, pitcher position) are ignored. An observation dated on or after
    /// the stored latest date becomes the latest, so equal dates favor the
    /// later record.
    pub fn observe(&mut self, obs: &BattingObservation) {
        let Some(slot) = obs.qualifying_slot() else {
            return;
        };

        match self.counts.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((slot, 1)),
        }
        self.sample_size += 1;

        match self.latest_game_date {
            Some(latest) if obs.game_date < latest => {}
            _ => {
                self.latest_game_date = Some(obs.game_date);
                self.latest_slot = Some(slot);
            }
        }
    }

    pub fn count(&self, slot: u8) -> u32 {
        self.counts
            .iter()
            .find(|(s, _)| *s == slot)
            .map_or(0, |(_, c)| *c)
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn latest_slot(&self) -> Option<u8> {
        self.latest_slot
    }

    pub fn latest_game_date(&self) -> Option<NaiveDate> {
        self.latest_game_date
    }

    /// Most frequent slot with the recency tie-break; `None` without data.
    pub fn projected_slot(&self) -> Option<u8> {
        let mut best: Option<(u8, u32)> = None;
        for &(slot, count) in &self.counts {
            best = match best {
                None => Some((slot, count)),
                Some((_, top)) if count > top => Some((slot, count)),
                Some((_, top)) if count == top && Some(slot) == self.latest_slot => {
                    Some((slot, count))
                }
                keep => keep,
            };
        }
        best.map(|(slot, _)| slot)
    }

    pub fn projection(&self) -> SlotProjection {
        SlotProjection {
            projected_slot: self.projected_slot(),
            counts: self.counts.iter().copied().collect(),
            sample_size: self.sample_size,
        }
    }
}

/// Projected slot plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotProjection {
    pub projected_slot: Option<u8>,
    pub counts: BTreeMap<u8, u32>,
    pub sample_size: u32,
}

/// Project a single hitter's slot from date-ordered observations.
pub fn project_slot<'a, I>(observations: I) -> SlotProjection
where
    I: IntoIterator<Item = &'a BattingObservation>,
{
    let mut profile = LineupProfile::new();
    for obs in observations {
        profile.observe(obs);
    }
    profile.projection()
}

/// Fold a team's date-ordered observations into one profile per hitter.
pub fn build_profiles(observations: &[BattingObservation]) -> BTreeMap<u32, LineupProfile> {
    let mut profiles: BTreeMap<u32, LineupProfile> = BTreeMap::new();
    for obs in observations {
        profiles.entry(obs.player_id).or_default().observe(obs);
    }
    profiles
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
