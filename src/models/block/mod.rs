// Block module
// User-defined exclusion ranges that reject task placement

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::grid::{shift_index, SLOT_COUNT, SLOT_MINUTES};

/// A time range marked unavailable for task placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Result<Self, String> {
        if end_utc <= start_utc {
            return Err("Block end time must be after start time".to_string());
        }
        Ok(Self {
            id: id.into(),
            title: None,
            start_utc,
            end_utc,
        })
    }
}

/// Per-day blocked-slot membership in local display coordinates.
///
/// Blocked slots reject drops and cannot be drag origins, regardless of
/// what the slot currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedSlots {
    flags: Vec<bool>,
}

impl BlockedSlots {
    /// No blocked slots.
    pub fn none() -> Self {
        Self {
            flags: vec![false; SLOT_COUNT],
        }
    }

    /// Computes membership for `date` from a set of UTC blocks, quantized
    /// outward to slot boundaries, clamped to the day, then shifted into
    /// local coordinates by `offset_slots`.
    pub fn from_blocks(blocks: &[Block], date: NaiveDate, offset_slots: i32) -> Self {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let slot_min = SLOT_MINUTES as i64;
        let mut flags = vec![false; SLOT_COUNT];

        for block in blocks {
            let start_min = (block.start_utc - day_start).num_minutes();
            let end_min = (block.end_utc - day_start).num_minutes();
            let first = start_min.div_euclid(slot_min).max(0);
            let last_excl = (end_min + slot_min - 1)
                .div_euclid(slot_min)
                .min(SLOT_COUNT as i64);
            for utc_index in first..last_excl {
                flags[shift_index(utc_index as usize, offset_slots)] = true;
            }
        }
        Self { flags }
    }

    pub fn is_blocked(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// Marks or clears one slot directly; used when the embedding layer
    /// already knows the membership.
    pub fn set(&mut self, index: usize, blocked: bool) {
        if self.flags.is_empty() {
            self.flags = vec![false; SLOT_COUNT];
        }
        if index < SLOT_COUNT {
            self.flags[index] = blocked;
        }
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|b| **b).count()
    }
}
