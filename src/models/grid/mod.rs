// TimeGrid module
// Fixed 144-slot day grid with circular timezone rotation

use serde::{Deserialize, Serialize};

use crate::models::slot::Slot;

/// Number of 10-minute slots in a 24-hour day.
pub const SLOT_COUNT: usize = 144;

/// Minutes covered by one slot.
pub const SLOT_MINUTES: i32 = 10;

/// Ordered sequence of all 144 slot states for one date.
///
/// The grid is independent of rendering; consumers read slots and the
/// view layer decides how to display them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeGrid {
    slots: Vec<Slot>,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeGrid {
    /// Creates an all-empty grid.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::Empty; SLOT_COUNT],
        }
    }

    /// Builds a grid from exactly `SLOT_COUNT` slots.
    pub fn from_slots(slots: Vec<Slot>) -> Result<Self, String> {
        if slots.len() != SLOT_COUNT {
            return Err(format!(
                "grid requires {} slots, got {}",
                SLOT_COUNT,
                slots.len()
            ));
        }
        Ok(Self { slots })
    }

    /// Returns the slot at `index`.
    ///
    /// # Panics
    /// Panics if `index >= SLOT_COUNT`.
    pub fn get(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Replaces the slot at `index`.
    ///
    /// # Panics
    /// Panics if `index >= SLOT_COUNT`.
    pub fn set(&mut self, index: usize, slot: Slot) {
        self.slots[index] = slot;
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Number of slots that are not empty.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Returns a copy with every slot circularly shifted by `shift`
    /// positions (mod 144). Total for any integer shift, positive or
    /// negative; rotating by `s` and then `-s` restores the original
    /// grid element-wise.
    pub fn rotated(&self, shift: i32) -> TimeGrid {
        let mut slots = vec![Slot::Empty; SLOT_COUNT];
        for (i, slot) in self.slots.iter().enumerate() {
            slots[shift_index(i, shift)] = slot.clone();
        }
        TimeGrid { slots }
    }
}

/// Shifts a slot coordinate by `shift` positions, wrapping at the day
/// boundary: `((i + shift) % n + n) % n`.
pub fn shift_index(index: usize, shift: i32) -> usize {
    let n = SLOT_COUNT as i32;
    (((index as i32 + shift) % n + n) % n) as usize
}
