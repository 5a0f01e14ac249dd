// Calendar event module
// External calendar entries fetched alongside the generated schedule

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::grid::{SLOT_COUNT, SLOT_MINUTES};

/// One event from the user's external calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
}

impl CalendarEvent {
    /// Inclusive UTC slot range the event covers on `date`, quantized
    /// outward to slot boundaries and clamped to the day. `None` when the
    /// event does not touch the date at all.
    pub fn slot_range(&self, date: NaiveDate) -> Option<(usize, usize)> {
        if self.all_day {
            return Some((0, SLOT_COUNT - 1));
        }
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let slot_min = SLOT_MINUTES as i64;
        let start_min = (self.start_utc - day_start).num_minutes();
        let end_min = (self.end_utc - day_start).num_minutes();

        let first = start_min.div_euclid(slot_min).max(0);
        let last_excl = (end_min + slot_min - 1)
            .div_euclid(slot_min)
            .min(SLOT_COUNT as i64);
        if first >= last_excl {
            return None;
        }
        Some((first as usize, last_excl as usize - 1))
    }
}
