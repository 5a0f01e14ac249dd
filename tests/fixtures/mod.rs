// Test fixtures - reusable test data
// Scripted backends and canned responses shared across test files

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use day_planner::error::ScheduleError;
use day_planner::models::grid::SLOT_COUNT;
use day_planner::models::schedule::EntityMeta;
use day_planner::services::source::{GenerateResponse, RawSlot, ScheduleBackend};

pub fn jan_1_2025() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Full-day slot array of code 0, with the given overrides.
pub fn code_slots(entries: &[(usize, u8)]) -> Vec<RawSlot> {
    let mut slots: Vec<RawSlot> = (0..SLOT_COUNT).map(|_| RawSlot::Code(0)).collect();
    for (index, code) in entries {
        slots[*index] = RawSlot::Code(*code);
    }
    slots
}

pub fn entity_meta(id: &str, title: &str, start: usize, end: usize) -> EntityMeta {
    EntityMeta {
        id: id.to_string(),
        title: title.to_string(),
        color: None,
        start_slot: start,
        end_slot: end,
    }
}

pub fn response(date: NaiveDate, slots: Vec<RawSlot>) -> GenerateResponse {
    GenerateResponse {
        date: Some(date),
        slots: Some(slots),
        unplaced: Vec::new(),
        tasks: BTreeMap::new(),
        events: BTreeMap::new(),
    }
}

/// Backend replaying a script of responses in order; once the script is
/// exhausted every further call fails like an unreachable server.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<GenerateResponse, ScheduleError>>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<GenerateResponse, ScheduleError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub fn once(response: GenerateResponse) -> Self {
        Self::new(vec![Ok(response)])
    }

    pub fn offline() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ScheduleBackend for ScriptedBackend {
    async fn generate(
        &self,
        _date: NaiveDate,
        _algo: &str,
    ) -> Result<GenerateResponse, ScheduleError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ScheduleError::Http { status: 503 }))
    }
}
