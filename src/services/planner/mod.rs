// Planner service
// Owned context object tying the grid, history, cache and view together

mod commands;

pub use commands::{MoveEntityCommand, RegenerateCommand};

use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::models::block::{Block, BlockedSlots};
use crate::models::grid::{TimeGrid, SLOT_COUNT};
use crate::models::schedule::{ScheduleMeta, ScheduleRecord};
use crate::models::slot::{EntityKind, Slot};
use crate::services::database::CacheHandle;
use crate::services::drag::{DragController, DragOrigin, DropOutcome};
use crate::services::history::{Command, CommandHistory};
use crate::services::source::{DayPlan, ScheduleSource};
use crate::services::view::{EventSource, InputEvent, ViewBinding};

/// Full-grid capture used by regenerate commands for coarse revert.
#[derive(Clone)]
pub struct GridSnapshot {
    pub date: NaiveDate,
    pub grid: TimeGrid,
    pub meta: ScheduleMeta,
}

/// Mutable scheduling state shared with commands.
///
/// Owning everything in one context (rather than module-level globals)
/// keeps instances independent, so tests can run many side by side.
pub struct PlannerState {
    pub date: NaiveDate,
    pub grid: TimeGrid,
    pub meta: ScheduleMeta,
    pub unplaced: Vec<String>,
    pub blocked: BlockedSlots,
    pub offset_slots: i32,
    pub cache: CacheHandle,
    pub source: ScheduleSource,
    pub view: Box<dyn ViewBinding>,
}

impl PlannerState {
    pub fn new(
        date: NaiveDate,
        offset_slots: i32,
        source: ScheduleSource,
        cache: CacheHandle,
        view: Box<dyn ViewBinding>,
    ) -> Self {
        Self {
            date,
            grid: TimeGrid::new(),
            meta: ScheduleMeta::default(),
            unplaced: Vec::new(),
            blocked: BlockedSlots::none(),
            offset_slots,
            cache,
            source,
            view,
        }
    }

    /// State with an in-memory cache and an unreachable backend; tests
    /// and offline tooling.
    pub fn headless(date: NaiveDate, offset_slots: i32, view: Box<dyn ViewBinding>) -> Self {
        Self::new(
            date,
            offset_slots,
            ScheduleSource::unreachable(),
            CacheHandle::in_memory(),
            view,
        )
    }

    pub fn render(&mut self) {
        self.view.render_grid(&self.grid, &self.meta);
    }

    /// Persists the current snapshot. Cache failures are logged, never
    /// fatal: the in-memory grid stays authoritative for the session.
    pub fn persist(&mut self) {
        let record = self.snapshot_record();
        match self.cache.acquire() {
            Ok(store) => {
                if let Err(err) = store.put_schedule(&record) {
                    log::warn!("cache write failed for {}: {}", self.date, err);
                }
            }
            Err(err) => log::warn!("offline cache unavailable: {}", err),
        }
    }

    pub fn snapshot_record(&self) -> ScheduleRecord {
        ScheduleRecord::new(self.date, self.grid.clone(), self.meta.clone())
    }

    pub fn capture(&self) -> GridSnapshot {
        GridSnapshot {
            date: self.date,
            grid: self.grid.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Restores a captured snapshot, clearing unplaced flags, then
    /// renders and persists.
    pub fn restore(&mut self, snapshot: GridSnapshot) {
        self.date = snapshot.date;
        self.grid = snapshot.grid;
        self.meta = snapshot.meta;
        self.unplaced.clear();
        self.render();
        self.persist();
        self.view.show_unplaced(&[]);
    }

    /// Installs a freshly loaded day plan and surfaces its leftovers.
    pub fn adopt(&mut self, plan: DayPlan) {
        self.date = plan.record.date;
        self.grid = plan.record.grid;
        self.meta = plan.record.meta;
        self.unplaced = plan.unplaced;
        self.render();
        self.view.show_unplaced(&self.unplaced);
    }

    /// Runs generation end to end: fetch or offline fallback, adopt,
    /// display. Persistence happened inside the source on success.
    pub async fn run_generation(&mut self, date: NaiveDate) -> Result<(), ScheduleError> {
        let plan = self
            .source
            .load_day(date, self.offset_slots, &mut self.cache)
            .await?;
        self.adopt(plan);
        Ok(())
    }
}

/// The scheduling core: one day grid, its history and its gesture state.
///
/// Generation requests are serialized by `&mut self`; a second request
/// cannot start until the first settles, so a stale response can never
/// overwrite a newer one through the same planner.
pub struct Planner {
    state: PlannerState,
    history: CommandHistory,
    drag: DragController,
}

impl Planner {
    pub fn new(
        date: NaiveDate,
        offset_slots: i32,
        source: ScheduleSource,
        cache: CacheHandle,
        view: Box<dyn ViewBinding>,
    ) -> Self {
        let mut planner = Self {
            state: PlannerState::new(date, offset_slots, source, cache, view),
            history: CommandHistory::new(),
            drag: DragController::new(),
        };
        planner.history.refresh_affordances(&mut planner.state);
        planner
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PlannerState {
        &mut self.state
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Generates the schedule for `date`, recording one reversible
    /// command. Nothing is recorded when generation (and its offline
    /// fallback) fails.
    pub async fn generate(&mut self, date: NaiveDate) -> Result<(), ScheduleError> {
        let previous = self.state.capture();
        self.state.run_generation(date).await?;
        self.history
            .push(Box::new(RegenerateCommand::new(date, previous)), &mut self.state);
        Ok(())
    }

    pub async fn undo(&mut self) -> Result<(), ScheduleError> {
        self.history.undo(&mut self.state).await
    }

    pub async fn redo(&mut self) -> Result<(), ScheduleError> {
        self.history.redo(&mut self.state).await
    }

    /// Pulls the external calendar feed and overlays it onto the day:
    /// events land in empty slots only, never displacing generated
    /// content, and their metadata joins the events map.
    pub async fn sync_calendar(&mut self) -> Result<(), ScheduleError> {
        let events = self
            .state
            .source
            .load_calendar(self.state.date, self.state.offset_slots)
            .await?;
        for (id, meta) in events {
            for index in slot_span(meta.start_slot, meta.end_slot) {
                if self.state.grid.get(index).is_empty() {
                    self.state.grid.set(
                        index,
                        Slot::Occupied {
                            entity_id: id.clone(),
                            kind: EntityKind::Event,
                            title: Some(meta.title.clone()),
                            color: meta.color.clone(),
                        },
                    );
                }
            }
            self.state.meta.events.insert(id, meta);
        }
        self.state.render();
        self.state.persist();
        Ok(())
    }

    /// Recomputes blocked-slot membership for the current date.
    pub fn set_blocks(&mut self, blocks: &[Block]) {
        self.state.blocked =
            BlockedSlots::from_blocks(blocks, self.state.date, self.state.offset_slots);
    }

    pub fn drag_start(&mut self, entity_id: &str, origin: DragOrigin) -> bool {
        self.drag.start(&mut self.state, entity_id, origin)
    }

    pub fn drag_over(&mut self, index: usize) -> bool {
        self.drag.over(&mut self.state, index)
    }

    pub fn drag_leave(&mut self) {
        self.drag.leave(&mut self.state);
    }

    /// Completes the active gesture. Valid targets apply and record a
    /// move command; invalid ones decline silently.
    pub async fn drop(&mut self, index: usize) -> Result<DropOutcome, ScheduleError> {
        let Some(mut command) = self.drag.drop(&mut self.state, index) else {
            return Ok(DropOutcome::Rejected);
        };
        command.apply(&mut self.state).await?;
        self.history.push(Box::new(command), &mut self.state);
        self.state.render();
        self.state.persist();
        Ok(DropOutcome::Moved)
    }

    pub fn drag_end(&mut self) {
        self.drag.end(&mut self.state);
    }

    /// Dispatches one abstract input event.
    pub async fn handle_event(&mut self, event: InputEvent) -> Result<(), ScheduleError> {
        match event {
            InputEvent::DragStart { entity_id, origin } => {
                self.drag_start(&entity_id, origin);
                Ok(())
            }
            InputEvent::DragOver { slot } => {
                self.drag_over(slot);
                Ok(())
            }
            InputEvent::DragLeave => {
                self.drag_leave();
                Ok(())
            }
            InputEvent::Drop { slot } => self.drop(slot).await.map(|_| ()),
            InputEvent::DragEnd => {
                self.drag_end();
                Ok(())
            }
            InputEvent::Undo => self.undo().await,
            InputEvent::Redo => self.redo().await,
            InputEvent::Generate { date } => self.generate(date).await,
        }
    }

    /// Drains pending events from a source, applying each in order.
    pub async fn pump(&mut self, source: &mut dyn EventSource) -> Result<(), ScheduleError> {
        while let Some(event) = source.next_event() {
            self.handle_event(event).await?;
        }
        Ok(())
    }
}

/// Slot indices of an inclusive range that may wrap past the end of the
/// day after rotation.
fn slot_span(start: usize, end: usize) -> Vec<usize> {
    if start <= end {
        (start..=end).collect()
    } else {
        (start..SLOT_COUNT).chain(0..=end).collect()
    }
}
