// Command history service
// Bounded undo/redo stack over reversible grid mutations

use async_trait::async_trait;

use crate::error::ScheduleError;
use crate::services::planner::PlannerState;

/// Maximum number of retained commands; the oldest are evicted first.
pub const HISTORY_LIMIT: usize = 20;

/// A reversible unit of grid mutation.
///
/// Implementations are self-contained: they capture enough state on first
/// application to exactly invert their own effect. Application is tracked
/// and settles before undo/redo return.
#[async_trait]
pub trait Command: Send {
    async fn apply(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError>;
    async fn revert(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError>;

    /// Commands that run the full render/persist pipeline themselves opt
    /// out of the history's own post-step.
    fn skips_rerender(&self) -> bool {
        false
    }
}

/// Undo/redo stack with a cursor separating applied history from redo
/// candidates: `entries[..cursor]` are undoable in reverse order,
/// `entries[cursor..]` redoable in forward order.
pub struct CommandHistory {
    entries: Vec<Box<dyn Command>>,
    cursor: usize,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Appends an already-applied command: the redo tail is discarded,
    /// the oldest entry is evicted past capacity, and the undo/redo
    /// affordances refresh.
    pub fn push(&mut self, command: Box<dyn Command>, state: &mut PlannerState) {
        self.entries.truncate(self.cursor);
        self.entries.push(command);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
        self.refresh_affordances(state);
    }

    /// Reverts the newest applied command. Silent no-op on an exhausted
    /// history. The cursor only moves once the revert has succeeded, so
    /// a failed revert leaves the command counted as applied.
    pub async fn undo(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        if !self.can_undo() {
            return Ok(());
        }
        let index = self.cursor - 1;
        let command = &mut self.entries[index];
        let skip = command.skips_rerender();
        if let Err(err) = command.revert(state).await {
            self.refresh_affordances(state);
            return Err(err);
        }
        self.cursor = index;
        self.finish_step(state, skip);
        Ok(())
    }

    /// Re-applies the next redo candidate. Silent no-op at the end. The
    /// cursor only moves once the apply has succeeded, so a failed apply
    /// keeps the command on the redo side.
    pub async fn redo(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        if !self.can_redo() {
            return Ok(());
        }
        let index = self.cursor;
        let command = &mut self.entries[index];
        let skip = command.skips_rerender();
        if let Err(err) = command.apply(state).await {
            self.refresh_affordances(state);
            return Err(err);
        }
        self.cursor = index + 1;
        self.finish_step(state, skip);
        Ok(())
    }

    pub fn refresh_affordances(&self, state: &mut PlannerState) {
        state.view.set_undo_enabled(self.can_undo());
        state.view.set_redo_enabled(self.can_redo());
    }

    fn finish_step(&self, state: &mut PlannerState, skip_rerender: bool) {
        if !skip_rerender {
            state.render();
            state.persist();
        }
        self.refresh_affordances(state);
    }
}
