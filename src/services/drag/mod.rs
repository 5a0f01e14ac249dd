// Drag controller service
// Translates pointer gestures into reversible grid move commands

use serde::{Deserialize, Serialize};

use crate::models::grid::SLOT_COUNT;
use crate::services::planner::{MoveEntityCommand, PlannerState};

/// Where a drag gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragOrigin {
    /// The unplaced-task side panel.
    Panel,
    /// An occupied grid slot.
    Slot(usize),
}

/// Outcome of a drop attempt. Rejection is a no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DragPhase {
    Idle,
    Dragging {
        entity_id: String,
        origin: DragOrigin,
    },
    /// A move command has been handed out; the gesture is spent until
    /// the pointer is released.
    Dropped { entity_id: String },
}

/// Per-gesture state machine: Idle → Dragging → dropped or cancelled.
#[derive(Debug)]
pub struct DragController {
    phase: DragPhase,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Begins a gesture. Blocked slots cannot be drag origins: an entity
    /// shown inside one (stale state) cannot be picked up.
    pub fn start(&mut self, state: &mut PlannerState, entity_id: &str, origin: DragOrigin) -> bool {
        if let DragOrigin::Slot(index) = origin {
            if state.blocked.is_blocked(index) {
                return false;
            }
        }
        self.phase = DragPhase::Dragging {
            entity_id: entity_id.to_string(),
            origin,
        };
        state.view.mark_in_transit(entity_id, true);
        true
    }

    /// Reports whether `index` would accept the current drag and updates
    /// the hover affordance to match.
    pub fn over(&mut self, state: &mut PlannerState, index: usize) -> bool {
        if !self.is_dragging() {
            return false;
        }
        let droppable = Self::target_accepts(state, index);
        state.view.set_drop_hint(droppable.then_some(index));
        droppable
    }

    pub fn leave(&mut self, state: &mut PlannerState) {
        state.view.set_drop_hint(None);
    }

    /// Completes the gesture over `index`. A valid target yields the move
    /// command to apply and record and spends the gesture, so at most one
    /// move per drag can mutate the grid; occupied or blocked targets
    /// yield nothing, whatever the hover affordance suggested earlier.
    pub fn drop(&mut self, state: &mut PlannerState, index: usize) -> Option<MoveEntityCommand> {
        let DragPhase::Dragging { entity_id, origin } = self.phase.clone() else {
            return None;
        };
        if !Self::target_accepts(state, index) {
            return None;
        }
        state.view.set_drop_hint(None);
        self.phase = DragPhase::Dropped {
            entity_id: entity_id.clone(),
        };
        Some(MoveEntityCommand::new(entity_id, origin, index))
    }

    /// Ends the gesture, clearing transient visuals whatever the outcome.
    pub fn end(&mut self, state: &mut PlannerState) {
        match &self.phase {
            DragPhase::Dragging { entity_id, .. } | DragPhase::Dropped { entity_id } => {
                state.view.mark_in_transit(entity_id, false);
            }
            DragPhase::Idle => {}
        }
        state.view.set_drop_hint(None);
        self.phase = DragPhase::Idle;
    }

    fn target_accepts(state: &PlannerState, index: usize) -> bool {
        index < SLOT_COUNT && state.grid.get(index).is_empty() && !state.blocked.is_blocked(index)
    }
}
