// Reversible planner commands

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::models::schedule::EntityMeta;
use crate::models::slot::{EntityKind, Slot};
use crate::services::drag::DragOrigin;
use crate::services::history::Command;

use super::{GridSnapshot, PlannerState};

/// Moves one task between the side panel and/or grid slots.
///
/// The command captures the task's prior metadata on first application so
/// revert returns it either to its previous slot or to the side panel.
pub struct MoveEntityCommand {
    entity_id: String,
    origin: DragOrigin,
    target: usize,
    prior_meta: Option<EntityMeta>,
    captured: bool,
}

impl MoveEntityCommand {
    pub fn new(entity_id: String, origin: DragOrigin, target: usize) -> Self {
        Self {
            entity_id,
            origin,
            target,
            prior_meta: None,
            captured: false,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn occupied_slot(&self) -> Slot {
        Slot::Occupied {
            entity_id: self.entity_id.clone(),
            kind: EntityKind::Task,
            title: self.prior_meta.as_ref().map(|m| m.title.clone()),
            color: self.prior_meta.as_ref().and_then(|m| m.color.clone()),
        }
    }

    fn display_title(&self) -> String {
        self.prior_meta
            .as_ref()
            .map(|m| m.title.clone())
            .unwrap_or_else(|| self.entity_id.clone())
    }
}

#[async_trait]
impl Command for MoveEntityCommand {
    async fn apply(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        if !self.captured {
            self.prior_meta = state.meta.tasks.get(&self.entity_id).cloned();
            self.captured = true;
        }

        if let DragOrigin::Slot(index) = self.origin {
            state.grid.set(index, Slot::Empty);
        }
        state.grid.set(self.target, self.occupied_slot());
        state.meta.tasks.insert(
            self.entity_id.clone(),
            EntityMeta {
                id: self.entity_id.clone(),
                title: self.display_title(),
                color: self.prior_meta.as_ref().and_then(|m| m.color.clone()),
                start_slot: self.target,
                end_slot: self.target,
            },
        );
        Ok(())
    }

    async fn revert(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        state.grid.set(self.target, Slot::Empty);
        match self.origin {
            DragOrigin::Slot(index) => {
                state.grid.set(index, self.occupied_slot());
                let meta = self.prior_meta.clone().unwrap_or(EntityMeta {
                    id: self.entity_id.clone(),
                    title: self.display_title(),
                    color: None,
                    start_slot: index,
                    end_slot: index,
                });
                state.meta.tasks.insert(self.entity_id.clone(), meta);
            }
            DragOrigin::Panel => {
                // the task had no prior slot; hand it back to the panel
                state.meta.tasks.remove(&self.entity_id);
                state.view.return_to_panel(&self.entity_id);
            }
        }
        Ok(())
    }
}

/// The generate action as a command: apply re-runs the full generation
/// pipeline for the date, revert restores the previously captured grid
/// snapshot (not a diff) and clears the unplaced flags.
pub struct RegenerateCommand {
    date: NaiveDate,
    previous: GridSnapshot,
}

impl RegenerateCommand {
    pub fn new(date: NaiveDate, previous: GridSnapshot) -> Self {
        Self { date, previous }
    }
}

#[async_trait]
impl Command for RegenerateCommand {
    async fn apply(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        state.run_generation(self.date).await
    }

    async fn revert(&mut self, state: &mut PlannerState) -> Result<(), ScheduleError> {
        state.restore(self.previous.clone());
        Ok(())
    }

    // both paths render and persist through the pipeline themselves
    fn skips_rerender(&self) -> bool {
        true
    }
}
