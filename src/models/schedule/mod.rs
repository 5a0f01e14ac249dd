// Schedule record module
// Per-date snapshot of the grid plus entity placement metadata

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::grid::{shift_index, TimeGrid};
use crate::models::slot::{EntityKind, Slot};

/// Title given to entities recovered from a degraded snapshot.
pub const PLACEHOLDER_EVENT_TITLE: &str = "Untitled event";
pub const PLACEHOLDER_TASK_TITLE: &str = "Untitled task";

/// Placement metadata for one entity: an inclusive contiguous range of
/// local-time slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub start_slot: usize,
    pub end_slot: usize,
}

/// Per-kind metadata maps, keyed by entity id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMeta {
    #[serde(default)]
    pub tasks: BTreeMap<String, EntityMeta>,
    #[serde(default)]
    pub events: BTreeMap<String, EntityMeta>,
}

impl ScheduleMeta {
    pub fn for_kind(&self, kind: EntityKind) -> &BTreeMap<String, EntityMeta> {
        match kind {
            EntityKind::Task => &self.tasks,
            EntityKind::Event => &self.events,
        }
    }

    pub fn for_kind_mut(&mut self, kind: EntityKind) -> &mut BTreeMap<String, EntityMeta> {
        match kind {
            EntityKind::Task => &mut self.tasks,
            EntityKind::Event => &mut self.events,
        }
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&EntityMeta> {
        self.for_kind(kind).get(id)
    }

    /// Shifts every placement range by `shift` slots, wrapping at the day
    /// boundary. Metadata carries its own slot coordinates, so it rotates
    /// independently of the grid array.
    pub fn rotate(&mut self, shift: i32) {
        for meta in self.tasks.values_mut().chain(self.events.values_mut()) {
            meta.start_slot = shift_index(meta.start_slot, shift);
            meta.end_slot = shift_index(meta.end_slot, shift);
        }
    }
}

/// Persisted per-date snapshot: the grid and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub date: NaiveDate,
    pub grid: TimeGrid,
    #[serde(default)]
    pub meta: ScheduleMeta,
}

impl ScheduleRecord {
    pub fn new(date: NaiveDate, grid: TimeGrid, meta: ScheduleMeta) -> Self {
        Self { date, grid, meta }
    }

    /// Ensures every occupied slot has a metadata entry.
    ///
    /// Degraded offline snapshots can carry occupied slots whose entity is
    /// missing from the meta maps. This scans contiguous runs sharing an
    /// entity id and synthesizes a placeholder-titled entry for each id
    /// not already present. Returns true when anything was repaired so
    /// the caller can re-persist exactly once.
    pub fn reconstruct_missing_meta(&mut self) -> bool {
        let mut runs: Vec<(String, EntityKind, usize, usize)> = Vec::new();
        for (i, slot) in self.grid.slots().iter().enumerate() {
            if let Slot::Occupied {
                entity_id, kind, ..
            } = slot
            {
                match runs.last_mut() {
                    Some((id, k, _, end)) if id == entity_id && *k == *kind && *end + 1 == i => {
                        *end = i;
                    }
                    _ => runs.push((entity_id.clone(), *kind, i, i)),
                }
            }
        }

        let mut repaired = false;
        for (id, kind, start, end) in runs {
            let map = self.meta.for_kind_mut(kind);
            if map.contains_key(&id) {
                continue;
            }
            let title = match kind {
                EntityKind::Task => PLACEHOLDER_TASK_TITLE,
                EntityKind::Event => PLACEHOLDER_EVENT_TITLE,
            };
            map.insert(
                id.clone(),
                EntityMeta {
                    id,
                    title: title.to_string(),
                    color: None,
                    start_slot: start,
                    end_slot: end,
                },
            );
            repaired = true;
        }
        repaired
    }
}
