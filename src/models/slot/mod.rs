// Slot module
// State of one 10-minute interval of the day grid

use serde::{Deserialize, Serialize};

/// Kind of entity occupying a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Event,
}

/// State of a single grid slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Slot {
    /// Nothing scheduled.
    Empty,
    /// Marked unavailable without a concrete entity (calendar busy time).
    Busy,
    /// Occupied by a task or an event.
    Occupied {
        entity_id: String,
        kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Empty
    }
}

impl Slot {
    /// Creates an occupied slot without display metadata.
    pub fn occupied(entity_id: impl Into<String>, kind: EntityKind) -> Self {
        Slot::Occupied {
            entity_id: entity_id.into(),
            kind,
            title: None,
            color: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Slot::Busy)
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    /// Id of the occupying entity, if any.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Slot::Occupied { entity_id, .. } => Some(entity_id),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Slot::Occupied { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
