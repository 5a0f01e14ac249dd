// Task module
// Side-panel task payload mirroring the backend task resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::grid::SLOT_MINUTES;

/// Scheduling priority; A-tasks are placed before everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    A,
    #[default]
    B,
}

/// A task the backend may place into the day grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Duration rounded to slot granularity, in minutes.
    pub duration_min: u32,
    /// Duration as the user entered it, in minutes.
    pub duration_raw_min: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_start_utc: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a task with the raw duration rounded up to slot granularity.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        duration_raw_min: u32,
    ) -> Result<Self, String> {
        let slot_min = SLOT_MINUTES as u32;
        let duration_min = duration_raw_min.div_ceil(slot_min) * slot_min;
        let task = Self {
            id: id.into(),
            title: title.into(),
            category: None,
            duration_min,
            duration_raw_min,
            priority: Priority::default(),
            earliest_start_utc: None,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.duration_raw_min == 0 {
            return Err("Task duration must be positive".to_string());
        }
        if self.duration_min % SLOT_MINUTES as u32 != 0 {
            return Err(format!(
                "Task duration must be a multiple of {} minutes",
                SLOT_MINUTES
            ));
        }
        Ok(())
    }

    /// Number of grid slots the task occupies.
    pub fn slots_needed(&self) -> usize {
        (self.duration_min / SLOT_MINUTES as u32) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rounds_duration_up_to_slot_granularity() {
        let task = Task::new("t1", "Write report", 25).unwrap();
        assert_eq!(task.duration_min, 30);
        assert_eq!(task.duration_raw_min, 25);
        assert_eq!(task.slots_needed(), 3);
    }

    #[test]
    fn test_new_rejects_empty_title() {
        assert!(Task::new("t1", "   ", 30).is_err());
    }

    #[test]
    fn test_new_rejects_zero_duration() {
        assert!(Task::new("t1", "Quick", 0).is_err());
    }

    #[test]
    fn test_priority_defaults_to_b() {
        let task = Task::new("t1", "Write report", 30).unwrap();
        assert_eq!(task.priority, Priority::B);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut task = Task::new("t1", "Write report", 25).unwrap();
        task.priority = Priority::A;
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": "t9",
            "title": "Review PR",
            "category": "work",
            "duration_min": 20,
            "duration_raw_min": 15,
            "priority": "A"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::A);
        assert_eq!(task.slots_needed(), 2);
        assert!(task.earliest_start_utc.is_none());
    }
}
