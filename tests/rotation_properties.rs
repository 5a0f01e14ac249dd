// Property-based tests for grid rotation and metadata reconstruction
// Random shifts and slot patterns to check the circular-shift invariants

use proptest::prelude::*;

use day_planner::models::grid::{shift_index, TimeGrid, SLOT_COUNT};
use day_planner::models::schedule::{ScheduleMeta, ScheduleRecord};
use day_planner::models::slot::{EntityKind, Slot};
use day_planner::utils::date::offset_slots;

fn grid_from_pattern(pattern: &[(usize, u8)]) -> TimeGrid {
    let mut grid = TimeGrid::new();
    for (index, code) in pattern {
        let slot = match code % 3 {
            0 => Slot::Empty,
            1 => Slot::Busy,
            _ => Slot::occupied(format!("e{}", index), EntityKind::Task),
        };
        grid.set(*index, slot);
    }
    grid
}

fn pattern_strategy() -> impl Strategy<Value = Vec<(usize, u8)>> {
    prop::collection::vec((0..SLOT_COUNT, 0..3u8), 0..40)
}

proptest! {
    /// Rotating by `s` and then `-s` restores the original grid.
    #[test]
    fn prop_rotation_round_trips(
        pattern in pattern_strategy(),
        shift in -300..300i32,
    ) {
        let grid = grid_from_pattern(&pattern);
        prop_assert_eq!(grid.rotated(shift).rotated(-shift), grid);
    }

    /// Rotation is a permutation: no slot content is created or lost.
    #[test]
    fn prop_rotation_preserves_occupancy(
        pattern in pattern_strategy(),
        shift in -300..300i32,
    ) {
        let grid = grid_from_pattern(&pattern);
        prop_assert_eq!(grid.rotated(shift).occupied_count(), grid.occupied_count());
    }

    /// Full-day rotations are the identity.
    #[test]
    fn prop_full_day_rotation_is_identity(
        pattern in pattern_strategy(),
        turns in -3..=3i32,
    ) {
        let grid = grid_from_pattern(&pattern);
        prop_assert_eq!(grid.rotated(turns * SLOT_COUNT as i32), grid);
    }

    /// Shifted coordinates always land back inside the day.
    #[test]
    fn prop_shift_index_stays_in_range(
        index in 0..SLOT_COUNT,
        shift in -10_000..10_000i32,
    ) {
        prop_assert!(shift_index(index, shift) < SLOT_COUNT);
    }

    /// Shifting forward and back is the identity on coordinates.
    #[test]
    fn prop_shift_index_round_trips(
        index in 0..SLOT_COUNT,
        shift in -10_000..10_000i32,
    ) {
        prop_assert_eq!(shift_index(shift_index(index, shift), -shift), index);
    }

    /// Whole-slot offsets convert exactly; no rounding drift.
    #[test]
    fn prop_exact_offsets_convert_exactly(slots in -144..=144i32) {
        prop_assert_eq!(offset_slots(slots * 10), slots);
    }

    /// Reconstruction converges after one pass.
    #[test]
    fn prop_reconstruction_is_idempotent(pattern in pattern_strategy()) {
        let grid = grid_from_pattern(&pattern);
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut record = ScheduleRecord::new(date, grid, ScheduleMeta::default());
        record.reconstruct_missing_meta();
        prop_assert!(!record.reconstruct_missing_meta());
    }

    /// After reconstruction, every occupied slot has a metadata entry.
    #[test]
    fn prop_reconstruction_covers_all_occupied_slots(pattern in pattern_strategy()) {
        let grid = grid_from_pattern(&pattern);
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut record = ScheduleRecord::new(date, grid, ScheduleMeta::default());
        record.reconstruct_missing_meta();

        for slot in record.grid.iter() {
            if let Slot::Occupied { entity_id, kind, .. } = slot {
                prop_assert!(record.meta.get(*kind, entity_id).is_some());
            }
        }
    }
}
