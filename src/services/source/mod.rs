// Schedule source service
// Network-first day loading with offline-cache fallback

mod backend;

pub use backend::{GenerateResponse, HttpBackend, RawCell, RawSlot, ScheduleBackend};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::models::grid::{shift_index, TimeGrid, SLOT_COUNT};
use crate::models::schedule::{EntityMeta, ScheduleMeta, ScheduleRecord};
use crate::models::slot::{EntityKind, Slot};
use crate::services::database::CacheHandle;

/// A day's schedule ready for display, plus the tasks the backend could
/// not place.
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub record: ScheduleRecord,
    pub unplaced: Vec<String>,
}

/// Produces a day plan for a date: generation RPC first, offline cache
/// on network failure.
pub struct ScheduleSource {
    backend: Box<dyn ScheduleBackend>,
    algo: String,
}

impl ScheduleSource {
    pub fn new(backend: Box<dyn ScheduleBackend>, algo: impl Into<String>) -> Self {
        Self {
            backend,
            algo: algo.into(),
        }
    }

    /// Source whose backend is never reachable. Headless and test use:
    /// every load falls through to the offline cache.
    pub fn unreachable() -> Self {
        Self::new(Box::new(UnreachableBackend), "greedy")
    }

    /// Loads the plan for `date`. `offset_slots` rotates the backend's
    /// UTC-anchored grid into local display coordinates; cached records
    /// are stored already rotated, so the fallback path applies none.
    ///
    /// Repeated calls for the same date with unchanged backend state
    /// return equal grids.
    pub async fn load_day(
        &self,
        date: NaiveDate,
        offset_slots: i32,
        cache: &mut CacheHandle,
    ) -> Result<DayPlan, ScheduleError> {
        match self.backend.generate(date, &self.algo).await {
            Ok(raw) => {
                let (mut record, unplaced) = decode_response(date, raw)?;
                record.grid = record.grid.rotated(offset_slots);
                record.meta.rotate(offset_slots);

                // cache write failures never block the foreground path
                match cache.acquire() {
                    Ok(store) => {
                        if let Err(err) = store.put_schedule(&record) {
                            log::warn!("cache write failed for {}: {}", date, err);
                        }
                    }
                    Err(err) => log::warn!("offline cache unavailable: {}", err),
                }
                Ok(DayPlan { record, unplaced })
            }
            Err(err) if err.allows_offline_fallback() => {
                log::warn!("generation failed for {}, trying offline cache: {}", date, err);
                match self.load_cached(date, cache) {
                    Ok(Some(plan)) => Ok(plan),
                    Ok(None) => Err(err),
                    Err(cache_err) => {
                        log::warn!("offline cache unavailable for {}: {}", date, cache_err);
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Reads the cached snapshot, repairing missing metadata. The repair
    /// is re-persisted so it is not repeated on the next fallback.
    fn load_cached(
        &self,
        date: NaiveDate,
        cache: &mut CacheHandle,
    ) -> Result<Option<DayPlan>, ScheduleError> {
        let store = cache.acquire()?;
        let Some(mut record) = store.get_schedule(date)? else {
            return Ok(None);
        };
        if record.reconstruct_missing_meta() {
            if let Err(err) = store.put_schedule(&record) {
                log::warn!("failed to re-persist repaired schedule for {}: {}", date, err);
            }
        }
        Ok(Some(DayPlan {
            record,
            unplaced: Vec::new(),
        }))
    }

    /// Fetches the external calendar feed for `date` and maps each event
    /// onto the grid as an inclusive slot range in local coordinates.
    /// Events that do not touch the date are dropped.
    pub async fn load_calendar(
        &self,
        date: NaiveDate,
        offset_slots: i32,
    ) -> Result<BTreeMap<String, EntityMeta>, ScheduleError> {
        let events = self.backend.fetch_calendar(date).await?;
        let mut mapped = BTreeMap::new();
        for event in events {
            let Some((start, end)) = event.slot_range(date) else {
                continue;
            };
            mapped.insert(
                event.id.clone(),
                EntityMeta {
                    id: event.id,
                    title: event.title,
                    color: None,
                    start_slot: shift_index(start, offset_slots),
                    end_slot: shift_index(end, offset_slots),
                },
            );
        }
        Ok(mapped)
    }
}

struct UnreachableBackend;

#[async_trait]
impl ScheduleBackend for UnreachableBackend {
    async fn generate(
        &self,
        _date: NaiveDate,
        _algo: &str,
    ) -> Result<GenerateResponse, ScheduleError> {
        Err(ScheduleError::Http { status: 503 })
    }
}

/// Scratch slot state used while overlaying metadata.
enum DecodedSlot {
    Value(Slot),
    /// A task-occupied slot the backend reported without an entity id.
    UntaggedTask,
}

/// Decodes the canonical response into a UTC-anchored record.
///
/// Fails closed: no slot array, a wrong slot count, unknown slot codes or
/// out-of-range metadata are all contract violations.
pub(crate) fn decode_response(
    date: NaiveDate,
    raw: GenerateResponse,
) -> Result<(ScheduleRecord, Vec<String>), ScheduleError> {
    let slots = raw
        .slots
        .ok_or_else(|| ScheduleError::MalformedGrid("response carries no slot array".to_string()))?;
    if slots.len() != SLOT_COUNT {
        return Err(ScheduleError::MalformedGrid(format!(
            "expected {} slots, got {}",
            SLOT_COUNT,
            slots.len()
        )));
    }
    if let Some(reported) = raw.date {
        if reported != date {
            log::debug!("backend reported {} for a {} request", reported, date);
        }
    }

    let mut scratch = Vec::with_capacity(SLOT_COUNT);
    for (i, raw_slot) in slots.into_iter().enumerate() {
        let decoded = match raw_slot {
            RawSlot::Code(0) => DecodedSlot::Value(Slot::Empty),
            RawSlot::Code(1) => DecodedSlot::Value(Slot::Busy),
            RawSlot::Code(2) => DecodedSlot::UntaggedTask,
            RawSlot::Code(code) => {
                return Err(ScheduleError::MalformedGrid(format!(
                    "unknown slot code {} at index {}",
                    code, i
                )))
            }
            RawSlot::Cell(cell) => decode_cell(cell),
        };
        scratch.push(decoded);
    }

    let mut grid = TimeGrid::new();
    let mut untagged = [false; SLOT_COUNT];
    for (i, decoded) in scratch.into_iter().enumerate() {
        match decoded {
            DecodedSlot::Value(slot) => grid.set(i, slot),
            DecodedSlot::UntaggedTask => untagged[i] = true,
        }
    }

    let mut meta = ScheduleMeta {
        tasks: raw.tasks,
        events: raw.events,
    };
    for (id, entry) in meta.tasks.iter_mut().chain(meta.events.iter_mut()) {
        if entry.id.is_empty() {
            entry.id = id.clone();
        }
    }

    // overlay metadata ranges onto the grid
    for (kind, entries) in [
        (EntityKind::Task, &meta.tasks),
        (EntityKind::Event, &meta.events),
    ] {
        for entry in entries.values() {
            if entry.start_slot > entry.end_slot || entry.end_slot >= SLOT_COUNT {
                return Err(ScheduleError::MalformedGrid(format!(
                    "metadata range {}..={} out of bounds for entity {}",
                    entry.start_slot, entry.end_slot, entry.id
                )));
            }
            for i in entry.start_slot..=entry.end_slot {
                grid.set(
                    i,
                    Slot::Occupied {
                        entity_id: entry.id.clone(),
                        kind,
                        title: Some(entry.title.clone()),
                        color: entry.color.clone(),
                    },
                );
                untagged[i] = false;
            }
        }
    }

    // remaining untagged runs get synthetic ids; the reconstruction pass
    // below registers placeholder metadata for them
    let mut i = 0;
    while i < SLOT_COUNT {
        if !untagged[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < SLOT_COUNT && untagged[i] {
            i += 1;
        }
        let id = format!("task:{}", start);
        for j in start..i {
            grid.set(j, Slot::occupied(id.clone(), EntityKind::Task));
        }
    }

    let mut record = ScheduleRecord::new(date, grid, meta);
    record.reconstruct_missing_meta();
    Ok((record, raw.unplaced))
}

fn decode_cell(cell: RawCell) -> DecodedSlot {
    if let Some(id) = cell.task_id {
        DecodedSlot::Value(Slot::occupied(id, EntityKind::Task))
    } else if let Some(id) = cell.event_id {
        DecodedSlot::Value(Slot::occupied(id, EntityKind::Event))
    } else if cell.task {
        DecodedSlot::UntaggedTask
    } else if cell.busy {
        DecodedSlot::Value(Slot::Busy)
    } else {
        DecodedSlot::Value(Slot::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::CalendarEvent;
    use crate::models::schedule::{EntityMeta, PLACEHOLDER_TASK_TITLE};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn code_slots(codes: &[(usize, u8)]) -> Vec<RawSlot> {
        let mut slots: Vec<RawSlot> = (0..SLOT_COUNT).map(|_| RawSlot::Code(0)).collect();
        for (i, code) in codes {
            slots[*i] = RawSlot::Code(*code);
        }
        slots
    }

    fn response(slots: Vec<RawSlot>) -> GenerateResponse {
        GenerateResponse {
            date: Some(date()),
            slots: Some(slots),
            unplaced: Vec::new(),
            tasks: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }

    /// Scripted backend: either a canned response or a scripted failure.
    struct FakeBackend {
        result: Box<dyn Fn() -> Result<GenerateResponse, ScheduleError> + Send + Sync>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        fn ok(slots: Vec<RawSlot>) -> Self {
            Self::with(move || Ok(response(slots.clone())))
        }

        fn failing(status: u16) -> Self {
            Self::with(move || Err(ScheduleError::Http { status }))
        }

        fn with(
            result: impl Fn() -> Result<GenerateResponse, ScheduleError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                result: Box::new(result),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ScheduleBackend for FakeBackend {
        async fn generate(
            &self,
            _date: NaiveDate,
            _algo: &str,
        ) -> Result<GenerateResponse, ScheduleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    /// Backend with a calendar feed but no working generator.
    struct CalendarBackend {
        events: Vec<CalendarEvent>,
    }

    #[async_trait]
    impl ScheduleBackend for CalendarBackend {
        async fn generate(
            &self,
            _date: NaiveDate,
            _algo: &str,
        ) -> Result<GenerateResponse, ScheduleError> {
            Err(ScheduleError::Http { status: 503 })
        }

        async fn fetch_calendar(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<CalendarEvent>, ScheduleError> {
            Ok(self.events.clone())
        }
    }

    #[tokio::test]
    async fn test_load_calendar_maps_and_rotates_events() {
        let nine = date().and_hms_opt(9, 0, 0).unwrap().and_utc();
        let ten = date().and_hms_opt(10, 0, 0).unwrap().and_utc();
        let tomorrow = date().succ_opt().unwrap();
        let backend = CalendarBackend {
            events: vec![
                CalendarEvent {
                    id: "ev1".to_string(),
                    title: "Standup".to_string(),
                    start_utc: nine,
                    end_utc: ten,
                    all_day: false,
                },
                CalendarEvent {
                    id: "ev2".to_string(),
                    title: "Elsewhere".to_string(),
                    start_utc: tomorrow.and_hms_opt(9, 0, 0).unwrap().and_utc(),
                    end_utc: tomorrow.and_hms_opt(10, 0, 0).unwrap().and_utc(),
                    all_day: false,
                },
            ],
        };
        let source = ScheduleSource::new(Box::new(backend), "greedy");

        let mapped = source.load_calendar(date(), 54).await.unwrap();
        assert_eq!(mapped.len(), 1);
        let ev = &mapped["ev1"];
        assert_eq!(ev.title, "Standup");
        assert_eq!(ev.start_slot, 108);
        assert_eq!(ev.end_slot, 113);
    }

    #[tokio::test]
    async fn test_load_calendar_without_feed_is_empty() {
        let source = ScheduleSource::new(
            Box::new(FakeBackend::ok(code_slots(&[]))),
            "greedy",
        );
        assert!(source.load_calendar(date(), 0).await.unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_missing_slot_array() {
        let mut raw = response(Vec::new());
        raw.slots = None;
        assert!(matches!(
            decode_response(date(), raw),
            Err(ScheduleError::MalformedGrid(_))
        ));
    }

    #[test]
    fn test_decode_rejects_short_grid() {
        let raw = response(vec![RawSlot::Code(0); 10]);
        assert!(matches!(
            decode_response(date(), raw),
            Err(ScheduleError::MalformedGrid(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let raw = response(code_slots(&[(3, 7)]));
        assert!(matches!(
            decode_response(date(), raw),
            Err(ScheduleError::MalformedGrid(_))
        ));
    }

    #[test]
    fn test_decode_busy_and_untagged_task_codes() {
        let raw = response(code_slots(&[(0, 1), (1, 2)]));
        let (record, _) = decode_response(date(), raw).unwrap();

        assert!(record.grid.get(0).is_busy());
        assert!(record.grid.get(1).is_occupied());
        // the untagged run received placeholder metadata
        let id = record.grid.get(1).entity_id().unwrap().to_string();
        let meta = record.meta.get(EntityKind::Task, &id).unwrap();
        assert_eq!(meta.title, PLACEHOLDER_TASK_TITLE);
    }

    #[test]
    fn test_decode_overlays_metadata_ranges() {
        let mut raw = response(code_slots(&[(10, 2), (11, 2), (12, 2)]));
        raw.tasks.insert(
            "t1".to_string(),
            EntityMeta {
                id: String::new(), // id backfilled from the map key
                title: "Report".to_string(),
                color: Some("#00ff00".to_string()),
                start_slot: 10,
                end_slot: 12,
            },
        );
        let (record, _) = decode_response(date(), raw).unwrap();

        for i in 10..=12 {
            assert_eq!(record.grid.get(i).entity_id(), Some("t1"));
        }
        assert_eq!(record.meta.tasks["t1"].id, "t1");
    }

    #[test]
    fn test_decode_rejects_out_of_range_metadata() {
        let mut raw = response(code_slots(&[]));
        raw.events.insert(
            "ev1".to_string(),
            EntityMeta {
                id: "ev1".to_string(),
                title: "Late".to_string(),
                color: None,
                start_slot: 140,
                end_slot: 150,
            },
        );
        assert!(matches!(
            decode_response(date(), raw),
            Err(ScheduleError::MalformedGrid(_))
        ));
    }

    #[tokio::test]
    async fn test_load_day_rotates_and_persists() {
        let source = ScheduleSource::new(
            Box::new(FakeBackend::ok(code_slots(&[(0, 1)]))),
            "greedy",
        );
        let mut cache = CacheHandle::in_memory();

        let plan = source.load_day(date(), 54, &mut cache).await.unwrap();
        assert!(plan.record.grid.get(54).is_busy());
        assert!(plan.record.grid.get(0).is_empty());

        let cached = cache
            .acquire()
            .unwrap()
            .get_schedule(date())
            .unwrap()
            .unwrap();
        assert_eq!(cached, plan.record);
    }

    #[tokio::test]
    async fn test_load_day_is_idempotent() {
        let source = ScheduleSource::new(
            Box::new(FakeBackend::ok(code_slots(&[(3, 1), (4, 2)]))),
            "greedy",
        );
        let mut cache = CacheHandle::in_memory();

        let first = source.load_day(date(), 0, &mut cache).await.unwrap();
        let second = source.load_day(date(), 0, &mut cache).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_cache() {
        let mut cache = CacheHandle::in_memory();
        let mut grid = TimeGrid::new();
        for i in 54..60 {
            grid.set(i, Slot::occupied("ev1", EntityKind::Event));
        }
        let cached = ScheduleRecord::new(date(), grid, ScheduleMeta::default());
        cache.acquire().unwrap().put_schedule(&cached).unwrap();

        let source = ScheduleSource::new(Box::new(FakeBackend::failing(503)), "greedy");
        let plan = source.load_day(date(), 0, &mut cache).await.unwrap();

        assert_eq!(plan.record.grid, cached.grid);
        assert!(plan.unplaced.is_empty());
        // metadata was reconstructed before rendering
        let ev = plan.record.meta.get(EntityKind::Event, "ev1").unwrap();
        assert_eq!(ev.start_slot, 54);
        assert_eq!(ev.end_slot, 59);
    }

    #[tokio::test]
    async fn test_fallback_repair_is_persisted_once() {
        let mut cache = CacheHandle::in_memory();
        let mut grid = TimeGrid::new();
        grid.set(10, Slot::occupied("ev1", EntityKind::Event));
        cache
            .acquire()
            .unwrap()
            .put_schedule(&ScheduleRecord::new(date(), grid, ScheduleMeta::default()))
            .unwrap();

        let source = ScheduleSource::new(Box::new(FakeBackend::failing(500)), "greedy");
        source.load_day(date(), 0, &mut cache).await.unwrap();

        // the repaired metadata is now durable
        let stored = cache
            .acquire()
            .unwrap()
            .get_schedule(date())
            .unwrap()
            .unwrap();
        assert!(stored.meta.events.contains_key("ev1"));
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_propagates() {
        let source = ScheduleSource::new(Box::new(FakeBackend::failing(502)), "greedy");
        let mut cache = CacheHandle::in_memory();

        let err = source.load_day(date(), 0, &mut cache).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Http { status: 502 }));
    }

    #[tokio::test]
    async fn test_malformed_grid_does_not_fall_back() {
        let mut cache = CacheHandle::in_memory();
        cache
            .acquire()
            .unwrap()
            .put_schedule(&ScheduleRecord::new(
                date(),
                TimeGrid::new(),
                ScheduleMeta::default(),
            ))
            .unwrap();

        let backend = FakeBackend::with(|| {
            let mut raw = response(Vec::new());
            raw.slots = None;
            Ok(raw)
        });
        let source = ScheduleSource::new(Box::new(backend), "greedy");

        let err = source.load_day(date(), 0, &mut cache).await.unwrap_err();
        assert!(matches!(err, ScheduleError::MalformedGrid(_)));
    }
}
