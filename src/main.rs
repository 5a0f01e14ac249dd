// Day Planner
// Console entry point: generates and prints one day's schedule

use anyhow::{Context, Result};
use chrono::NaiveDate;

use day_planner::models::grid::{TimeGrid, SLOT_MINUTES};
use day_planner::models::schedule::ScheduleMeta;
use day_planner::models::slot::Slot;
use day_planner::services::database::CacheHandle;
use day_planner::services::planner::Planner;
use day_planner::services::settings::Settings;
use day_planner::services::source::{HttpBackend, ScheduleSource};
use day_planner::services::view::ViewBinding;
use day_planner::utils::date::{
    local_offset_minutes, named_tz_offset_minutes, offset_slots, parse_iso_date, today_utc,
};

/// Prints the grid as contiguous runs of identical slots.
struct ConsoleView;

impl ConsoleView {
    fn clock(index: usize) -> String {
        let minutes = index * SLOT_MINUTES as usize;
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    fn label(slot: &Slot, meta: &ScheduleMeta) -> Option<String> {
        match slot {
            Slot::Empty => None,
            Slot::Busy => Some("busy".to_string()),
            Slot::Occupied {
                entity_id,
                kind,
                title,
                ..
            } => {
                let title = meta
                    .get(*kind, entity_id)
                    .map(|m| m.title.clone())
                    .or_else(|| title.clone())
                    .unwrap_or_else(|| entity_id.clone());
                Some(title)
            }
        }
    }
}

impl ViewBinding for ConsoleView {
    fn render_grid(&mut self, grid: &TimeGrid, meta: &ScheduleMeta) {
        let mut index = 0;
        while index < grid.slots().len() {
            let Some(label) = Self::label(grid.get(index), meta) else {
                index += 1;
                continue;
            };
            let start = index;
            while index < grid.slots().len()
                && Self::label(grid.get(index), meta).as_ref() == Some(&label)
            {
                index += 1;
            }
            println!(
                "{}-{}  {}",
                Self::clock(start),
                Self::clock(index),
                label
            );
        }
    }

    fn set_undo_enabled(&mut self, _enabled: bool) {}
    fn set_redo_enabled(&mut self, _enabled: bool) {}

    fn show_unplaced(&mut self, ids: &[String]) {
        if !ids.is_empty() {
            println!("unplaced: {}", ids.join(", "));
        }
    }

    fn mark_in_transit(&mut self, _entity_id: &str, _in_transit: bool) {}
    fn set_drop_hint(&mut self, _slot: Option<usize>) {}
    fn return_to_panel(&mut self, _entity_id: &str) {}

    fn toast(&mut self, message: &str) {
        println!("{}", message);
    }
}

fn resolve_date() -> Result<NaiveDate> {
    match std::env::args().nth(1) {
        Some(arg) => parse_iso_date(&arg).with_context(|| format!("invalid date '{}'", arg)),
        None => Ok(today_utc()),
    }
}

fn resolve_offset(settings: &Settings, date: NaiveDate) -> i32 {
    let minutes = if settings.timezone.is_empty() {
        local_offset_minutes()
    } else {
        match named_tz_offset_minutes(&settings.timezone, date) {
            Some(minutes) => minutes,
            None => {
                log::warn!("unknown timezone '{}', using UTC", settings.timezone);
                0
            }
        }
    };
    offset_slots(minutes)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load().context("failed to load settings")?;
    let date = resolve_date()?;
    let offset = resolve_offset(&settings, date);
    log::info!("generating schedule for {} (offset {} slots)", date, offset);

    let backend = HttpBackend::new(&settings.base_url).context("failed to build HTTP client")?;
    let source = ScheduleSource::new(Box::new(backend), settings.algo.clone());
    let cache = CacheHandle::new(settings.cache_file().to_string_lossy().into_owned());

    let mut planner = Planner::new(date, offset, source, cache, Box::new(ConsoleView));
    planner
        .generate(date)
        .await
        .with_context(|| format!("failed to generate schedule for {}", date))?;

    // the calendar feed is best-effort; the generated day stands alone
    if let Err(err) = planner.sync_calendar().await {
        log::warn!("calendar feed unavailable: {}", err);
    }

    Ok(())
}
