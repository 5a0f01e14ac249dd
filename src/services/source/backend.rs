// Schedule backend transport
// HTTP client for the server-side generation RPC

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::ScheduleError;
use crate::models::event::CalendarEvent;
use crate::models::schedule::EntityMeta;

/// Raw generation response in the canonical wire shape.
///
/// The canonical key for the grid is `slots`; deployed backends briefly
/// shipped it under `grid`, which is still accepted as an alias. Payloads
/// carrying neither fail closed during decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "grid")]
    pub slots: Option<Vec<RawSlot>>,
    #[serde(default)]
    pub unplaced: Vec<String>,
    #[serde(default)]
    pub tasks: BTreeMap<String, EntityMeta>,
    #[serde(default)]
    pub events: BTreeMap<String, EntityMeta>,
}

/// One slot as reported by the backend: a 0/1/2 code or a cell object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSlot {
    Code(u8),
    Cell(RawCell),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub busy: bool,
    #[serde(default)]
    pub task: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

/// Entry points into the server side: the scheduling algorithm plus the
/// user's external calendar feed.
#[async_trait]
pub trait ScheduleBackend: Send + Sync {
    async fn generate(
        &self,
        date: NaiveDate,
        algo: &str,
    ) -> Result<GenerateResponse, ScheduleError>;

    /// Calendar events overlapping `date`. Backends without a calendar
    /// feed report none.
    async fn fetch_calendar(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, ScheduleError> {
        Ok(Vec::new())
    }
}

/// reqwest-backed implementation talking to the Flask API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ScheduleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ScheduleBackend for HttpBackend {
    async fn generate(
        &self,
        date: NaiveDate,
        algo: &str,
    ) -> Result<GenerateResponse, ScheduleError> {
        let url = format!(
            "{}/api/schedule/generate?date={}&algo={}",
            self.base_url, date, algo
        );
        let response = self.client.post(&url).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ScheduleError::Unauthorized),
            status if !status.is_success() => Err(ScheduleError::Http {
                status: status.as_u16(),
            }),
            _ => response
                .json::<GenerateResponse>()
                .await
                .map_err(|err| ScheduleError::MalformedGrid(err.to_string())),
        }
    }

    async fn fetch_calendar(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, ScheduleError> {
        let url = format!("{}/api/calendar?date={}", self.base_url, date);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ScheduleError::Unauthorized),
            status if !status.is_success() => Err(ScheduleError::Http {
                status: status.as_u16(),
            }),
            _ => response
                .json::<Vec<CalendarEvent>>()
                .await
                .map_err(|err| ScheduleError::MalformedGrid(err.to_string())),
        }
    }
}
