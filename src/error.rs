// Error kinds shared across the scheduling core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Transport-level failure talking to the backend.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status other than 401.
    #[error("schedule request failed with HTTP status {status}")]
    Http { status: u16 },

    /// Backend answered 401. The embedding UI decides whether to redirect;
    /// the grid logic never sees this as a recoverable condition.
    #[error("schedule backend rejected the session (401)")]
    Unauthorized,

    /// Response shape did not match the generation contract. Not retried
    /// and never falls back to the cache.
    #[error("malformed grid response: {0}")]
    MalformedGrid(String),

    /// Local persistence failure. Logged and swallowed on the write path;
    /// the in-memory grid stays authoritative for the session.
    #[error("offline cache error: {0}")]
    Cache(String),
}

impl ScheduleError {
    /// Whether the offline-cache fallback applies to this failure.
    pub fn allows_offline_fallback(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. })
    }
}

impl From<rusqlite::Error> for ScheduleError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_applies_to_http_failures() {
        assert!(ScheduleError::Http { status: 503 }.allows_offline_fallback());
    }

    #[test]
    fn test_fallback_skips_contract_violations() {
        assert!(!ScheduleError::MalformedGrid("no slots".into()).allows_offline_fallback());
        assert!(!ScheduleError::Unauthorized.allows_offline_fallback());
        assert!(!ScheduleError::Cache("disk full".into()).allows_offline_fallback());
    }

    #[test]
    fn test_cache_error_from_rusqlite() {
        let err: ScheduleError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ScheduleError::Cache(_)));
    }
}
