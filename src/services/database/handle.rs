// Once-initialized handle to the offline cache
// All callers share one connection; opening happens at most once

use super::OfflineCache;
use crate::error::ScheduleError;

/// Lifecycle of the shared cache connection.
enum CacheState {
    Uninitialized,
    Initializing,
    Ready(OfflineCache),
    Failed(String),
}

/// Memoizing resource handle for the offline cache.
///
/// `acquire` opens and migrates the store on first use and then hands out
/// the same connection. Both success and failure are memoized, so a store
/// that failed to open is not retried within the session.
pub struct CacheHandle {
    path: String,
    state: CacheState,
}

impl CacheHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: CacheState::Uninitialized,
        }
    }

    /// In-memory store, one per handle. Test and headless use.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, CacheState::Ready(_))
    }

    /// Opens the store on first use and returns the shared connection.
    pub fn acquire(&mut self) -> Result<&OfflineCache, ScheduleError> {
        if matches!(self.state, CacheState::Uninitialized) {
            self.state = CacheState::Initializing;
            match OfflineCache::open(&self.path) {
                Ok(cache) => self.state = CacheState::Ready(cache),
                Err(err) => {
                    log::warn!("offline cache failed to open at {}: {}", self.path, err);
                    self.state = CacheState::Failed(err.to_string());
                }
            }
        }

        match &self.state {
            CacheState::Ready(cache) => Ok(cache),
            CacheState::Failed(message) => Err(ScheduleError::Cache(message.clone())),
            CacheState::Uninitialized | CacheState::Initializing => Err(ScheduleError::Cache(
                "cache initialization did not complete".to_string(),
            )),
        }
    }
}
