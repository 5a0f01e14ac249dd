// Offline cache service
// Versioned SQLite store for tasks, blocks and per-date schedule snapshots

mod handle;

pub use handle::CacheHandle;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ScheduleError;
use crate::models::block::Block;
use crate::models::schedule::ScheduleRecord;
use crate::models::task::Task;

/// Current cache schema version, tracked through PRAGMA user_version.
pub const SCHEMA_VERSION: i32 = 2;

/// Durable per-browser-profile store of last-known schedule snapshots
/// plus the task and block collections the side panel reads offline.
pub struct OfflineCache {
    conn: Connection,
}

impl OfflineCache {
    /// Opens (or creates) the cache at `path` and applies any pending
    /// schema upgrades. Use ":memory:" for tests.
    pub fn open(path: &str) -> Result<Self, ScheduleError> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    /// Incremental, version-aware migration.
    fn migrate(&self) -> Result<(), ScheduleError> {
        let mut version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        while version < SCHEMA_VERSION {
            match version {
                0 => {
                    // fresh install: all three collections
                    self.conn.execute_batch(
                        "CREATE TABLE IF NOT EXISTS tasks (
                            id TEXT PRIMARY KEY,
                            payload TEXT NOT NULL
                        );
                        CREATE TABLE IF NOT EXISTS blocks (
                            id TEXT PRIMARY KEY,
                            payload TEXT NOT NULL
                        );
                        CREATE TABLE IF NOT EXISTS schedule (
                            date TEXT PRIMARY KEY,
                            payload TEXT NOT NULL
                        );",
                    )?;
                }
                1 => {
                    // version 1 stores predate the schedule collection
                    self.conn.execute(
                        "CREATE TABLE IF NOT EXISTS schedule (
                            date TEXT PRIMARY KEY,
                            payload TEXT NOT NULL
                        )",
                        [],
                    )?;
                }
                _ => {}
            }
            version += 1;
            self.conn.pragma_update(None, "user_version", version)?;
        }
        Ok(())
    }

    /// Reported schema version of the open store.
    pub fn schema_version(&self) -> Result<i32, ScheduleError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Overwrites the snapshot stored for the record's date.
    pub fn put_schedule(&self, record: &ScheduleRecord) -> Result<(), ScheduleError> {
        let payload = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO schedule (date, payload) VALUES (?1, ?2)",
            params![record.date.to_string(), payload],
        )?;
        Ok(())
    }

    /// Returns the snapshot for `date`; absence is not an error.
    pub fn get_schedule(&self, date: NaiveDate) -> Result<Option<ScheduleRecord>, ScheduleError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM schedule WHERE date = ?1",
                params![date.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    pub fn put_task(&self, task: &Task) -> Result<(), ScheduleError> {
        let payload = serde_json::to_string(task)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (id, payload) VALUES (?1, ?2)",
            params![task.id, payload],
        )?;
        Ok(())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, ScheduleError> {
        let mut stmt = self.conn.prepare("SELECT payload FROM tasks ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tasks = Vec::new();
        for payload in rows {
            tasks.push(serde_json::from_str(&payload?)?);
        }
        Ok(tasks)
    }

    pub fn remove_task(&self, id: &str) -> Result<(), ScheduleError> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn put_block(&self, block: &Block) -> Result<(), ScheduleError> {
        let payload = serde_json::to_string(block)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO blocks (id, payload) VALUES (?1, ?2)",
            params![block.id, payload],
        )?;
        Ok(())
    }

    pub fn list_blocks(&self) -> Result<Vec<Block>, ScheduleError> {
        let mut stmt = self.conn.prepare("SELECT payload FROM blocks ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut blocks = Vec::new();
        for payload in rows {
            blocks.push(serde_json::from_str(&payload?)?);
        }
        Ok(blocks)
    }

    pub fn remove_block(&self, id: &str) -> Result<(), ScheduleError> {
        self.conn
            .execute("DELETE FROM blocks WHERE id = ?1", params![id])?;
        Ok(())
    }
}
