//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Key-value store for timer state and settings
//! - Completed phases (session history and statistics)
//! - Pending phase-end alerts (see `notification_queue`)

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::kv::PersistenceStore;
use crate::error::StorageError;
use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub phase: Phase,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Local calendar day the phase completed on.
    pub day: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_focus_min: u64,
    pub total_break_min: u64,
    pub today_sessions: u64,
    pub today_focus_min: u64,
}

/// SQLite database backing the CLI.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                phase         TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                started_at    TEXT NOT NULL,
                completed_at  TEXT NOT NULL,
                day           TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                fire_at INTEGER NOT NULL,
                title   TEXT NOT NULL,
                body    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_day_phase ON sessions(day, phase);
            CREATE INDEX IF NOT EXISTS idx_notifications_fire_at ON notifications(fire_at);",
        )?;
        Ok(())
    }

    /// Record a completed phase.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        phase: Phase,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        day: NaiveDate,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (phase, duration_secs, started_at, completed_at, day)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                phase.as_str(),
                duration_secs,
                started_at.to_rfc3339(),
                completed_at.to_rfc3339(),
                day.format("%Y-%m-%d").to_string(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent completed phases, newest first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phase, duration_secs, started_at, completed_at, day
             FROM sessions
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, phase, duration_secs, started, completed, day) = row?;
            let parsed = (
                Phase::parse(&phase),
                parse_utc(&started),
                parse_utc(&completed),
                NaiveDate::parse_from_str(&day, "%Y-%m-%d").ok(),
            );
            // Rows written by something else are skipped rather than failing the listing.
            if let (Some(phase), Some(started_at), Some(completed_at), Some(day)) = parsed {
                out.push(SessionRecord {
                    id,
                    phase,
                    duration_secs,
                    started_at,
                    completed_at,
                    day,
                });
            }
        }
        Ok(out)
    }

    /// Distinct days with at least one completed focus phase, newest first.
    pub fn focus_days(&self) -> Result<Vec<NaiveDate>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT day FROM sessions WHERE phase = 'focus' ORDER BY day DESC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut days = Vec::new();
        for row in rows {
            if let Ok(day) = NaiveDate::parse_from_str(&row?, "%Y-%m-%d") {
                days.push(day);
            }
        }
        Ok(days)
    }

    pub fn stats(&self, today: NaiveDate) -> Result<Stats, StorageError> {
        let today = today.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT phase,
                    COUNT(*),
                    COALESCE(SUM(duration_secs), 0),
                    COALESCE(SUM(CASE WHEN day = ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN day = ?1 THEN duration_secs ELSE 0 END), 0)
             FROM sessions
             GROUP BY phase",
        )?;
        let rows = stmt.query_map(params![today], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, u64>(4)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (phase, count, secs, today_count, today_secs) = row?;
            match Phase::parse(&phase) {
                Some(Phase::Focus) => {
                    stats.total_sessions += count;
                    stats.total_focus_min += secs / 60;
                    stats.today_sessions += today_count;
                    stats.today_focus_min += today_secs / 60;
                }
                Some(Phase::Break | Phase::LongBreak) => {
                    stats.total_break_min += secs / 60;
                }
                None => {}
            }
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl PersistenceStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Ok(self.kv_remove(key)?)
    }
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
