//! Phase-end alerts queued in SQLite.
//!
//! A terminal has no OS scheduler to hand alerts to, so the CLI parks them
//! in the `notifications` table and its watch loop delivers whatever is due.
//! Handles are row ids, which keeps them valid across processes.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::error::{NotifyError, StorageError};
use crate::notify::{NotificationHandle, NotificationScheduler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedNotification {
    pub handle: NotificationHandle,
    pub fire_at: u64,
    pub title: String,
    pub body: String,
}

impl Database {
    /// All queued alerts, earliest first.
    pub fn pending_notifications(&self) -> Result<Vec<QueuedNotification>, StorageError> {
        let mut stmt = self.conn().prepare(
            "SELECT id, fire_at, title, body FROM notifications ORDER BY fire_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(QueuedNotification {
                handle: NotificationHandle(row.get::<_, i64>(0)?.to_string()),
                fire_at: row.get::<_, u64>(1)?,
                title: row.get(2)?,
                body: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Remove and return every alert due at or before `now_ms`.
    pub fn take_due_notifications(
        &self,
        now_ms: u64,
    ) -> Result<Vec<QueuedNotification>, StorageError> {
        let due: Vec<QueuedNotification> = self
            .pending_notifications()?
            .into_iter()
            .filter(|n| n.fire_at <= now_ms)
            .collect();
        self.conn().execute(
            "DELETE FROM notifications WHERE fire_at <= ?1",
            params![now_ms],
        )?;
        Ok(due)
    }
}

impl NotificationScheduler for Database {
    fn schedule(
        &self,
        at_ms: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotifyError> {
        self.conn()
            .execute(
                "INSERT INTO notifications (fire_at, title, body) VALUES (?1, ?2, ?3)",
                params![at_ms, title, body],
            )
            .map_err(|e| NotifyError::ScheduleFailed(e.to_string()))?;
        Ok(NotificationHandle(self.conn().last_insert_rowid().to_string()))
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError> {
        // Handles from other schedulers cannot be ours.
        let Ok(id) = handle.as_str().parse::<i64>() else {
            return Ok(());
        };
        self.conn()
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])
            .map_err(|e| NotifyError::CancelFailed {
                id: handle.as_str().to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
