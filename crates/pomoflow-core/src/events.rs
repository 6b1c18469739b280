use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::TimerSettings;
use crate::timer::Phase;

/// Every state change in the engine produces an Event.
/// Commands return the events they caused; consumers (history, UI) read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        session_count: u32,
        duration_secs: u64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_ms: u64,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A phase ran to its end. `at` is the scheduled boundary, which may lie
    /// well before the reconciliation that noticed it.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        session_count: u32,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// User jumped to the next phase before the current one ended.
    PhaseSkipped {
        from: Phase,
        to: Phase,
        session_count: u32,
        at: DateTime<Utc>,
    },
    /// Catch-up hit its iteration bound and re-anchored to the current time.
    CatchUpCapped {
        phases_applied: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
}

/// Convert epoch milliseconds from a [`crate::Clock`] into a UTC timestamp.
pub fn utc_from_ms(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
