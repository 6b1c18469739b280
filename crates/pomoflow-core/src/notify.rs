//! Phase-end notification seam.
//!
//! The engine keeps at most one alert outstanding: it always cancels the
//! previous handle before scheduling a new one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::timer::Phase;

/// Opaque id of a scheduled alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(pub String);

impl NotificationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait NotificationScheduler {
    /// Schedule an alert to fire at `at_ms` (epoch milliseconds).
    fn schedule(&self, at_ms: u64, title: &str, body: &str)
        -> Result<NotificationHandle, NotifyError>;

    /// Cancel a previously scheduled alert. Unknown handles are not an error.
    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError>;
}

impl<T: NotificationScheduler + ?Sized> NotificationScheduler for Rc<T> {
    fn schedule(
        &self,
        at_ms: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotifyError> {
        (**self).schedule(at_ms, title, body)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError> {
        (**self).cancel(handle)
    }
}

/// Title and body shown when a phase ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: &'static str,
    pub body: &'static str,
}

impl NotificationContent {
    /// Content for the alert fired when `ending` finishes and `next` begins.
    pub fn phase_end(ending: Phase, next: Phase) -> Self {
        match (ending, next) {
            (Phase::Focus, Phase::LongBreak) => Self {
                title: "Break Time!",
                body: "Great work! Time for a long break.",
            },
            (Phase::Focus, _) => Self {
                title: "Break Time!",
                body: "Great work! Time for a break.",
            },
            _ => Self {
                title: "Focus Time!",
                body: "Break's over. Ready to focus?",
            },
        }
    }
}

/// Scheduler that drops every alert. Used when no platform alerts exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl NotificationScheduler for NullNotifier {
    fn schedule(
        &self,
        at_ms: u64,
        _title: &str,
        _body: &str,
    ) -> Result<NotificationHandle, NotifyError> {
        Ok(NotificationHandle(format!("null-{at_ms}")))
    }

    fn cancel(&self, _handle: &NotificationHandle) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAlert {
    pub handle: NotificationHandle,
    pub at_ms: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct RecorderState {
    pending: Vec<ScheduledAlert>,
    schedule_calls: usize,
    cancel_calls: usize,
    next_id: u64,
}

/// In-memory scheduler that records calls. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Rc<RefCell<RecorderState>>,
    failing: Rc<Cell<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, like a platform that denied permission.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn pending(&self) -> Vec<ScheduledAlert> {
        self.state.borrow().pending.clone()
    }

    pub fn schedule_calls(&self) -> usize {
        self.state.borrow().schedule_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.state.borrow().cancel_calls
    }
}

impl NotificationScheduler for RecordingNotifier {
    fn schedule(
        &self,
        at_ms: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotifyError> {
        let mut state = self.state.borrow_mut();
        state.schedule_calls += 1;
        if self.failing.get() {
            return Err(NotifyError::ScheduleFailed("permission denied".into()));
        }
        state.next_id += 1;
        let handle = NotificationHandle(format!("alert-{}", state.next_id));
        state.pending.push(ScheduledAlert {
            handle: handle.clone(),
            at_ms,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(handle)
    }

    fn cancel(&self, handle: &NotificationHandle) -> Result<(), NotifyError> {
        let mut state = self.state.borrow_mut();
        state.cancel_calls += 1;
        if self.failing.get() {
            return Err(NotifyError::CancelFailed {
                id: handle.0.clone(),
                message: "permission denied".into(),
            });
        }
        state.pending.retain(|a| &a.handle != handle);
        Ok(())
    }
}
