//! Timer engine implementation.
//!
//! The engine is a wall-clock state machine. Remaining time is never stored:
//! it is derived from the absolute `phase_end_at` and the injected [`Clock`],
//! so nothing is lost while the process is suspended. The caller drives it by
//! calling [`TimerEngine::reconcile`] from a poll loop or on foreground resume.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |  ^
//!           v  |  (auto-advance off)
//!         Completed
//! any -> Idle (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (mut engine, _) = TimerEngine::load(collaborators);
//! engine.start();
//! // In a loop:
//! for event in engine.reconcile() { /* phase boundaries */ }
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use super::phase::{next_phase, Phase, TimerState};
use super::record::{TimerRecord, TIMER_KEY};
use crate::clock::Clock;
use crate::error::SettingsError;
use crate::events::{utc_from_ms, Event};
use crate::feedback::{FeedbackCues, FeedbackSink};
use crate::notify::{NotificationContent, NotificationHandle, NotificationScheduler};
use crate::settings::{SettingsPatch, TimerSettings};
use crate::storage::PersistenceStore;

pub const SETTINGS_KEY: &str = "pomoflow.settings";

/// Upper bound on phases applied by one reconciliation. Past this the
/// engine gives up on the original schedule and starts the next phase fresh.
pub const MAX_CATCH_UP_PHASES: u32 = 64;

/// Everything the engine talks to.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub store: Box<dyn PersistenceStore>,
    pub notifier: Box<dyn NotificationScheduler>,
    pub feedback: Box<dyn FeedbackSink>,
}

impl Collaborators {
    pub fn new(
        clock: impl Clock + 'static,
        store: impl PersistenceStore + 'static,
        notifier: impl NotificationScheduler + 'static,
        feedback: impl FeedbackSink + 'static,
    ) -> Self {
        Self {
            clock: Box::new(clock),
            store: Box::new(store),
            notifier: Box::new(notifier),
            feedback: Box::new(feedback),
        }
    }
}

/// The engine's observable state at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub state: TimerState,
    pub session_count: u32,
    pub is_long_break: bool,
    pub phase_started_at: Option<u64>,
    pub phase_end_at: Option<u64>,
    pub paused_at: Option<u64>,
    pub last_updated: u64,
    pub remaining_secs: u64,
    pub total_secs: u64,
}

/// Core timer engine.
pub struct TimerEngine {
    deps: Collaborators,
    settings: TimerSettings,
    phase: Phase,
    state: TimerState,
    session_count: u32,
    phase_started_at: Option<u64>,
    phase_end_at: Option<u64>,
    paused_at: Option<u64>,
    last_updated: u64,
    notification: Option<NotificationHandle>,
}

impl TimerEngine {
    /// Create an idle engine with default settings, ignoring anything stored.
    pub fn new(deps: Collaborators) -> Self {
        let now = deps.clock.now_ms();
        Self {
            deps,
            settings: TimerSettings::default(),
            phase: Phase::Focus,
            state: TimerState::Idle,
            session_count: 1,
            phase_started_at: None,
            phase_end_at: None,
            paused_at: None,
            last_updated: now,
            notification: None,
        }
    }

    /// Restore settings and timer state from the store, then reconcile.
    ///
    /// Missing or unreadable records fall back to defaults. A phase that
    /// ended while the process was gone is completed here, so the returned
    /// events may already contain phase completions.
    pub fn load(deps: Collaborators) -> (Self, Vec<Event>) {
        let mut engine = Self::new(deps);
        let events = engine.reload();
        (engine, events)
    }

    /// Replace in-memory state with what the store holds, then reconcile.
    ///
    /// Another process may have paused, reset or advanced the timer since
    /// this engine last wrote it. Long-lived callers reload before acting.
    /// If the store cannot be read the current state is kept.
    pub fn reload(&mut self) -> Vec<Event> {
        self.settings = self.read_settings();
        let stored = match self.deps.store.get(TIMER_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("failed to read timer state, keeping current: {e}");
                return self.reconcile();
            }
        };

        self.phase = Phase::Focus;
        self.state = TimerState::Idle;
        self.session_count = 1;
        self.phase_started_at = None;
        self.phase_end_at = None;
        self.paused_at = None;
        self.last_updated = self.now();
        self.notification = None;

        if let Some(json) = stored {
            match TimerRecord::parse(&json).map_err(|e| e.to_string()) {
                Ok(record) => match record.restore() {
                    Ok(restored) => {
                        self.phase = restored.phase;
                        self.state = restored.state;
                        self.session_count = restored.session_count;
                        self.phase_started_at = restored.phase_started_at;
                        self.phase_end_at = restored.phase_end_at;
                        self.paused_at = restored.paused_at;
                        self.notification = restored.notification;
                        if let Some(ts) = restored.last_updated {
                            self.last_updated = ts;
                        }
                    }
                    Err(reason) => self.discard_record(&reason),
                },
                Err(reason) => self.discard_record(&reason),
            }
        }

        self.reconcile()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn phase_end_at(&self) -> Option<u64> {
        self.phase_end_at
    }

    pub fn pending_notification(&self) -> Option<&NotificationHandle> {
        self.notification.as_ref()
    }

    /// Milliseconds left in the current phase, derived from the clock.
    pub fn remaining_ms(&self) -> u64 {
        match (self.state, self.phase_end_at) {
            (TimerState::Running, Some(end)) => end.saturating_sub(self.now()),
            (TimerState::Paused, Some(end)) => {
                end.saturating_sub(self.paused_at.unwrap_or(end))
            }
            (TimerState::Idle, _) => self.settings.duration_ms(self.phase),
            _ => 0,
        }
    }

    /// Whole seconds left, rounded down.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms() / 1000
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            state: self.state,
            session_count: self.session_count,
            is_long_break: self.phase == Phase::LongBreak,
            phase_started_at: self.phase_started_at,
            phase_end_at: self.phase_end_at,
            paused_at: self.paused_at,
            last_updated: self.last_updated,
            remaining_secs: self.remaining_secs(),
            total_secs: self.settings.duration_secs(self.phase),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current phase. A no-op while already running.
    pub fn start(&mut self) -> Vec<Event> {
        let mut events = self.reconcile();
        match self.state {
            TimerState::Running => {}
            TimerState::Paused => events.extend(self.resume()),
            TimerState::Idle | TimerState::Completed => {
                let now = self.now();
                let duration_ms = self.settings.duration_ms(self.phase);
                let ends_at = now.saturating_add(duration_ms);
                self.state = TimerState::Running;
                self.phase_started_at = Some(now);
                self.phase_end_at = Some(ends_at);
                self.paused_at = None;
                self.last_updated = now;
                self.commit();
                debug!(phase = ?self.phase, session = self.session_count, "timer started");
                events.push(Event::TimerStarted {
                    phase: self.phase,
                    session_count: self.session_count,
                    duration_secs: self.settings.duration_secs(self.phase),
                    ends_at: utc_from_ms(ends_at),
                    at: utc_from_ms(now),
                });
            }
        }
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let mut events = self.reconcile();
        if self.state != TimerState::Running {
            return events;
        }
        let now = self.now();
        self.state = TimerState::Paused;
        self.paused_at = Some(now);
        self.last_updated = now;
        self.commit();
        let remaining_ms = self.remaining_ms();
        debug!(phase = ?self.phase, remaining_ms, "timer paused");
        events.push(Event::TimerPaused {
            phase: self.phase,
            remaining_ms,
            at: utc_from_ms(now),
        });
        events
    }

    /// Continue a paused phase with the remaining time it had when paused.
    pub fn resume(&mut self) -> Vec<Event> {
        if self.state != TimerState::Paused {
            return Vec::new();
        }
        let now = self.now();
        let remaining_ms = self.remaining_ms();
        let ends_at = now.saturating_add(remaining_ms);
        self.state = TimerState::Running;
        self.phase_end_at = Some(ends_at);
        self.paused_at = None;
        self.last_updated = now;
        self.commit();
        debug!(phase = ?self.phase, remaining_ms, "timer resumed");
        vec![Event::TimerResumed {
            phase: self.phase,
            remaining_ms,
            ends_at: utc_from_ms(ends_at),
            at: utc_from_ms(now),
        }]
    }

    /// Jump straight to the next phase, keeping session bookkeeping.
    pub fn skip(&mut self) -> Vec<Event> {
        let mut events = self.reconcile();
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return events;
        }
        let now = self.now();
        let t = next_phase(
            self.phase,
            self.session_count,
            self.settings.sessions_until_long_break,
        );
        self.phase = t.next;
        self.session_count = t.session_count;
        self.state = TimerState::Running;
        self.phase_started_at = Some(now);
        self.phase_end_at = Some(now.saturating_add(self.settings.duration_ms(t.next)));
        self.paused_at = None;
        self.last_updated = now;
        self.commit();
        debug!(from = ?t.completed, to = ?t.next, "phase skipped");
        events.push(Event::PhaseSkipped {
            from: t.completed,
            to: t.next,
            session_count: t.session_count,
            at: utc_from_ms(now),
        });
        events
    }

    /// Stop everything and return to a fresh idle Focus phase.
    ///
    /// The pending alert is cancelled before anything else so it can never
    /// fire after a user-initiated stop.
    pub fn reset(&mut self) -> Vec<Event> {
        self.cancel_notification();
        let now = self.now();
        self.phase = Phase::Focus;
        self.state = TimerState::Idle;
        self.session_count = 1;
        self.phase_started_at = None;
        self.phase_end_at = None;
        self.paused_at = None;
        self.last_updated = now;
        self.persist();
        debug!("timer reset");
        vec![Event::TimerReset {
            at: utc_from_ms(now),
        }]
    }

    /// Merge a partial settings update.
    ///
    /// Any phase that already ended is completed under the old settings
    /// first. New durations apply from the next phase on; the running
    /// phase keeps its end time.
    ///
    /// # Errors
    ///
    /// Returns the validation error and keeps the previous settings.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Vec<Event>, SettingsError> {
        let next = self.settings.merged(patch)?;
        let mut events = self.reconcile();
        let alerts_toggled = next.notifications_enabled != self.settings.notifications_enabled;
        let upcoming_changed = self.state == TimerState::Running
            && self.upcoming_phase(&self.settings) != self.upcoming_phase(&next);
        self.settings = next;
        self.write_settings();
        if alerts_toggled || upcoming_changed {
            self.commit();
        }
        events.push(Event::SettingsUpdated {
            settings: self.settings.clone(),
            at: utc_from_ms(self.now()),
        });
        Ok(events)
    }

    /// Apply every phase boundary that has passed.
    ///
    /// Side-effect free when no boundary was crossed, so it is safe to call
    /// from a tight poll loop. Each new phase is anchored to the scheduled end
    /// of the previous one, not to `now`, so repeated transitions do not
    /// accumulate drift.
    pub fn reconcile(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.state != TimerState::Running {
            return events;
        }
        let Some(mut boundary) = self.phase_end_at else {
            return events;
        };
        let now = self.now();
        if now < boundary {
            return events;
        }

        let mut applied = 0u32;
        loop {
            let t = next_phase(
                self.phase,
                self.session_count,
                self.settings.sessions_until_long_break,
            );
            applied += 1;

            let completed_ms = self.settings.duration_ms(t.completed);
            let started_at = self
                .phase_started_at
                .unwrap_or_else(|| boundary.saturating_sub(completed_ms));
            events.push(Event::PhaseCompleted {
                completed: t.completed,
                next: t.next,
                session_count: t.session_count,
                duration_secs: self.settings.duration_secs(t.completed),
                started_at: utc_from_ms(started_at),
                at: utc_from_ms(boundary),
            });
            let cues = FeedbackCues::for_transition(&self.settings, t.next);
            if !cues.is_silent() {
                self.deps
                    .feedback
                    .on_phase_complete(t.completed, t.next, cues);
            }

            self.phase = t.next;
            self.session_count = t.session_count;

            if !self.settings.auto_advance {
                self.state = TimerState::Completed;
                self.phase_started_at = None;
                break;
            }

            let duration_ms = self.settings.duration_ms(t.next);
            if applied >= MAX_CATCH_UP_PHASES {
                warn!(
                    applied,
                    behind_ms = now.saturating_sub(boundary),
                    "catch-up bound reached, starting next phase from now"
                );
                self.phase_started_at = Some(now);
                self.phase_end_at = Some(now.saturating_add(duration_ms));
                events.push(Event::CatchUpCapped {
                    phases_applied: applied,
                    at: utc_from_ms(now),
                });
                break;
            }

            self.phase_started_at = Some(boundary);
            boundary = boundary.saturating_add(duration_ms);
            self.phase_end_at = Some(boundary);
            if now < boundary {
                break;
            }
        }

        if applied > 1 {
            info!(applied, phase = ?self.phase, "caught up on elapsed phases");
        } else {
            debug!(phase = ?self.phase, session = self.session_count, "phase advanced");
        }
        self.last_updated = now;
        self.commit();
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> u64 {
        self.deps.clock.now_ms()
    }

    /// Bring the pending alert in line with the state, then persist.
    fn commit(&mut self) {
        self.cancel_notification();
        if self.state == TimerState::Running && self.settings.notifications_enabled {
            self.schedule_notification();
        }
        self.persist();
    }

    /// Phase that follows the current one under `settings`.
    fn upcoming_phase(&self, settings: &TimerSettings) -> Phase {
        next_phase(
            self.phase,
            self.session_count,
            settings.sessions_until_long_break,
        )
        .next
    }

    fn schedule_notification(&mut self) {
        let Some(end) = self.phase_end_at else {
            return;
        };
        let upcoming = self.upcoming_phase(&self.settings);
        let content = NotificationContent::phase_end(self.phase, upcoming);
        match self
            .deps
            .notifier
            .schedule(end, content.title, content.body)
        {
            Ok(handle) => self.notification = Some(handle),
            Err(e) => warn!("failed to schedule phase-end notification: {e}"),
        }
    }

    fn cancel_notification(&mut self) {
        if let Some(handle) = self.notification.take() {
            if let Err(e) = self.deps.notifier.cancel(&handle) {
                warn!("failed to cancel notification {}: {e}", handle.as_str());
            }
        }
    }

    fn record(&self) -> TimerRecord {
        TimerRecord {
            phase: self.phase,
            phase_start_at: self.phase_started_at,
            phase_end_at: self.phase_end_at,
            state: Some(self.state),
            session_count: self.session_count,
            paused_at: self.paused_at,
            last_updated: Some(self.last_updated),
            notification_id: self.notification.clone(),
        }
    }

    /// Best-effort write of the timer record. An idle timer has no record.
    fn persist(&self) {
        if self.state == TimerState::Idle {
            if let Err(e) = self.deps.store.remove(TIMER_KEY) {
                warn!("failed to clear timer state: {e}");
            }
            return;
        }
        let json = match serde_json::to_string(&self.record()) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to encode timer state: {e}");
                return;
            }
        };
        if let Err(e) = self.deps.store.set(TIMER_KEY, &json) {
            warn!("failed to persist timer state: {e}");
        }
    }

    fn discard_record(&self, reason: &str) {
        warn!("ignoring unreadable timer state: {reason}");
        if let Err(e) = self.deps.store.remove(TIMER_KEY) {
            warn!("failed to clear unreadable timer state: {e}");
        }
    }

    fn read_settings(&self) -> TimerSettings {
        let json = match self.deps.store.get(SETTINGS_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return TimerSettings::default(),
            Err(e) => {
                warn!("failed to read settings, keeping current: {e}");
                return self.settings.clone();
            }
        };
        match serde_json::from_str::<TimerSettings>(&json) {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!("stored settings rejected, using defaults: {e}");
                    TimerSettings::default()
                }
            },
            Err(e) => {
                warn!("stored settings unreadable, using defaults: {e}");
                TimerSettings::default()
            }
        }
    }

    fn write_settings(&self) {
        match serde_json::to_string(&self.settings) {
            Ok(json) => {
                if let Err(e) = self.deps.store.set(SETTINGS_KEY, &json) {
                    warn!("failed to persist settings: {e}");
                }
            }
            Err(e) => warn!("failed to encode settings: {e}"),
        }
    }
}
