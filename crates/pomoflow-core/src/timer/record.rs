//! Persisted timer record.
//!
//! The whole timer state is one JSON object under one key, so an
//! interrupted write can never leave phase and end time out of step.
//! Older or hand-written records may carry only `phase` and `phaseEndAt`;
//! everything else has a default.

use serde::{Deserialize, Serialize};

use super::phase::{Phase, TimerState};
use crate::notify::NotificationHandle;

pub const TIMER_KEY: &str = "pomoflow.timer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub phase: Phase,
    #[serde(default)]
    pub phase_start_at: Option<u64>,
    #[serde(default)]
    pub phase_end_at: Option<u64>,
    #[serde(default)]
    pub state: Option<TimerState>,
    #[serde(default = "default_session_count")]
    pub session_count: u32,
    #[serde(default)]
    pub paused_at: Option<u64>,
    #[serde(default)]
    pub last_updated: Option<u64>,
    #[serde(default)]
    pub notification_id: Option<NotificationHandle>,
}

fn default_session_count() -> u32 {
    1
}

/// Engine state restored from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Restored {
    pub phase: Phase,
    pub state: TimerState,
    pub session_count: u32,
    pub phase_started_at: Option<u64>,
    pub phase_end_at: Option<u64>,
    pub paused_at: Option<u64>,
    pub last_updated: Option<u64>,
    pub notification: Option<NotificationHandle>,
}

impl TimerRecord {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the record is internally consistent.
    ///
    /// A missing `state` is inferred from `phaseEndAt`. Returns a reason on
    /// records that cannot be trusted.
    pub(crate) fn restore(self) -> Result<Restored, String> {
        let state = self.state.unwrap_or(if self.phase_end_at.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        });

        if state != TimerState::Idle && self.phase_end_at.is_none() {
            return Err(format!("{state:?} record without phaseEndAt"));
        }
        if state == TimerState::Paused && self.paused_at.is_none() {
            return Err("paused record without pausedAt".into());
        }
        if self.session_count == 0 {
            return Err("sessionCount must be at least 1".into());
        }

        // An idle timer is always the first focus session.
        let idle = state == TimerState::Idle;
        Ok(Restored {
            phase: if idle { Phase::Focus } else { self.phase },
            state,
            session_count: if idle { 1 } else { self.session_count },
            phase_started_at: if idle { None } else { self.phase_start_at },
            phase_end_at: if idle { None } else { self.phase_end_at },
            paused_at: if state == TimerState::Paused {
                self.paused_at
            } else {
                None
            },
            last_updated: self.last_updated,
            notification: self.notification_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_infers_running() {
        let r = TimerRecord::parse(r#"{"phase":"focus","phaseStartAt":0,"phaseEndAt":1000}"#)
            .unwrap()
            .restore()
            .unwrap();
        assert_eq!(r.state, TimerState::Running);
        assert_eq!(r.session_count, 1);
        assert_eq!(r.phase_end_at, Some(1000));
    }

    #[test]
    fn record_without_end_is_idle() {
        let r = TimerRecord::parse(r#"{"phase":"focus","phaseEndAt":null}"#)
            .unwrap()
            .restore()
            .unwrap();
        assert_eq!(r.state, TimerState::Idle);
        assert_eq!(r.phase, Phase::Focus);
    }

    #[test]
    fn idle_record_is_normalised_to_first_focus() {
        let r = TimerRecord::parse(
            r#"{"phase":"break","state":"idle","sessionCount":3,"phaseEndAt":9000,"pausedAt":5}"#,
        )
        .unwrap()
        .restore()
        .unwrap();
        assert_eq!(r.state, TimerState::Idle);
        assert_eq!(r.phase, Phase::Focus);
        assert_eq!(r.session_count, 1);
        assert_eq!(r.phase_end_at, None);
        assert_eq!(r.paused_at, None);

        let inferred = TimerRecord::parse(r#"{"phase":"longBreak","sessionCount":4}"#)
            .unwrap()
            .restore()
            .unwrap();
        assert_eq!(inferred.phase, Phase::Focus);
        assert_eq!(inferred.session_count, 1);
    }

    #[test]
    fn running_without_end_is_rejected() {
        let rec = TimerRecord::parse(r#"{"phase":"focus","state":"running"}"#).unwrap();
        assert!(rec.restore().is_err());
    }

    #[test]
    fn paused_without_pause_time_is_rejected() {
        let rec =
            TimerRecord::parse(r#"{"phase":"focus","state":"paused","phaseEndAt":5}"#).unwrap();
        assert!(rec.restore().is_err());
    }

    #[test]
    fn zero_session_count_is_rejected() {
        let rec = TimerRecord::parse(r#"{"phase":"focus","sessionCount":0}"#).unwrap();
        assert!(rec.restore().is_err());
    }

    #[test]
    fn unknown_phase_fails_to_parse() {
        assert!(TimerRecord::parse(r#"{"phase":"work","phaseEndAt":5}"#).is_err());
        assert!(TimerRecord::parse("{not json").is_err());
    }

    #[test]
    fn record_uses_camel_case_keys() {
        let rec = TimerRecord {
            phase: Phase::LongBreak,
            phase_start_at: Some(1),
            phase_end_at: Some(2),
            state: Some(TimerState::Running),
            session_count: 4,
            paused_at: None,
            last_updated: Some(1),
            notification_id: Some(NotificationHandle("n-1".into())),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["phase"], "longBreak");
        assert_eq!(json["phaseEndAt"], 2);
        assert_eq!(json["sessionCount"], 4);
        assert_eq!(json["notificationId"], "n-1");
    }
}
