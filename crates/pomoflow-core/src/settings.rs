//! Timer settings and partial updates.
//!
//! Settings are stored as one JSON record in the persistence store. A
//! [`SettingsPatch`] is merged onto the current value and validated as a
//! whole before it replaces anything.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Focus phase length in seconds.
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u64,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u64,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub haptic_enabled: bool,
    /// Start the next phase automatically when one completes.
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

fn default_work_duration() -> u64 {
    25 * 60
}
fn default_short_break() -> u64 {
    5 * 60
}
fn default_long_break() -> u64 {
    15 * 60
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            sessions_until_long_break: default_sessions_until_long_break(),
            notifications_enabled: true,
            sound_enabled: true,
            haptic_enabled: true,
            auto_advance: true,
        }
    }
}

impl TimerSettings {
    /// Phase length in seconds.
    pub fn duration_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.work_duration,
            Phase::Break => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }

    /// Phase length in milliseconds.
    ///
    /// Uses saturating arithmetic so absurd durations cannot overflow.
    pub fn duration_ms(&self, phase: Phase) -> u64 {
        self.duration_secs(phase).saturating_mul(1000)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let durations = [
            ("workDuration", self.work_duration),
            ("shortBreakDuration", self.short_break_duration),
            ("longBreakDuration", self.long_break_duration),
        ];
        for (field, secs) in durations {
            if secs == 0 {
                return Err(SettingsError::InvalidValue {
                    field: field.into(),
                    message: "duration must be greater than zero".into(),
                });
            }
        }
        if self.sessions_until_long_break == 0 {
            return Err(SettingsError::InvalidValue {
                field: "sessionsUntilLongBreak".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Merge `patch` onto a copy of `self` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field; `self` is untouched either way.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Self, SettingsError> {
        let next = Self {
            work_duration: patch.work_duration.unwrap_or(self.work_duration),
            short_break_duration: patch
                .short_break_duration
                .unwrap_or(self.short_break_duration),
            long_break_duration: patch
                .long_break_duration
                .unwrap_or(self.long_break_duration),
            sessions_until_long_break: patch
                .sessions_until_long_break
                .unwrap_or(self.sessions_until_long_break),
            notifications_enabled: patch
                .notifications_enabled
                .unwrap_or(self.notifications_enabled),
            sound_enabled: patch.sound_enabled.unwrap_or(self.sound_enabled),
            haptic_enabled: patch.haptic_enabled.unwrap_or(self.haptic_enabled),
            auto_advance: patch.auto_advance.unwrap_or(self.auto_advance),
        };
        next.validate()?;
        Ok(next)
    }
}

/// A partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub work_duration: Option<u64>,
    #[serde(default)]
    pub short_break_duration: Option<u64>,
    #[serde(default)]
    pub long_break_duration: Option<u64>,
    #[serde(default)]
    pub sessions_until_long_break: Option<u32>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
    #[serde(default)]
    pub haptic_enabled: Option<bool>,
    #[serde(default)]
    pub auto_advance: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(Phase::Focus), 1500);
        assert_eq!(s.duration_secs(Phase::Break), 300);
        assert_eq!(s.duration_ms(Phase::LongBreak), 900_000);
        assert_eq!(s.sessions_until_long_break, 4);
        assert!(s.auto_advance);
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let s = TimerSettings::default();
        let patch = SettingsPatch {
            work_duration: Some(50 * 60),
            sound_enabled: Some(false),
            ..Default::default()
        };
        let merged = s.merged(&patch).unwrap();
        assert_eq!(merged.work_duration, 3000);
        assert!(!merged.sound_enabled);
        assert_eq!(merged.short_break_duration, 300);
        assert!(merged.haptic_enabled);
    }

    #[test]
    fn merge_rejects_zero_duration() {
        let s = TimerSettings::default();
        let patch = SettingsPatch {
            short_break_duration: Some(0),
            ..Default::default()
        };
        let err = s.merged(&patch).unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                field: "shortBreakDuration".into(),
                message: "duration must be greater than zero".into(),
            }
        );
    }

    #[test]
    fn merge_rejects_zero_cadence() {
        let patch = SettingsPatch {
            sessions_until_long_break: Some(0),
            ..Default::default()
        };
        assert!(TimerSettings::default().merged(&patch).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: TimerSettings = serde_json::from_str(r#"{"workDuration": 600}"#).unwrap();
        assert_eq!(s.work_duration, 600);
        assert_eq!(s.long_break_duration, 900);
        assert!(s.notifications_enabled);
    }

    #[test]
    fn empty_patch() {
        assert!(SettingsPatch::default().is_empty());
        let patch = SettingsPatch {
            auto_advance: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
