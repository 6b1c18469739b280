//! Chime and haptic feedback on phase completion.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::settings::TimerSettings;
use crate::timer::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticStyle {
    Medium,
    /// Entering a long break.
    Heavy,
}

/// Which cues the sink should play for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCues {
    pub chime: bool,
    pub haptic: Option<HapticStyle>,
}

impl FeedbackCues {
    pub fn for_transition(settings: &TimerSettings, next: Phase) -> Self {
        let haptic = settings.haptic_enabled.then(|| {
            if next == Phase::LongBreak {
                HapticStyle::Heavy
            } else {
                HapticStyle::Medium
            }
        });
        Self {
            chime: settings.sound_enabled,
            haptic,
        }
    }

    pub fn is_silent(&self) -> bool {
        !self.chime && self.haptic.is_none()
    }
}

/// Fire-and-forget feedback. Nothing it does can affect the timer.
pub trait FeedbackSink {
    fn on_phase_complete(&self, completed: Phase, next: Phase, cues: FeedbackCues);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn on_phase_complete(&self, _completed: Phase, _next: Phase, _cues: FeedbackCues) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackCall {
    pub completed: Phase,
    pub next: Phase,
    pub cues: FeedbackCues,
}

/// Records every call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    calls: Rc<RefCell<Vec<FeedbackCall>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<FeedbackCall> {
        self.calls.borrow().clone()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn on_phase_complete(&self, completed: Phase, next: Phase, cues: FeedbackCues) {
        self.calls.borrow_mut().push(FeedbackCall {
            completed,
            next,
            cues,
        });
    }
}
