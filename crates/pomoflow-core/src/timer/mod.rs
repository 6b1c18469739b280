mod engine;
mod phase;
mod record;

pub use engine::{
    Collaborators, TimerEngine, TimerSnapshot, MAX_CATCH_UP_PHASES, SETTINGS_KEY,
};
pub use phase::{next_phase, Phase, TimerState, Transition};
pub use record::{TimerRecord, TIMER_KEY};
