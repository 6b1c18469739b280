//! # PomoFlow Core Library
//!
//! Core logic for the PomoFlow focus timer: a Pomodoro state machine that
//! survives process suspension by deriving remaining time from absolute
//! wall-clock end times instead of counting ticks.
//!
//! ## Architecture
//!
//! - **Timer Engine**: wall-clock state machine; the caller polls
//!   `reconcile()` and the engine catches up on every phase that elapsed
//! - **Collaborators**: `Clock`, `PersistenceStore`, `NotificationScheduler`
//!   and `FeedbackSink` traits injected at construction
//! - **Storage**: SQLite key-value store, session history and alert queue,
//!   plus TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerSettings`]: Phase durations and feedback toggles
//! - [`Database`]: SQLite persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod feedback;
pub mod history;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, NotifyError, SettingsError, StorageError};
pub use events::Event;
pub use feedback::{FeedbackCues, FeedbackSink, HapticStyle, NullFeedback, RecordingFeedback};
pub use notify::{
    NotificationContent, NotificationHandle, NotificationScheduler, NullNotifier,
    RecordingNotifier,
};
pub use settings::{SettingsPatch, TimerSettings};
pub use storage::{Config, Database, MemoryStore, PersistenceStore};
pub use timer::{Collaborators, Phase, TimerEngine, TimerSnapshot, TimerState};
