pub mod config;
pub mod settings;
pub mod stats;
pub mod timer;

use std::rc::Rc;

use pomoflow_core::error::Result;
use pomoflow_core::{
    Collaborators, Config, Database, Event, FeedbackCues, FeedbackSink, Phase, SystemClock,
    TimerEngine, TimerSnapshot,
};
use serde::Serialize;

/// Rings the terminal bell when a phase completes with a chime.
pub struct TerminalFeedback {
    pub bell: bool,
}

impl FeedbackSink for TerminalFeedback {
    fn on_phase_complete(&self, completed: Phase, next: Phase, cues: FeedbackCues) {
        tracing::debug!(?completed, ?next, ?cues, "phase feedback");
        if self.bell && cues.chime {
            eprint!("\x07");
        }
    }
}

pub fn open_database(config: &Config) -> Result<Rc<Database>> {
    let path = config.database_path()?;
    Ok(Rc::new(Database::open_at(&path)?))
}

/// Load the engine with the database as both store and alert queue.
pub fn load_engine(db: &Rc<Database>, config: &Config) -> (TimerEngine, Vec<Event>) {
    TimerEngine::load(Collaborators::new(
        SystemClock,
        Rc::clone(db),
        Rc::clone(db),
        TerminalFeedback {
            bell: config.watch.bell,
        },
    ))
}

#[derive(Serialize)]
pub struct Report<'a> {
    pub events: &'a [Event],
    pub timer: TimerSnapshot,
}

pub fn print_report(events: &[Event], timer: TimerSnapshot) -> Result<()> {
    let report = Report { events, timer };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
