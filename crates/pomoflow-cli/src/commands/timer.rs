use std::time::Duration;

use clap::Subcommand;
use pomoflow_core::{history, Clock, Config, Database, Event, SystemClock, TimerEngine};

use super::{load_engine, open_database, print_report};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current phase, or resume it if paused
    Start,
    /// Pause the running phase
    Pause,
    /// Resume a paused phase
    Resume,
    /// Jump to the next phase without completing this one
    Skip,
    /// Stop and return to an idle first focus session
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Follow the timer, printing events as they happen (Ctrl-C to stop)
    Watch,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database(config)?;
    let (mut engine, mut events) = load_engine(&db, config);
    // Catch-up already persisted the advanced record, so record it now.
    history::record_events(&db, &events);

    let done = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Resume => engine.resume(),
        TimerAction::Skip => engine.skip(),
        TimerAction::Reset => engine.reset(),
        TimerAction::Status => Vec::new(),
        TimerAction::Watch => {
            emit_lines(&events)?;
            return watch(&mut engine, &db, config);
        }
    };
    history::record_events(&db, &done);
    events.extend(done);

    print_report(&events, engine.snapshot())?;
    Ok(())
}

fn emit_lines(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

fn deliver_due_alerts(db: &Database, bell: bool) {
    match db.take_due_notifications(SystemClock.now_ms()) {
        Ok(due) => {
            for alert in due {
                let bell = if bell { "\x07" } else { "" };
                eprintln!("{bell}{}: {}", alert.title, alert.body);
            }
        }
        Err(e) => tracing::warn!("failed to read queued alerts: {e}"),
    }
}

fn watch(
    engine: &mut TimerEngine,
    db: &Database,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(config.watch.poll_interval_ms));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Other commands may have changed the timer since the last tick.
                    let events = engine.reload();
                    if !events.is_empty() {
                        history::record_events(db, &events);
                        emit_lines(&events)?;
                    }
                    deliver_due_alerts(db, config.watch.bell);

                    let snap = engine.snapshot();
                    eprint!(
                        "\r{:>10} {:>9} {:02}:{:02}  ",
                        snap.phase.as_str(),
                        format!("{:?}", snap.state).to_lowercase(),
                        snap.remaining_secs / 60,
                        snap.remaining_secs % 60,
                    );
                }
                _ = &mut ctrl_c => {
                    eprintln!();
                    tracing::debug!("watch interrupted");
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
