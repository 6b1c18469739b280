//! End-to-end timer scenarios.
//!
//! Each test drives the engine through its public API with a manual clock,
//! the way the UI would across app launches and background gaps.

use std::rc::Rc;

use pomoflow_core::timer::TIMER_KEY;
use pomoflow_core::{
    Collaborators, Database, Event, ManualClock, MemoryStore, NullFeedback, Phase,
    RecordingFeedback, RecordingNotifier, SettingsPatch, TimerEngine, TimerState,
};

const T0: u64 = 1_760_000_000_000;

fn collaborators(
    clock: &ManualClock,
    store: &MemoryStore,
    notifier: &RecordingNotifier,
) -> Collaborators {
    Collaborators::new(
        clock.clone(),
        store.clone(),
        notifier.clone(),
        RecordingFeedback::new(),
    )
}

fn completions(events: &[Event]) -> Vec<(Phase, Phase)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PhaseCompleted {
                completed, next, ..
            } => Some((*completed, *next)),
            _ => None,
        })
        .collect()
}

#[test]
fn classic_pomodoro_focus_ends_while_backgrounded() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let (mut engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    engine
        .update_settings(&SettingsPatch {
            work_duration: Some(25 * 60),
            short_break_duration: Some(5 * 60),
            sessions_until_long_break: Some(4),
            ..Default::default()
        })
        .unwrap();

    engine.start();
    clock.set(T0 + 1_500_000);
    let events = engine.reconcile();

    assert_eq!(completions(&events), vec![(Phase::Focus, Phase::Break)]);
    assert_eq!(engine.phase(), Phase::Break);
    assert_eq!(engine.state(), TimerState::Running);
    assert_eq!(engine.phase_end_at(), Some(T0 + 1_500_000 + 300_000));
    assert_eq!(engine.session_count(), 1);
}

#[test]
fn stale_focus_record_is_completed_on_load() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    store.insert_raw(
        TIMER_KEY,
        &format!(
            r#"{{"phase":"focus","phaseStartAt":{},"phaseEndAt":{}}}"#,
            T0 - 1_505_000,
            T0 - 5_000
        ),
    );

    let (engine, events) = TimerEngine::load(collaborators(&clock, &store, &notifier));

    assert_eq!(completions(&events), vec![(Phase::Focus, Phase::Break)]);
    assert_eq!(engine.phase(), Phase::Break);
    assert_eq!(engine.state(), TimerState::Running);
    assert_eq!(engine.phase_end_at(), Some(T0 - 5_000 + 300_000));
    assert_eq!(engine.remaining_secs(), 295);

    let saved = store.peek(TIMER_KEY).unwrap();
    assert!(saved.contains(r#""phase":"break""#));
    assert_eq!(notifier.pending().len(), 1);
}

#[test]
fn missing_or_corrupt_record_starts_fresh() {
    let clock = ManualClock::new(T0);
    let notifier = RecordingNotifier::new();

    let empty = MemoryStore::new();
    let (engine, events) = TimerEngine::load(collaborators(&clock, &empty, &notifier));
    assert!(events.is_empty());
    assert_eq!(engine.state(), TimerState::Idle);

    let corrupt = MemoryStore::new();
    corrupt.insert_raw(TIMER_KEY, "{\"phase\": \"focus\", \"phaseEndAt\": ");
    let (engine, events) = TimerEngine::load(collaborators(&clock, &corrupt, &notifier));
    assert!(events.is_empty());
    assert_eq!(engine.state(), TimerState::Idle);
    assert_eq!(engine.phase(), Phase::Focus);
    assert!(corrupt.peek(TIMER_KEY).is_none());
}

#[test]
fn long_break_every_fourth_session() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let (mut engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    engine
        .update_settings(&SettingsPatch {
            work_duration: Some(60),
            short_break_duration: Some(10),
            long_break_duration: Some(30),
            sessions_until_long_break: Some(4),
            ..Default::default()
        })
        .unwrap();
    engine.start();

    let mut breaks = Vec::new();
    while breaks.len() < 12 {
        let end = engine.phase_end_at().unwrap();
        clock.set(end);
        for (completed, next) in completions(&engine.reconcile()) {
            if completed == Phase::Focus {
                breaks.push(next);
            }
        }
    }

    for (i, next) in breaks.iter().enumerate() {
        let session = i + 1;
        let expected = if session % 4 == 0 {
            Phase::LongBreak
        } else {
            Phase::Break
        };
        assert_eq!(*next, expected, "session {session}");
    }
    assert_eq!(engine.session_count(), 12);
    assert!(engine.snapshot().is_long_break);
}

#[test]
fn catch_up_after_35_seconds_increments_once() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    let (mut engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    engine
        .update_settings(&SettingsPatch {
            work_duration: Some(10),
            short_break_duration: Some(10),
            ..Default::default()
        })
        .unwrap();
    engine.start();
    clock.advance_secs(35);

    engine.reconcile();
    assert_eq!(engine.phase(), Phase::Break);
    assert_eq!(engine.session_count(), 2);

    // A second call at the same instant changes nothing.
    assert!(engine.reconcile().is_empty());
    assert_eq!(engine.session_count(), 2);
}

#[test]
fn state_survives_restart() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    {
        let (mut engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
        engine.start();
        clock.advance_secs(200);
        engine.pause();
    }

    clock.advance_secs(10_000);
    let (mut engine, events) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    assert!(events.is_empty());
    assert_eq!(engine.state(), TimerState::Paused);
    assert_eq!(engine.remaining_secs(), 1300);

    engine.resume();
    assert_eq!(engine.phase_end_at(), Some(clock_now(&clock) + 1_300_000));
}

#[test]
fn reset_after_restart_cancels_alert_from_previous_process() {
    let clock = ManualClock::new(T0);
    let db = Rc::new(Database::open_memory().unwrap());
    let deps = || {
        Collaborators::new(clock.clone(), Rc::clone(&db), Rc::clone(&db), NullFeedback)
    };

    {
        let (mut engine, _) = TimerEngine::load(deps());
        engine.start();
    }
    assert_eq!(db.pending_notifications().unwrap().len(), 1);

    let (mut engine, _) = TimerEngine::load(deps());
    assert!(engine.pending_notification().is_some());
    engine.reset();
    assert!(db.pending_notifications().unwrap().is_empty());
    assert!(db.kv_get(TIMER_KEY).unwrap().is_none());
}

#[test]
fn reset_elsewhere_is_not_undone_by_a_long_lived_engine() {
    let clock = ManualClock::new(T0);
    let db = Rc::new(Database::open_memory().unwrap());
    let deps = || {
        Collaborators::new(clock.clone(), Rc::clone(&db), Rc::clone(&db), NullFeedback)
    };

    let (mut watcher, _) = TimerEngine::load(deps());
    watcher.start();

    let (mut other, _) = TimerEngine::load(deps());
    other.reset();
    assert!(db.kv_get(TIMER_KEY).unwrap().is_none());
    assert!(db.pending_notifications().unwrap().is_empty());

    clock.advance(1_500_000);
    let events = watcher.reload();

    assert!(events.is_empty());
    assert_eq!(watcher.state(), TimerState::Idle);
    assert!(watcher.pending_notification().is_none());
    assert!(db.kv_get(TIMER_KEY).unwrap().is_none());
    assert!(db.pending_notifications().unwrap().is_empty());

    let (reloaded, _) = TimerEngine::load(deps());
    assert_eq!(reloaded.state(), TimerState::Idle);
}

#[test]
fn stored_settings_are_used_on_load() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    {
        let (mut engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
        engine
            .update_settings(&SettingsPatch {
                work_duration: Some(50 * 60),
                ..Default::default()
            })
            .unwrap();
    }
    let (engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    assert_eq!(engine.settings().work_duration, 3000);
    assert_eq!(engine.remaining_secs(), 3000);
}

#[test]
fn invalid_stored_settings_fall_back_to_defaults() {
    let clock = ManualClock::new(T0);
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::new();
    store.insert_raw(pomoflow_core::timer::SETTINGS_KEY, r#"{"workDuration":0}"#);
    let (engine, _) = TimerEngine::load(collaborators(&clock, &store, &notifier));
    assert_eq!(engine.settings().work_duration, 1500);
}

fn clock_now(clock: &ManualClock) -> u64 {
    use pomoflow_core::Clock;
    clock.now_ms()
}
