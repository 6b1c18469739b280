//! Session history and focus streaks.
//!
//! History is a consumer of engine events: completed phases are written to
//! the `sessions` table, skipped ones are not. A streak is the run of
//! consecutive days with at least one completed focus phase; it survives
//! until the end of the day after the last session.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::events::Event;
use crate::storage::{Database, SessionRecord, Stats};

/// Record every completed phase in `events`. Returns how many were written.
///
/// Failures are logged per event and do not stop the rest.
pub fn record_events(db: &Database, events: &[Event]) -> usize {
    let mut written = 0;
    for event in events {
        if let Event::PhaseCompleted {
            completed,
            duration_secs,
            started_at,
            at,
            ..
        } = event
        {
            let day = at.with_timezone(&Local).date_naive();
            match db.record_session(*completed, *duration_secs, *started_at, *at, day) {
                Ok(_) => written += 1,
                Err(e) => warn!("failed to record completed {}: {e}", completed.as_str()),
            }
        }
    }
    written
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Consecutive days with a focus session, ending today or yesterday.
    pub days: u32,
    pub last_session_day: Option<NaiveDate>,
}

impl Streak {
    /// Compute the streak from distinct focus days (any order).
    pub fn from_days(days: &[NaiveDate], today: NaiveDate) -> Self {
        let mut sorted: Vec<NaiveDate> = days.iter().copied().filter(|d| *d <= today).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let Some(&last) = sorted.first() else {
            return Self {
                days: 0,
                last_session_day: None,
            };
        };

        if (today - last).num_days() > 1 {
            return Self {
                days: 0,
                last_session_day: Some(last),
            };
        }

        let mut count = 1;
        for pair in sorted.windows(2) {
            if (pair[0] - pair[1]).num_days() == 1 {
                count += 1;
            } else {
                break;
            }
        }
        Self {
            days: count,
            last_session_day: Some(last),
        }
    }
}

/// Everything `pomoflow stats` shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    #[serde(flatten)]
    pub stats: Stats,
    pub streak: Streak,
    /// Latest completed phases, newest first.
    pub recent: Vec<SessionRecord>,
}

pub fn summary(
    db: &Database,
    today: NaiveDate,
    recent: usize,
) -> Result<HistorySummary, StorageError> {
    let stats = db.stats(today)?;
    let streak = Streak::from_days(&db.focus_days()?, today);
    let recent = db.recent_sessions(recent)?;
    Ok(HistorySummary {
        stats,
        streak,
        recent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::utc_from_ms;
    use crate::timer::Phase;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let days = [day("2026-05-10"), day("2026-05-09"), day("2026-05-08"), day("2026-05-05")];
        let s = Streak::from_days(&days, day("2026-05-10"));
        assert_eq!(s.days, 3);
        assert_eq!(s.last_session_day, Some(day("2026-05-10")));
    }

    #[test]
    fn streak_survives_until_end_of_next_day() {
        let days = [day("2026-05-09"), day("2026-05-08")];
        assert_eq!(Streak::from_days(&days, day("2026-05-10")).days, 2);
        assert_eq!(Streak::from_days(&days, day("2026-05-11")).days, 0);
    }

    #[test]
    fn empty_history_has_no_streak() {
        let s = Streak::from_days(&[], day("2026-05-10"));
        assert_eq!(s.days, 0);
        assert_eq!(s.last_session_day, None);
    }

    #[test]
    fn duplicate_and_future_days_are_ignored() {
        let days = [day("2026-05-10"), day("2026-05-10"), day("2026-05-12")];
        assert_eq!(Streak::from_days(&days, day("2026-05-10")).days, 1);
    }

    #[test]
    fn only_completions_are_recorded() {
        let db = Database::open_memory().unwrap();
        let events = vec![
            Event::PhaseCompleted {
                completed: Phase::Focus,
                next: Phase::Break,
                session_count: 1,
                duration_secs: 1500,
                started_at: utc_from_ms(1_700_000_000_000),
                at: utc_from_ms(1_700_001_500_000),
            },
            Event::PhaseSkipped {
                from: Phase::Break,
                to: Phase::Focus,
                session_count: 2,
                at: utc_from_ms(1_700_001_600_000),
            },
            Event::TimerReset {
                at: utc_from_ms(1_700_001_700_000),
            },
        ];
        assert_eq!(record_events(&db, &events), 1);

        let day = db.focus_days().unwrap()[0];
        let s = summary(&db, day, 10).unwrap();
        assert_eq!(s.recent.len(), 1);
        assert_eq!(s.recent[0].phase, Phase::Focus);
        assert_eq!(s.recent[0].duration_secs, 1500);
        assert_eq!(s.stats.today_sessions, 1);
        assert_eq!(s.stats.today_focus_min, 25);
        assert_eq!(s.streak.days, 1);

        assert!(summary(&db, day, 0).unwrap().recent.is_empty());
    }
}
