use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Focus,
    Break,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        matches!(self, Phase::Break | Phase::LongBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
            Phase::LongBreak => "longBreak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "focus" => Some(Phase::Focus),
            "break" => Some(Phase::Break),
            "longBreak" => Some(Phase::LongBreak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// A phase ended and the next one is waiting for `start()`.
    /// Only reachable with auto-advance turned off.
    Completed,
}

/// Result of leaving a phase: where the cycle goes next and the session
/// count that applies there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub completed: Phase,
    pub next: Phase,
    pub session_count: u32,
}

/// Pick the phase that follows `current`.
///
/// Focus goes to a long break every `sessions_until_long_break` sessions and
/// keeps the count; a break goes back to Focus and opens a new session.
pub fn next_phase(current: Phase, session_count: u32, sessions_until_long_break: u32) -> Transition {
    let cadence = sessions_until_long_break.max(1);
    match current {
        Phase::Focus => Transition {
            completed: current,
            next: if session_count % cadence == 0 {
                Phase::LongBreak
            } else {
                Phase::Break
            },
            session_count,
        },
        Phase::Break | Phase::LongBreak => Transition {
            completed: current,
            next: Phase::Focus,
            session_count: session_count.saturating_add(1),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_goes_to_short_break_without_increment() {
        let t = next_phase(Phase::Focus, 1, 4);
        assert_eq!(t.next, Phase::Break);
        assert_eq!(t.session_count, 1);
    }

    #[test]
    fn every_fourth_focus_goes_to_long_break() {
        for n in 1..=12u32 {
            let t = next_phase(Phase::Focus, n, 4);
            let expected = if n % 4 == 0 { Phase::LongBreak } else { Phase::Break };
            assert_eq!(t.next, expected, "session {n}");
        }
    }

    #[test]
    fn breaks_return_to_focus_and_increment() {
        assert_eq!(next_phase(Phase::Break, 3, 4).session_count, 4);
        let t = next_phase(Phase::LongBreak, 4, 4);
        assert_eq!(t.next, Phase::Focus);
        assert_eq!(t.session_count, 5);
    }

    #[test]
    fn cadence_of_one_always_long_breaks() {
        assert_eq!(next_phase(Phase::Focus, 7, 1).next, Phase::LongBreak);
    }

    #[test]
    fn phase_names_roundtrip() {
        for p in [Phase::Focus, Phase::Break, Phase::LongBreak] {
            assert_eq!(Phase::parse(p.as_str()), Some(p));
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
        }
        assert_eq!(Phase::parse("work"), None);
    }
}
