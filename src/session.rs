use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::text::{Difficulty, Language};

/// What a session is asked to measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub language: Language,
    pub difficulty: Difficulty,
}

impl SessionConfig {
    pub fn new(language: Language, difficulty: Difficulty) -> Self {
        Self {
            language,
            difficulty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// nothing typed yet, no timer
    #[default]
    Idle,
    /// timer active, input accepted
    Running,
    /// terminal until reset, input locked
    Completed,
}

impl SessionState {
    pub fn accepts_input(&self) -> bool {
        !matches!(self, SessionState::Completed)
    }
}

/// Final numbers of a session, produced exactly once on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// characters per minute
    pub speed: u32,
    pub accuracy: u8,
    pub elapsed_secs: u64,
    pub language: Language,
    pub difficulty: Difficulty,
    pub completed_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn completed_state_locks_input() {
        assert!(SessionState::Idle.accepts_input());
        assert!(SessionState::Running.accepts_input());
        assert!(!SessionState::Completed.accepts_input());
    }

    #[test]
    fn session_result_serializes_with_lowercase_codes() {
        let result = SessionResult {
            speed: 240,
            accuracy: 97,
            elapsed_secs: 31,
            language: Language::En,
            difficulty: Difficulty::Hard,
            completed_at: Local::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["language"], "en");
        assert_eq!(json["difficulty"], "hard");
        assert_eq!(json["speed"], 240);
    }
}
