//! Session-related type definitions
//!
//! Supporting types for per-guild playback session state.

use serde::{Deserialize, Serialize};

/// Playback session state
///
/// `Transitioning` covers the window between the previous track ending and
/// the driver acknowledging the next start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing current
    #[default]
    Idle,
    /// A track is being rendered by the driver
    Playing,
    /// Waiting for the driver to acknowledge a start
    Transitioning,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Playing => write!(f, "playing"),
            SessionState::Transitioning => write!(f, "transitioning"),
        }
    }
}

/// How a render ended, as reported by the playback driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum CompletionOutcome {
    /// Natural end of track, or stopped on request
    Finished,
    /// Render aborted by an error
    Failed(String),
}

impl std::fmt::Display for CompletionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionOutcome::Finished => write!(f, "finished"),
            CompletionOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_serde() {
        let json = serde_json::to_string(&SessionState::Transitioning).unwrap();
        assert_eq!(json, "\"transitioning\"");
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert!(SessionState::Idle.is_idle());
        assert!(!SessionState::Playing.is_idle());
    }

    #[test]
    fn test_completion_outcome_display() {
        assert_eq!(CompletionOutcome::Finished.to_string(), "finished");
        assert_eq!(
            CompletionOutcome::Failed("stream reset".to_string()).to_string(),
            "failed: stream reset"
        );
    }
}
