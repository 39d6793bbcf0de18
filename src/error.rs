//! Error types
//!
//! Only programmer misuse and bad tuning data surface as errors. Expected
//! gameplay conditions (missing visuals, despawns, idle wave director) are
//! handled where they occur.

use thiserror::Error;

/// Fatal simulation misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// A transition named a state that was never registered
    #[error("transition to unregistered state {0}")]
    UnregisteredState(String),
    /// `tick` was called before the machine entered its first state
    #[error("tick called before the state machine was started")]
    NotStarted,
}

/// Rejected tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
