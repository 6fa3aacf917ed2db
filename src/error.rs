use thiserror::Error;

use crate::models::ExerciseId;

/// Errors raised by the session core.
///
/// `InvalidStateTransition`, `InvalidIndex` and `NotFound` are caller bugs.
/// `SuggestionUnavailable` is always recovered by the fallback policy and only
/// logged. `ImportFailed` is the one meant to reach the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("`{action}` is not allowed while the session is {phase}")]
    InvalidStateTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("set index {index} out of range for exercise {exercise_id} ({sets} sets)")]
    InvalidIndex {
        exercise_id: ExerciseId,
        index: usize,
        sets: u32,
    },

    #[error("no exercise with id {0}")]
    NotFound(ExerciseId),

    #[error("suggestions unavailable: {0}")]
    SuggestionUnavailable(String),

    #[error("could not import workout plan: {0}")]
    ImportFailed(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
