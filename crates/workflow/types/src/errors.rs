//! Error types for the workflow model

use crate::{ActivityId, TransitionId};

/// Errors raised while building or parsing a workflow model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Duplicate activity ID: {0}")]
    DuplicateActivityId(ActivityId),

    #[error("Duplicate transition ID: {0}")]
    DuplicateTransitionId(TransitionId),

    #[error("Activity not found: {0}")]
    ActivityNotFound(ActivityId),

    #[error("Unknown activity type: '{0}'")]
    UnknownActivityType(String),

    #[error("Unknown visual kind: '{0}'")]
    UnknownVisualKind(String),
}

/// Result type alias for workflow model operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
