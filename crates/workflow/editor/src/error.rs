//! Error types for the editor layer

use workflow_types::{ActivityId, ActivityType, TransitionId, Violation, WorkflowId};

/// Errors returned by editor operations
///
/// `NotFound` and `Validation` describe expected outcomes of user actions
/// and are recovered where the action was attempted. `Persistence` and
/// `MalformedGraph` describe boundary failures and defects.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Not found: {0}")]
    NotFound(NotFound),

    #[error("Rejected: {0}")]
    Validation(ConstraintViolation),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Identifier collision: no unique '{prefix}' id after {attempts} attempts")]
    IdentifierCollision { prefix: String, attempts: u32 },
}

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::NotFound(_) => ErrorKind::NotFound,
            EditorError::Validation(_) => ErrorKind::Validation,
            EditorError::Persistence(_) => ErrorKind::Persistence,
            EditorError::MalformedGraph(_) => ErrorKind::MalformedGraph,
            EditorError::IdentifierCollision { .. } => ErrorKind::IdentifierCollision,
        }
    }

    /// Whether the caller should treat this as an ordinary rejected action
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Validation)
    }

    pub(crate) fn activity_not_found(id: &ActivityId) -> Self {
        EditorError::NotFound(NotFound::Activity(id.clone()))
    }

    pub(crate) fn transition_not_found(id: &TransitionId) -> Self {
        EditorError::NotFound(NotFound::Transition(id.clone()))
    }
}

/// Coarse classification of an [`EditorError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Persistence,
    MalformedGraph,
    IdentifierCollision,
}

/// What could not be found
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFound {
    Activity(ActivityId),
    Transition(TransitionId),
    Workflow(WorkflowId),
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Activity(id) => write!(f, "activity {id}"),
            NotFound::Transition(id) => write!(f, "transition {id}"),
            NotFound::Workflow(id) => write!(f, "workflow {id}"),
        }
    }
}

/// A structural rule an edit or save request would break
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("{activity_type} activity '{activity_id}' allows at most {max} outgoing transition(s)")]
    OutgoingLimit {
        activity_id: ActivityId,
        activity_type: ActivityType,
        max: u32,
    },

    #[error("{activity_type} activity '{activity_id}' allows at most {max} incoming transition(s)")]
    IncomingLimit {
        activity_id: ActivityId,
        activity_type: ActivityType,
        max: u32,
    },

    #[error("a transition from '{source_id}' to '{target_id}' already exists")]
    DuplicateConnection {
        source_id: ActivityId,
        target_id: ActivityId,
    },

    #[error("label of activity '{activity_id}' must be a string")]
    InvalidLabel { activity_id: ActivityId },

    #[error("workflow is not save-ready ({} violation(s))", .0.len())]
    NotSaveReady(Vec<Violation>),
}

/// Failures at the persistence boundary
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Workflow not found: {0}")]
    NotFound(WorkflowId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected the workflow: {0}")]
    Rejected(String),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type alias for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
