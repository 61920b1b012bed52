//! Workflow transitions: directed control flow between activities

use crate::ActivityId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a transition within a workflow
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub String);

impl TransitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge in the workflow graph
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Unique identifier within this workflow
    pub id: TransitionId,
    /// Activity control flows out of
    pub source_activity_id: ActivityId,
    /// Activity control flows into
    pub target_activity_id: ActivityId,
    /// How the execution engine treats this transition
    #[serde(default)]
    pub transition_kind: TransitionKind,
}

impl Transition {
    /// Create a standard transition
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: TransitionId::new(id),
            source_activity_id: ActivityId::new(source),
            target_activity_id: ActivityId::new(target),
            transition_kind: TransitionKind::Standard,
        }
    }

    pub fn with_kind(mut self, kind: TransitionKind) -> Self {
        self.transition_kind = kind;
        self
    }

    /// Whether either endpoint is the given activity
    pub fn touches(&self, activity_id: &ActivityId) -> bool {
        &self.source_activity_id == activity_id || &self.target_activity_id == activity_id
    }
}

/// The meaning of a transition for the execution engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Unconditional hand-off to the target
    #[default]
    Standard,
    /// Taken only when the source's outcome matches a condition
    Conditional,
    /// Taken when the source exceeds its allotted time
    Timeout,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransitionKind::Standard => "Standard",
            TransitionKind::Conditional => "Conditional",
            TransitionKind::Timeout => "Timeout",
        };
        f.write_str(name)
    }
}
