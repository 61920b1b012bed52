//! Workflow definitions: the persisted form of a designed workflow
//!
//! A Workflow is a directed graph where:
//! - Nodes are typed activities (Start, End, User, System, Timer, ...)
//! - Edges are transitions carrying control flow between activities
//!
//! The definition holds no presentation state. Screen positions and edge
//! styling live in the editor's graph projection and never reach this type.

use crate::{ActivityData, Transition, TransitionId, WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a stored workflow
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an activity within a workflow
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Workflow ─────────────────────────────────────────────────────────

/// A workflow definition: the canonical, persistence-ready graph
///
/// Intermediate states may break structural invariants; run
/// [`crate::validate`] before handing a definition to persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Store-assigned identifier, unset until the first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkflowId>,
    /// Human-readable name
    pub name: String,
    /// The activities (nodes) of the graph
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// The transitions (edges) of the graph
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Workflow {
    /// Create a new, unsaved, empty workflow
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            activities: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: WorkflowId) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether this workflow has never been saved
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Add an activity to the graph
    pub fn add_activity(&mut self, activity: Activity) -> WorkflowResult<()> {
        if self.activities.iter().any(|a| a.id == activity.id) {
            return Err(WorkflowError::DuplicateActivityId(activity.id));
        }
        self.activities.push(activity);
        Ok(())
    }

    /// Add a transition to the graph
    pub fn add_transition(&mut self, transition: Transition) -> WorkflowResult<()> {
        if self.activity(&transition.source_activity_id).is_none() {
            return Err(WorkflowError::ActivityNotFound(
                transition.source_activity_id,
            ));
        }
        if self.activity(&transition.target_activity_id).is_none() {
            return Err(WorkflowError::ActivityNotFound(
                transition.target_activity_id,
            ));
        }
        if self.transitions.iter().any(|t| t.id == transition.id) {
            return Err(WorkflowError::DuplicateTransitionId(transition.id));
        }
        self.transitions.push(transition);
        Ok(())
    }

    /// Get an activity by ID
    pub fn activity(&self, id: &ActivityId) -> Option<&Activity> {
        self.activities.iter().find(|a| &a.id == id)
    }

    /// Get a transition by ID
    pub fn transition(&self, id: &TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| &t.id == id)
    }

    /// All activities of type Start
    pub fn start_activities(&self) -> Vec<&Activity> {
        self.activities_of_type(ActivityType::Start)
    }

    /// All activities of type End
    pub fn end_activities(&self) -> Vec<&Activity> {
        self.activities_of_type(ActivityType::End)
    }

    pub fn activities_of_type(&self, activity_type: ActivityType) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.activity_type == activity_type)
            .collect()
    }

    /// Transitions leaving an activity
    pub fn outgoing(&self, id: &ActivityId) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| &t.source_activity_id == id)
            .collect()
    }

    /// Transitions entering an activity
    pub fn incoming(&self, id: &ActivityId) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| &t.target_activity_id == id)
            .collect()
    }

    /// Every activity and transition id, used to seed id allocation
    pub fn all_ids(&self) -> HashSet<String> {
        self.activities
            .iter()
            .map(|a| a.id.0.clone())
            .chain(self.transitions.iter().map(|t| t.id.0.clone()))
            .collect()
    }

    /// Total number of activities
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    /// Total number of transitions
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

// ── Activity ─────────────────────────────────────────────────────────

/// A step in the workflow graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier within this workflow
    pub id: ActivityId,
    /// What kind of step this is
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Type-specific payload
    #[serde(default)]
    pub data: ActivityData,
}

impl Activity {
    /// Create an activity with an empty payload
    pub fn new(id: impl Into<String>, activity_type: ActivityType, label: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(id),
            activity_type,
            label: label.into(),
            data: ActivityData::default(),
        }
    }

    /// Create a start activity
    pub fn start(id: impl Into<String>) -> Self {
        Self::new(id, ActivityType::Start, "Start")
    }

    /// Create an end activity
    pub fn end(id: impl Into<String>) -> Self {
        Self::new(id, ActivityType::End, "End")
    }

    /// Create a user task
    pub fn user(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, ActivityType::User, label)
    }

    /// Create a system task
    pub fn system(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, ActivityType::System, label)
    }

    /// Create a timer that pauses for the given number of minutes
    pub fn timer(id: impl Into<String>, pause_minutes: u64) -> Self {
        Self::new(id, ActivityType::Timer, "Timer")
            .with_data(ActivityData::default().with("pauseDuration", pause_minutes))
    }

    pub fn with_data(mut self, data: ActivityData) -> Self {
        self.data = data;
        self
    }

    pub fn is_start(&self) -> bool {
        self.activity_type == ActivityType::Start
    }

    pub fn is_end(&self) -> bool {
        self.activity_type == ActivityType::End
    }
}

// ── Activity Type ────────────────────────────────────────────────────

/// The closed set of activity kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    /// The entry point of the workflow
    Start,
    /// A terminal step
    End,
    /// A task performed by a person, optionally through a form
    User,
    /// A task performed by the platform through ordered functions
    System,
    /// A pause for a fixed number of minutes
    Timer,
    /// Runs an inner workflow once per item, in parallel
    MultiInnerWorkflow,
    /// Waits for parallel branches to finish
    AwaitParallel,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::Start,
        ActivityType::End,
        ActivityType::User,
        ActivityType::System,
        ActivityType::Timer,
        ActivityType::MultiInnerWorkflow,
        ActivityType::AwaitParallel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Start => "Start",
            ActivityType::End => "End",
            ActivityType::User => "User",
            ActivityType::System => "System",
            ActivityType::Timer => "Timer",
            ActivityType::MultiInnerWorkflow => "MultiInnerWorkflow",
            ActivityType::AwaitParallel => "AwaitParallel",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WorkflowError::UnknownActivityType(s.to_string()))
    }
}
