//! Activity type registry: structural rules and defaults per activity type
//!
//! The registry is a pure lookup table keyed by [`ActivityType`]. It answers
//! three questions for the editor and the validator:
//!
//! - how an activity of a given type is drawn (its visual kind)
//! - how many transitions may enter and leave it
//! - what payload it starts with, and which payload fields it requires

use crate::payload::{FORM_ID_KEY, FUNCTIONS_KEY, PAUSE_DURATION_KEY, ROLE_ID_KEY};
use crate::{ActivityData, ActivityType, FunctionRef, WorkflowError, WorkflowResult};
use serde_json::{json, Value};

/// Allowed number of transitions on one side of an activity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cardinality {
    /// Lower bound for a finished workflow
    ///
    /// Descriptive only: neither the editor nor save-time validation rejects
    /// a count below it, so a workflow holding a lone Start is save-ready.
    /// Renderers read it through [`Cardinality::allows`] to flag handles
    /// that still need a connection.
    pub min: u32,
    /// `None` means unbounded
    pub max: Option<u32>,
}

impl Cardinality {
    pub const fn exactly(n: u32) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: u32) -> Self {
        Self { min: n, max: None }
    }

    pub const fn any() -> Self {
        Self::at_least(0)
    }

    /// Whether `count` lies within both bounds, `min` included
    pub fn allows(&self, count: usize) -> bool {
        let count = count as u64;
        count >= u64::from(self.min) && self.max.map_or(true, |max| count <= u64::from(max))
    }

    /// Whether one more transition still fits under the maximum
    pub fn admits_another(&self, current: usize) -> bool {
        self.max
            .map_or(true, |max| (current as u64) < u64::from(max))
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, ∞)", self.min),
        }
    }
}

/// A payload field that is missing or out of range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Static knowledge about one activity type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityTypeEntry {
    pub activity_type: ActivityType,
    /// Rendering hint; opaque to the model
    pub visual_kind: &'static str,
    /// Label given to newly created activities
    pub default_label: &'static str,
    pub incoming: Cardinality,
    pub outgoing: Cardinality,
}

impl ActivityTypeEntry {
    fn standard(activity_type: ActivityType) -> Self {
        let (visual_kind, default_label, incoming, outgoing) = match activity_type {
            ActivityType::Start => (
                "startNode",
                "Start",
                Cardinality::exactly(0),
                Cardinality::at_least(1),
            ),
            ActivityType::End => (
                "endNode",
                "End",
                Cardinality::at_least(1),
                Cardinality::exactly(0),
            ),
            ActivityType::User => ("userNode", "User Task", Cardinality::any(), Cardinality::any()),
            ActivityType::System => (
                "systemNode",
                "System Task",
                Cardinality::any(),
                Cardinality::any(),
            ),
            ActivityType::Timer => ("timerNode", "Timer", Cardinality::any(), Cardinality::any()),
            ActivityType::MultiInnerWorkflow => (
                "multiInnerWorkflowNode",
                "Multi Inner Workflow",
                Cardinality::any(),
                Cardinality::any(),
            ),
            ActivityType::AwaitParallel => (
                "awaitParallelNode",
                "Await Parallel",
                Cardinality::any(),
                Cardinality::any(),
            ),
        };
        Self {
            activity_type,
            visual_kind,
            default_label,
            incoming,
            outgoing,
        }
    }
}

/// Lookup table of every activity type's structural rules
#[derive(Clone, Debug)]
pub struct ActivityTypeRegistry {
    /// Indexed by position in [`ActivityType::ALL`]
    entries: Vec<ActivityTypeEntry>,
}

impl ActivityTypeRegistry {
    /// The registry for the standard activity set
    pub fn standard() -> Self {
        Self {
            entries: ActivityType::ALL
                .into_iter()
                .map(ActivityTypeEntry::standard)
                .collect(),
        }
    }

    pub fn entry(&self, activity_type: ActivityType) -> &ActivityTypeEntry {
        &self.entries[activity_type as usize]
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityTypeEntry> {
        self.entries.iter()
    }

    pub fn visual_kind(&self, activity_type: ActivityType) -> &'static str {
        self.entry(activity_type).visual_kind
    }

    /// Inverse of [`Self::visual_kind`]
    pub fn type_for_visual_kind(&self, visual_kind: &str) -> Option<ActivityType> {
        self.entries
            .iter()
            .find(|e| e.visual_kind == visual_kind)
            .map(|e| e.activity_type)
    }

    /// Like [`Self::type_for_visual_kind`], failing on an unmapped kind
    pub fn parse_visual_kind(&self, visual_kind: &str) -> WorkflowResult<ActivityType> {
        self.type_for_visual_kind(visual_kind)
            .ok_or_else(|| WorkflowError::UnknownVisualKind(visual_kind.to_string()))
    }

    pub fn default_label(&self, activity_type: ActivityType) -> &'static str {
        self.entry(activity_type).default_label
    }

    pub fn incoming(&self, activity_type: ActivityType) -> Cardinality {
        self.entry(activity_type).incoming
    }

    pub fn outgoing(&self, activity_type: ActivityType) -> Cardinality {
        self.entry(activity_type).outgoing
    }

    /// Payload given to a newly created activity of this type
    pub fn default_data(&self, activity_type: ActivityType) -> ActivityData {
        match activity_type {
            ActivityType::User => ActivityData::new()
                .with(FORM_ID_KEY, Value::Null)
                .with(ROLE_ID_KEY, Value::Null)
                .with(FUNCTIONS_KEY, json!([])),
            ActivityType::System => ActivityData::new().with(FUNCTIONS_KEY, json!([])),
            ActivityType::Timer => ActivityData::new().with(PAUSE_DURATION_KEY, 0),
            ActivityType::Start
            | ActivityType::End
            | ActivityType::MultiInnerWorkflow
            | ActivityType::AwaitParallel => ActivityData::new(),
        }
    }

    /// Payload fields that are missing or out of range for this type
    pub fn required_fields(
        &self,
        activity_type: ActivityType,
        data: &ActivityData,
    ) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        match activity_type {
            ActivityType::Timer => check_pause_duration(data, &mut violations),
            ActivityType::User => {
                check_optional_string(data, FORM_ID_KEY, &mut violations);
                check_optional_string(data, ROLE_ID_KEY, &mut violations);
                check_functions(data, &mut violations);
            }
            ActivityType::System => check_functions(data, &mut violations),
            ActivityType::Start
            | ActivityType::End
            | ActivityType::MultiInnerWorkflow
            | ActivityType::AwaitParallel => {}
        }
        violations
    }
}

impl Default for ActivityTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_pause_duration(data: &ActivityData, violations: &mut Vec<FieldViolation>) {
    match data.get(PAUSE_DURATION_KEY) {
        None | Some(Value::Null) => violations.push(FieldViolation::new(
            PAUSE_DURATION_KEY,
            "is required for Timer activities",
        )),
        Some(value) => match value.as_i64() {
            Some(minutes) if minutes >= 0 => {}
            Some(minutes) => violations.push(FieldViolation::new(
                PAUSE_DURATION_KEY,
                format!("must be a non-negative number of minutes, got {minutes}"),
            )),
            // u64 values above i64::MAX are still non-negative integers
            None if value.is_u64() => {}
            None => violations.push(FieldViolation::new(
                PAUSE_DURATION_KEY,
                format!("must be an integer number of minutes, got {value}"),
            )),
        },
    }
}

fn check_optional_string(data: &ActivityData, key: &str, violations: &mut Vec<FieldViolation>) {
    match data.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(other) => violations.push(FieldViolation::new(
            key,
            format!("must be a string or null, got {other}"),
        )),
    }
}

fn check_functions(data: &ActivityData, violations: &mut Vec<FieldViolation>) {
    let items = match data.get(FUNCTIONS_KEY) {
        None | Some(Value::Null) => return,
        Some(Value::Array(items)) => items,
        Some(other) => {
            violations.push(FieldViolation::new(
                FUNCTIONS_KEY,
                format!("must be a list of function references, got {other}"),
            ));
            return;
        }
    };
    for (index, item) in items.iter().enumerate() {
        if serde_json::from_value::<FunctionRef>(item.clone()).is_err() {
            violations.push(FieldViolation::new(
                format!("{FUNCTIONS_KEY}[{index}]"),
                "must have a string functionId and a non-negative integer order",
            ));
        }
    }
}
