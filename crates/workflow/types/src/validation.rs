//! Validation: whole-graph structural checks run before a workflow is saved
//!
//! Unlike the editor, which only enforces per-edit rules, validation looks at
//! the workflow as a whole. Every check runs independently and all findings
//! are reported, so the user can fix everything in one pass.

use crate::{ActivityId, ActivityTypeRegistry, Workflow};
use std::collections::{HashMap, HashSet};

/// The kind of structural defect a [`Violation`] reports
///
/// Variants are declared in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationCategory {
    MissingStart,
    MultipleStart,
    StartHasIncoming,
    EndHasOutgoing,
    DanglingTransition,
    Unreachable,
    MissingRequiredField,
    DuplicateId,
}

impl std::fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViolationCategory::MissingStart => "MissingStart",
            ViolationCategory::MultipleStart => "MultipleStart",
            ViolationCategory::StartHasIncoming => "StartHasIncoming",
            ViolationCategory::EndHasOutgoing => "EndHasOutgoing",
            ViolationCategory::DanglingTransition => "DanglingTransition",
            ViolationCategory::Unreachable => "Unreachable",
            ViolationCategory::MissingRequiredField => "MissingRequiredField",
            ViolationCategory::DuplicateId => "DuplicateId",
        };
        f.write_str(name)
    }
}

/// A single structural defect
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    pub category: ViolationCategory,
    /// Offending activity and/or transition ids
    pub subject_ids: Vec<String>,
    pub message: String,
}

impl Violation {
    fn new(category: ViolationCategory, subject_ids: Vec<String>, message: String) -> Self {
        Self {
            category,
            subject_ids,
            message,
        }
    }

    /// Whether this violation names the given id
    pub fn concerns(&self, id: &str) -> bool {
        self.subject_ids.iter().any(|s| s == id)
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Validate a workflow against the standard registry
pub fn validate(workflow: &Workflow) -> Vec<Violation> {
    validate_with(&ActivityTypeRegistry::standard(), workflow)
}

/// Whether the workflow can be handed to persistence
pub fn is_save_ready(workflow: &Workflow) -> bool {
    validate(workflow).is_empty()
}

/// Validate a workflow; the result is empty iff the workflow is save-ready
///
/// Results are sorted by category, then subject ids, then message.
pub fn validate_with(registry: &ActivityTypeRegistry, workflow: &Workflow) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_start(workflow, &mut violations);
    check_end_outgoing(workflow, &mut violations);
    check_dangling(workflow, &mut violations);
    check_reachability(workflow, &mut violations);
    check_required_fields(registry, workflow, &mut violations);
    check_duplicate_ids(workflow, &mut violations);
    violations.sort();
    violations
}

fn check_start(workflow: &Workflow, violations: &mut Vec<Violation>) {
    let starts = workflow.start_activities();
    match starts.len() {
        0 => violations.push(Violation::new(
            ViolationCategory::MissingStart,
            Vec::new(),
            "Workflow must have a Start activity".into(),
        )),
        1 => {}
        n => violations.push(Violation::new(
            ViolationCategory::MultipleStart,
            starts.iter().map(|a| a.id.0.clone()).collect(),
            format!("Workflow must have exactly one Start activity, found {n}"),
        )),
    }

    for start in starts {
        for t in workflow.incoming(&start.id) {
            violations.push(Violation::new(
                ViolationCategory::StartHasIncoming,
                vec![start.id.0.clone(), t.id.0.clone()],
                format!(
                    "Start activity '{}' has incoming transition '{}'",
                    start.id, t.id
                ),
            ));
        }
    }
}

fn check_end_outgoing(workflow: &Workflow, violations: &mut Vec<Violation>) {
    for end in workflow.end_activities() {
        for t in workflow.outgoing(&end.id) {
            violations.push(Violation::new(
                ViolationCategory::EndHasOutgoing,
                vec![end.id.0.clone(), t.id.0.clone()],
                format!(
                    "End activity '{}' has outgoing transition '{}'",
                    end.id, t.id
                ),
            ));
        }
    }
}

fn check_dangling(workflow: &Workflow, violations: &mut Vec<Violation>) {
    let ids: HashSet<&ActivityId> = workflow.activities.iter().map(|a| &a.id).collect();

    for t in &workflow.transitions {
        for (end, endpoint) in [
            ("source", &t.source_activity_id),
            ("target", &t.target_activity_id),
        ] {
            if !ids.contains(endpoint) {
                violations.push(Violation::new(
                    ViolationCategory::DanglingTransition,
                    vec![t.id.0.clone(), endpoint.0.clone()],
                    format!(
                        "Transition '{}' references non-existent {end} activity '{endpoint}'",
                        t.id
                    ),
                ));
            }
        }
    }
}

fn check_reachability(workflow: &Workflow, violations: &mut Vec<Violation>) {
    let starts = workflow.start_activities();
    if starts.is_empty() {
        return;
    }

    let mut successors: HashMap<&ActivityId, Vec<&ActivityId>> = HashMap::new();
    for t in &workflow.transitions {
        successors
            .entry(&t.source_activity_id)
            .or_default()
            .push(&t.target_activity_id);
    }

    let mut visited: HashSet<&ActivityId> = HashSet::new();
    let mut queue: Vec<&ActivityId> = starts.iter().map(|a| &a.id).collect();
    while let Some(current) = queue.pop() {
        if visited.insert(current) {
            for &next in successors.get(current).into_iter().flatten() {
                if !visited.contains(next) {
                    queue.push(next);
                }
            }
        }
    }

    // Duplicate ids are reported once under DuplicateId, not here
    let mut reported = HashSet::new();
    for activity in &workflow.activities {
        if !visited.contains(&activity.id) && reported.insert(&activity.id) {
            violations.push(Violation::new(
                ViolationCategory::Unreachable,
                vec![activity.id.0.clone()],
                format!(
                    "{} activity '{}' is not reachable from Start",
                    activity.activity_type, activity.id
                ),
            ));
        }
    }
}

fn check_required_fields(
    registry: &ActivityTypeRegistry,
    workflow: &Workflow,
    violations: &mut Vec<Violation>,
) {
    for activity in &workflow.activities {
        for field in registry.required_fields(activity.activity_type, &activity.data) {
            violations.push(Violation::new(
                ViolationCategory::MissingRequiredField,
                vec![activity.id.0.clone()],
                format!(
                    "{} activity '{}': field '{}' {}",
                    activity.activity_type, activity.id, field.field, field.reason
                ),
            ));
        }
    }
}

fn check_duplicate_ids(workflow: &Workflow, violations: &mut Vec<Violation>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in workflow
        .activities
        .iter()
        .map(|a| a.id.as_str())
        .chain(workflow.transitions.iter().map(|t| t.id.as_str()))
    {
        *counts.entry(id).or_default() += 1;
    }

    for (id, count) in counts {
        if count > 1 {
            violations.push(Violation::new(
                ViolationCategory::DuplicateId,
                vec![id.to_string()],
                format!("Id '{id}' is used {count} times"),
            ));
        }
    }
}
