//! End-to-end editing scenarios driven through the public session API

use serde_json::{json, Map, Value};
use workflow_editor::*;
use workflow_types::{ActivityId, ActivityType, TransitionKind, ViolationCategory};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn counter_config() -> EditorConfig {
    EditorConfig::default().with_id_strategy(IdStrategy::Counter)
}

fn patch(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

struct Linear {
    session: EditorSession,
    start: ActivityId,
    user: ActivityId,
    end: ActivityId,
}

/// Start → User → End, built one command at a time
fn linear_workflow() -> Linear {
    let mut session = EditorSession::with_start("Linear", counter_config()).unwrap();
    let start = session.graph().nodes[0].id.clone();

    let user = session.add_activity(ActivityType::User).unwrap().id;
    session
        .connect(&start, &user, TransitionKind::Standard)
        .unwrap();
    let end = session.add_activity(ActivityType::End).unwrap().id;
    session.connect(&user, &end, TransitionKind::Standard).unwrap();

    Linear {
        session,
        start,
        user,
        end,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn linear_workflow_is_valid() {
    let mut linear = linear_workflow();
    assert_eq!(linear.session.graph().node_count(), 3);
    assert_eq!(linear.session.graph().edge_count(), 2);
    assert!(linear.session.validate().unwrap().is_empty());
}

#[test]
fn deleting_middle_activity_leaves_end_unreachable() {
    let mut linear = linear_workflow();
    let removed = linear.session.delete_activity(&linear.user).unwrap();

    assert_eq!(removed.len(), 2);
    assert_eq!(linear.session.graph().edge_count(), 0);

    let violations = linear.session.validate().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].category, ViolationCategory::Unreachable);
    assert_eq!(violations[0].subject_ids, vec![linear.end.to_string()]);
}

#[test]
fn end_to_start_is_rejected_without_side_effects() {
    let mut linear = linear_workflow();
    let before = linear.session.graph().clone();

    let err = linear
        .session
        .connect(&linear.end, &linear.start, TransitionKind::Standard)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        EditorError::Validation(ConstraintViolation::OutgoingLimit { .. })
    ));
    assert_eq!(linear.session.graph(), &before);
}

#[test]
fn payload_range_is_checked_at_save_time_only() {
    let mut linear = linear_workflow();
    let timer = linear.session.add_activity(ActivityType::Timer).unwrap().id;
    linear
        .session
        .connect(&linear.user, &timer, TransitionKind::Timeout)
        .unwrap();
    linear
        .session
        .connect(&timer, &linear.end, TransitionKind::Standard)
        .unwrap();

    linear
        .session
        .update_activity_data(&timer, patch(json!({"pauseDuration": -5})))
        .unwrap();
    assert_eq!(
        linear.session.graph().node(&timer).unwrap().data.get("pauseDuration"),
        Some(&json!(-5))
    );

    let violations = linear.session.validate().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].category, ViolationCategory::MissingRequiredField);
    assert!(violations[0].concerns(timer.as_str()));

    assert!(matches!(
        linear.session.begin_save(),
        Err(EditorError::Validation(ConstraintViolation::NotSaveReady(_)))
    ));
}

#[test]
fn delete_removes_incoming_and_outgoing_only() {
    let mut session = EditorSession::with_start("Fan", counter_config()).unwrap();
    let start = session.graph().nodes[0].id.clone();
    let hub = session.add_activity(ActivityType::System).unwrap().id;
    let left = session.add_activity(ActivityType::User).unwrap().id;
    let right = session.add_activity(ActivityType::User).unwrap().id;

    session.connect(&start, &hub, TransitionKind::Standard).unwrap();
    session.connect(&hub, &left, TransitionKind::Standard).unwrap();
    session
        .connect(&hub, &right, TransitionKind::Conditional)
        .unwrap();
    let kept = session
        .connect(&left, &right, TransitionKind::Standard)
        .unwrap();

    let removed = session.delete_activity(&hub).unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(session.graph().edge_count(), 1);
    assert_eq!(session.graph().edges[0].id, kept.id);
}

#[test]
fn commands_report_not_found() {
    let mut session = EditorSession::with_start("Missing", counter_config()).unwrap();
    let ghost = ActivityId::new("ghost");

    let err = session
        .apply(EditorCommand::DeleteActivity { id: ghost.clone() })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = session
        .apply(EditorCommand::MoveActivity {
            id: ghost,
            position: Position::new(0.0, 0.0),
        })
        .unwrap_err();
    assert!(matches!(err, EditorError::NotFound(NotFound::Activity(_))));
}

#[test]
fn moving_nodes_does_not_change_the_model() {
    let mut linear = linear_workflow();
    let before = linear.session.snapshot().unwrap();

    linear
        .session
        .apply(EditorCommand::MoveActivity {
            id: linear.user.clone(),
            position: Position::new(640.0, 480.0),
        })
        .unwrap();

    assert_eq!(linear.session.snapshot().unwrap(), before);
    assert_eq!(
        linear.session.layout().position(&linear.user),
        Some(Position::new(640.0, 480.0))
    );
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_then_reopen_with_layout() {
    let store = InMemoryWorkflowStore::new();
    let mut linear = linear_workflow();
    linear
        .session
        .move_activity(&linear.end, Position::new(900.0, 100.0))
        .unwrap();

    let outcome = linear.session.save(&store).await.unwrap();
    assert!(outcome.is_saved());
    let id = linear.session.workflow_id().cloned().unwrap();
    let layout = linear.session.layout();

    let stored = store.load(&id).await.unwrap();
    let reopened = EditorSession::from_workflow(stored, &layout, counter_config());
    assert_eq!(reopened.graph(), linear.session.graph());
}

#[tokio::test]
async fn resave_keeps_workflow_id() {
    let store = InMemoryWorkflowStore::new();
    let mut linear = linear_workflow();

    linear.session.save(&store).await.unwrap();
    let first = linear.session.workflow_id().cloned().unwrap();

    linear.session.rename("Linear v2");
    linear.session.save(&store).await.unwrap();

    assert_eq!(linear.session.workflow_id(), Some(&first));
    assert_eq!(store.revision(&first).await, Some(2));
    assert_eq!(store.load(&first).await.unwrap().name, "Linear v2");
}

#[tokio::test]
async fn reopened_session_never_reuses_ids() {
    let store = InMemoryWorkflowStore::new();
    let mut linear = linear_workflow();
    linear.session.save(&store).await.unwrap();
    let id = linear.session.workflow_id().cloned().unwrap();

    let mut reopened = EditorSession::open(&store, &id, counter_config())
        .await
        .unwrap();
    let existing: Vec<String> = reopened
        .graph()
        .nodes
        .iter()
        .map(|n| n.id.to_string())
        .chain(reopened.graph().edges.iter().map(|e| e.id.to_string()))
        .collect();

    let fresh = reopened.add_activity(ActivityType::System).unwrap();
    let edge = reopened
        .connect(&linear.user, &fresh.id, TransitionKind::Standard)
        .unwrap();

    assert!(!existing.contains(&fresh.id.to_string()));
    assert!(!existing.contains(&edge.id.to_string()));
}

#[tokio::test]
async fn save_racing_with_close_is_discarded() {
    let store = InMemoryWorkflowStore::new();
    let mut linear = linear_workflow();

    let request = linear.session.begin_save().unwrap();
    linear.session.close();
    assert!(!linear.session.is_open());

    let outcome = request.send(&store).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Discarded);
    assert!(linear.session.complete_save(outcome).is_none());
    assert!(linear.session.workflow_id().is_none());
}

#[tokio::test]
async fn store_failure_is_a_persistence_error() {
    let store = InMemoryWorkflowStore::new();
    store.set_unavailable(true);
    let mut linear = linear_workflow();
    let before = linear.session.graph().clone();

    let err = linear.session.save(&store).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(!err.is_recoverable());
    assert_eq!(linear.session.graph(), &before);
    assert!(linear.session.workflow_id().is_none());
}
