//! Property tests for the editor: projection round trip, save-readiness of
//! edited graphs, delete cascade and id uniqueness.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use workflow_editor::*;
use workflow_types::{
    Activity, ActivityId, ActivityType, ActivityTypeRegistry, Transition, TransitionKind,
    Workflow, WorkflowId,
};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_activity_type() -> impl Strategy<Value = ActivityType> {
    prop::sample::select(ActivityType::ALL.to_vec())
}

fn arb_transition_kind() -> impl Strategy<Value = TransitionKind> {
    prop_oneof![
        Just(TransitionKind::Standard),
        Just(TransitionKind::Conditional),
        Just(TransitionKind::Timeout),
    ]
}

/// A workflow with arbitrary activities and transitions between them
fn arb_workflow() -> impl Strategy<Value = Workflow> {
    let activities = prop::collection::vec(("[A-Za-z ]{0,12}", arb_activity_type()), 1..12);
    (
        activities,
        prop::collection::vec(
            (
                any::<prop::sample::Index>(),
                any::<prop::sample::Index>(),
                arb_transition_kind(),
            ),
            0..20,
        ),
        prop::option::of("[a-z0-9-]{4,12}"),
        "[A-Za-z ]{1,20}",
    )
        .prop_map(|(activities, edges, id, name)| {
            let registry = ActivityTypeRegistry::standard();
            let mut wf = Workflow::new(name);
            wf.id = id.map(WorkflowId::new);
            for (i, (label, t)) in activities.iter().enumerate() {
                wf.activities.push(
                    Activity::new(format!("a{i}"), *t, label.clone())
                        .with_data(registry.default_data(*t)),
                );
            }
            let n = wf.activities.len();
            for (i, (from, to, kind)) in edges.into_iter().enumerate() {
                let source = wf.activities[from.index(n)].id.clone();
                let target = wf.activities[to.index(n)].id.clone();
                wf.transitions.push(
                    Transition::new(format!("t{i}"), source.0, target.0).with_kind(kind),
                );
            }
            wf
        })
}

/// An edit, with node and edge references resolved against the current graph
#[derive(Clone, Debug)]
enum Edit {
    Add(ActivityType),
    Connect(prop::sample::Index, prop::sample::Index, TransitionKind),
    Delete(prop::sample::Index),
    Disconnect(prop::sample::Index),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => arb_activity_type().prop_map(Edit::Add),
        4 => (any::<prop::sample::Index>(), any::<prop::sample::Index>(), arb_transition_kind())
            .prop_map(|(a, b, k)| Edit::Connect(a, b, k)),
        1 => any::<prop::sample::Index>().prop_map(Edit::Delete),
        1 => any::<prop::sample::Index>().prop_map(Edit::Disconnect),
    ]
}

fn command_for(graph: &EditorGraph, edit: &Edit) -> Option<EditorCommand> {
    let node = |i: &prop::sample::Index| {
        (!graph.nodes.is_empty()).then(|| graph.nodes[i.index(graph.nodes.len())].id.clone())
    };
    match edit {
        Edit::Add(activity_type) => Some(EditorCommand::AddActivity {
            activity_type: *activity_type,
        }),
        Edit::Connect(a, b, kind) => Some(EditorCommand::Connect {
            source: node(a)?,
            target: node(b)?,
            kind: *kind,
        }),
        Edit::Delete(i) => Some(EditorCommand::DeleteActivity { id: node(i)? }),
        Edit::Disconnect(i) => (!graph.edges.is_empty()).then(|| EditorCommand::Disconnect {
            id: graph.edges[i.index(graph.edges.len())].id.clone(),
        }),
    }
}

/// Exactly one Start, no End with outgoing edges, every node reachable
fn structurally_sound(graph: &EditorGraph) -> bool {
    let starts: Vec<&ActivityId> = graph
        .nodes
        .iter()
        .filter(|n| n.visual_kind == "startNode")
        .map(|n| &n.id)
        .collect();
    if starts.len() != 1 {
        return false;
    }
    let end_has_outgoing = graph
        .nodes
        .iter()
        .filter(|n| n.visual_kind == "endNode")
        .any(|n| graph.outgoing_count(&n.id) > 0);
    if end_has_outgoing {
        return false;
    }

    let mut successors: HashMap<&ActivityId, Vec<&ActivityId>> = HashMap::new();
    for e in &graph.edges {
        successors.entry(&e.source).or_default().push(&e.target);
    }
    let mut seen = HashSet::new();
    let mut stack = vec![starts[0]];
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            stack.extend(successors.get(id).into_iter().flatten().copied());
        }
    }
    seen.len() == graph.nodes.len()
}

fn counter_config() -> EditorConfig {
    EditorConfig::default().with_id_strategy(IdStrategy::Counter)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Projecting to the graph and back yields the same workflow.
    #[test]
    fn projection_round_trip(wf in arb_workflow()) {
        let projection = GraphProjection::default();
        let graph = projection.from_model(&wf);
        let back = projection.to_model(&graph, wf.id.clone(), &wf.name).unwrap();
        prop_assert_eq!(back, wf);
    }

    /// Node positions are irrelevant to the projected workflow.
    #[test]
    fn positions_never_reach_the_model(
        wf in arb_workflow(),
        xs in prop::collection::vec(-5000.0f64..5000.0, 12),
    ) {
        let projection = GraphProjection::default();
        let mut graph = projection.from_model(&wf);
        for (node, x) in graph.nodes.iter_mut().zip(xs) {
            node.position = Position::new(x, -x);
        }
        prop_assert_eq!(projection.to_model(&graph, wf.id.clone(), &wf.name).unwrap(), wf);
    }

    /// Starting from a lone Start, any edit sequence yields a workflow that
    /// validates cleanly exactly when it is structurally sound.
    #[test]
    fn clean_validation_iff_sound(edits in prop::collection::vec(arb_edit(), 0..40)) {
        let mut session = EditorSession::with_start("Random", counter_config()).unwrap();
        for edit in &edits {
            if let Some(command) = command_for(session.graph(), edit) {
                let _ = session.apply(command);
            }
        }

        let sound = structurally_sound(session.graph());
        let violations = session.validate().unwrap();
        prop_assert_eq!(violations.is_empty(), sound, "violations: {:?}", violations);
    }

    /// Deleting an activity removes exactly its incident edges.
    #[test]
    fn delete_cascades_exactly(
        edits in prop::collection::vec(arb_edit(), 1..40),
        victim in any::<prop::sample::Index>(),
    ) {
        let mut session = EditorSession::with_start("Cascade", counter_config()).unwrap();
        for edit in &edits {
            if let Some(command) = command_for(session.graph(), edit) {
                let _ = session.apply(command);
            }
        }
        prop_assume!(!session.graph().nodes.is_empty());

        let graph = session.graph().clone();
        let id = graph.nodes[victim.index(graph.nodes.len())].id.clone();
        let incident: Vec<_> = graph.incident_edges(&id).iter().map(|e| e.id.clone()).collect();

        let removed = session.delete_activity(&id).unwrap();
        prop_assert_eq!(&removed, &incident);
        prop_assert_eq!(session.graph().edge_count(), graph.edge_count() - incident.len());
        for edge in &graph.edges {
            let still_there = session.graph().edge(&edge.id).is_some();
            prop_assert_eq!(still_there, !edge.touches(&id));
        }
    }

    /// A session reopened from any workflow never reissues an existing id.
    #[test]
    fn seeded_ids_are_never_reissued(wf in arb_workflow(), adds in 1usize..20) {
        let existing = wf.all_ids();
        let mut session = EditorSession::from_workflow(wf, &NodeLayout::new(), counter_config());
        for _ in 0..adds {
            let node = session.add_activity(ActivityType::User).unwrap();
            prop_assert!(!existing.contains(node.id.as_str()));
        }
    }
}

#[test]
fn ten_thousand_ids_are_distinct() {
    for strategy in [IdStrategy::Uuid, IdStrategy::Counter] {
        let mut alloc = IdentifierAllocator::new(strategy, 8);
        let ids: HashSet<String> = (0..10_000)
            .map(|_| alloc.generate(ACTIVITY_PREFIX).unwrap())
            .collect();
        assert_eq!(ids.len(), 10_000);
        assert_eq!(alloc.taken_count(), 10_000);
    }
}
