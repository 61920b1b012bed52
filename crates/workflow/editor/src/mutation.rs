//! Mutation engine: the only code path that changes the editable graph
//!
//! Every operation either applies completely or leaves the graph untouched.
//! Structural rules from the activity type registry (how many transitions
//! may enter or leave an activity) are enforced here, at edit time. Payload
//! contents are not checked until save-time validation.

use crate::allocator::IdentifierAllocator;
use crate::error::{ConstraintViolation, EditorError, EditorResult};
use crate::graph::{EditorGraph, GraphEdge, GraphNode, Position};
use crate::projection::GraphProjection;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use workflow_types::payload::LABEL_KEY;
use workflow_types::{Activity, ActivityId, ActivityType, Transition, TransitionId, TransitionKind};

/// Applies user intents to an [`EditorGraph`]
#[derive(Clone, Debug, Default)]
pub struct MutationEngine {
    projection: GraphProjection,
}

impl MutationEngine {
    pub fn new(projection: GraphProjection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &GraphProjection {
        &self.projection
    }

    /// Insert a new, unconnected activity with its type's default payload
    pub fn add_activity(
        &self,
        graph: &mut EditorGraph,
        allocator: &mut IdentifierAllocator,
        activity_type: ActivityType,
    ) -> EditorResult<GraphNode> {
        let registry = self.projection.registry();
        let id = allocator.activity_id()?;
        let activity = Activity {
            id,
            activity_type,
            label: registry.default_label(activity_type).to_string(),
            data: registry.default_data(activity_type),
        };
        let position = self.projection.placement().slot(graph.node_count());
        let node = self.projection.node_for(&activity, position);

        graph.nodes.push(node.clone());
        debug!(activity_id = %node.id, %activity_type, "Activity added");
        Ok(node)
    }

    /// Shallow-merge `patch` into the node's data
    ///
    /// Payload values are not range-checked here; only the `label` key must
    /// be a string, since it maps onto the activity label.
    pub fn update_activity_data(
        &self,
        graph: &mut EditorGraph,
        id: &ActivityId,
        patch: Map<String, Value>,
    ) -> EditorResult<()> {
        let node = graph.node_mut(id).ok_or_else(|| {
            warn!(activity_id = %id, "Update of unknown activity ignored");
            EditorError::activity_not_found(id)
        })?;

        if matches!(patch.get(LABEL_KEY), Some(label) if !label.is_string()) {
            warn!(activity_id = %id, "Rejected non-string label");
            return Err(EditorError::Validation(ConstraintViolation::InvalidLabel {
                activity_id: id.clone(),
            }));
        }

        let keys = patch.len();
        node.data.extend(patch);
        debug!(activity_id = %id, keys, "Activity data updated");
        Ok(())
    }

    /// Remove the node and every edge entering or leaving it
    ///
    /// Returns the ids of the removed edges.
    pub fn delete_activity(
        &self,
        graph: &mut EditorGraph,
        id: &ActivityId,
    ) -> EditorResult<Vec<TransitionId>> {
        let index = graph.nodes.iter().position(|n| &n.id == id).ok_or_else(|| {
            warn!(activity_id = %id, "Delete of unknown activity ignored");
            EditorError::activity_not_found(id)
        })?;

        graph.nodes.remove(index);
        let mut removed = Vec::new();
        graph.edges.retain(|e| {
            if e.touches(id) {
                removed.push(e.id.clone());
                false
            } else {
                true
            }
        });

        debug!(activity_id = %id, removed_edges = removed.len(), "Activity deleted");
        Ok(removed)
    }

    /// Draw a transition from `source` to `target`
    ///
    /// Rejected when either endpoint is unknown, when the source already has
    /// as many outgoing transitions as its type allows, when the target
    /// already has as many incoming transitions as its type allows, or when
    /// the same ordered pair is already connected.
    pub fn connect(
        &self,
        graph: &mut EditorGraph,
        allocator: &mut IdentifierAllocator,
        source: &ActivityId,
        target: &ActivityId,
        kind: TransitionKind,
    ) -> EditorResult<GraphEdge> {
        let source_type = self.activity_type_of(graph, source)?;
        let target_type = self.activity_type_of(graph, target)?;
        let registry = self.projection.registry();

        let outgoing = registry.outgoing(source_type);
        if !outgoing.admits_another(graph.outgoing_count(source)) {
            return Err(reject(ConstraintViolation::OutgoingLimit {
                activity_id: source.clone(),
                activity_type: source_type,
                max: outgoing.max.unwrap_or(u32::MAX),
            }));
        }

        let incoming = registry.incoming(target_type);
        if !incoming.admits_another(graph.incoming_count(target)) {
            return Err(reject(ConstraintViolation::IncomingLimit {
                activity_id: target.clone(),
                activity_type: target_type,
                max: incoming.max.unwrap_or(u32::MAX),
            }));
        }

        if graph.has_edge_between(source, target) {
            return Err(reject(ConstraintViolation::DuplicateConnection {
                source_id: source.clone(),
                target_id: target.clone(),
            }));
        }

        let transition = Transition {
            id: allocator.transition_id()?,
            source_activity_id: source.clone(),
            target_activity_id: target.clone(),
            transition_kind: kind,
        };
        let edge = self.projection.edge_for(&transition);
        graph.edges.push(edge.clone());

        debug!(
            transition_id = %edge.id,
            source = %source,
            target = %target,
            %kind,
            "Activities connected"
        );
        Ok(edge)
    }

    /// Change a node's position; has no effect on the workflow model
    pub fn move_activity(
        &self,
        graph: &mut EditorGraph,
        id: &ActivityId,
        position: Position,
    ) -> EditorResult<()> {
        let node = graph
            .node_mut(id)
            .ok_or_else(|| EditorError::activity_not_found(id))?;
        node.position = position;
        Ok(())
    }

    /// Remove a single edge
    pub fn disconnect(&self, graph: &mut EditorGraph, id: &TransitionId) -> EditorResult<GraphEdge> {
        let index = graph.edges.iter().position(|e| &e.id == id).ok_or_else(|| {
            warn!(transition_id = %id, "Disconnect of unknown transition ignored");
            EditorError::transition_not_found(id)
        })?;

        let edge = graph.edges.remove(index);
        debug!(transition_id = %id, "Transition removed");
        Ok(edge)
    }

    fn activity_type_of(&self, graph: &EditorGraph, id: &ActivityId) -> EditorResult<ActivityType> {
        let node = graph.node(id).ok_or_else(|| {
            warn!(activity_id = %id, "Connect with unknown endpoint rejected");
            EditorError::activity_not_found(id)
        })?;
        self.projection
            .registry()
            .parse_visual_kind(&node.visual_kind)
            .map_err(|e| EditorError::MalformedGraph(format!("node '{}': {e}", node.id)))
    }
}

fn reject(violation: ConstraintViolation) -> EditorError {
    warn!(%violation, "Connection rejected");
    EditorError::Validation(violation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdStrategy;
    use crate::error::NotFound;
    use serde_json::json;

    fn setup() -> (MutationEngine, EditorGraph, IdentifierAllocator) {
        (
            MutationEngine::default(),
            EditorGraph::new(),
            IdentifierAllocator::new(IdStrategy::Counter, 8),
        )
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_activity_uses_defaults() {
        let (engine, mut graph, mut alloc) = setup();
        let node = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::Timer)
            .unwrap();

        assert_eq!(node.id, ActivityId::new("activity_1"));
        assert_eq!(node.visual_kind, "timerNode");
        assert_eq!(node.label(), Some("Timer"));
        assert_eq!(node.data.get("pauseDuration"), Some(&json!(0)));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_update_merges_shallowly() {
        let (engine, mut graph, mut alloc) = setup();
        let node = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();

        engine
            .update_activity_data(
                &mut graph,
                &node.id,
                patch(json!({"form_id": "f-1", "label": "Approve"})),
            )
            .unwrap();

        let updated = graph.node(&node.id).unwrap();
        assert_eq!(updated.label(), Some("Approve"));
        assert_eq!(updated.data.get("form_id"), Some(&json!("f-1")));
        assert_eq!(updated.data.get("functions"), Some(&json!([])));
    }

    #[test]
    fn test_update_rejects_non_string_label() {
        let (engine, mut graph, mut alloc) = setup();
        let node = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let before = graph.clone();

        let err = engine
            .update_activity_data(&mut graph, &node.id, patch(json!({"label": 3, "form_id": "x"})))
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::Validation(ConstraintViolation::InvalidLabel { .. })
        ));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let (engine, mut graph, _) = setup();
        let err = engine
            .update_activity_data(&mut graph, &ActivityId::new("nope"), Map::new())
            .unwrap_err();
        assert!(matches!(err, EditorError::NotFound(NotFound::Activity(_))));
    }

    #[test]
    fn test_connect_respects_cardinality() {
        let (engine, mut graph, mut alloc) = setup();
        let start = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::Start)
            .unwrap();
        let end = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::End)
            .unwrap();

        let into_start = engine.connect(
            &mut graph,
            &mut alloc,
            &end.id,
            &start.id,
            TransitionKind::Standard,
        );
        assert!(matches!(
            into_start,
            Err(EditorError::Validation(ConstraintViolation::OutgoingLimit { .. }))
        ));

        let user = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let into_start = engine.connect(
            &mut graph,
            &mut alloc,
            &user.id,
            &start.id,
            TransitionKind::Standard,
        );
        assert!(matches!(
            into_start,
            Err(EditorError::Validation(ConstraintViolation::IncomingLimit { .. }))
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_connect_rejects_duplicates_and_unknown_endpoints() {
        let (engine, mut graph, mut alloc) = setup();
        let a = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let b = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::System)
            .unwrap();

        engine
            .connect(&mut graph, &mut alloc, &a.id, &b.id, TransitionKind::Standard)
            .unwrap();
        let dup = engine.connect(&mut graph, &mut alloc, &a.id, &b.id, TransitionKind::Timeout);
        assert!(matches!(
            dup,
            Err(EditorError::Validation(
                ConstraintViolation::DuplicateConnection { .. }
            ))
        ));

        let missing = engine.connect(
            &mut graph,
            &mut alloc,
            &a.id,
            &ActivityId::new("ghost"),
            TransitionKind::Standard,
        );
        assert!(matches!(missing, Err(EditorError::NotFound(_))));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_connect_from_unmapped_kind_is_malformed() {
        let (engine, mut graph, mut alloc) = setup();
        let a = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let b = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::End)
            .unwrap();
        graph.nodes[0].visual_kind = "decisionNode".into();

        let err = engine
            .connect(&mut graph, &mut alloc, &a.id, &b.id, TransitionKind::Standard)
            .unwrap_err();
        assert!(matches!(err, EditorError::MalformedGraph(_)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_delete_cascades_both_directions() {
        let (engine, mut graph, mut alloc) = setup();
        let a = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let b = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let c = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::User)
            .unwrap();
        let ab = engine
            .connect(&mut graph, &mut alloc, &a.id, &b.id, TransitionKind::Standard)
            .unwrap();
        let bc = engine
            .connect(&mut graph, &mut alloc, &b.id, &c.id, TransitionKind::Standard)
            .unwrap();
        let ac = engine
            .connect(&mut graph, &mut alloc, &a.id, &c.id, TransitionKind::Standard)
            .unwrap();

        let removed = engine.delete_activity(&mut graph, &b.id).unwrap();
        assert_eq!(removed, vec![ab.id, bc.id]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, ac.id);
        assert!(!graph.contains_node(&b.id));
    }

    #[test]
    fn test_move_and_disconnect() {
        let (engine, mut graph, mut alloc) = setup();
        let a = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::Start)
            .unwrap();
        let b = engine
            .add_activity(&mut graph, &mut alloc, ActivityType::End)
            .unwrap();
        let edge = engine
            .connect(&mut graph, &mut alloc, &a.id, &b.id, TransitionKind::Standard)
            .unwrap();

        engine
            .move_activity(&mut graph, &a.id, Position::new(3.0, 4.0))
            .unwrap();
        assert_eq!(graph.node(&a.id).unwrap().position, Position::new(3.0, 4.0));

        engine.disconnect(&mut graph, &edge.id).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(matches!(
            engine.disconnect(&mut graph, &edge.id),
            Err(EditorError::NotFound(NotFound::Transition(_)))
        ));
        assert!(matches!(
            engine.move_activity(&mut graph, &ActivityId::new("nope"), Position::default()),
            Err(EditorError::NotFound(_))
        ));
    }
}
