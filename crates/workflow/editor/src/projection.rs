//! Graph projection: translation between the workflow model and the
//! editable graph
//!
//! `from_model` adds presentation state (positions, edge styling) and
//! `to_model` strips it again. For any workflow `w`,
//! `to_model(from_model(w), w.id, w.name) == w`; positions have no model
//! counterpart and are the only thing lost.

use crate::config::{EdgeStyleConfig, EditorConfig, PlacementConfig};
use crate::error::{EditorError, EditorResult};
use crate::graph::{EdgeData, EditorGraph, GraphEdge, GraphNode, NodeLayout, Position};
use serde_json::Value;
use workflow_types::payload::LABEL_KEY;
use workflow_types::{
    Activity, ActivityData, ActivityTypeRegistry, Transition, Workflow, WorkflowId,
};

/// Bidirectional mapping between [`Workflow`] and [`EditorGraph`]
#[derive(Clone, Debug)]
pub struct GraphProjection {
    registry: ActivityTypeRegistry,
    placement: PlacementConfig,
    edge_style: EdgeStyleConfig,
}

impl GraphProjection {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            registry: ActivityTypeRegistry::standard(),
            placement: config.placement.clone(),
            edge_style: config.edge_style.clone(),
        }
    }

    pub fn registry(&self) -> &ActivityTypeRegistry {
        &self.registry
    }

    pub fn placement(&self) -> &PlacementConfig {
        &self.placement
    }

    /// Project a workflow, placing every node on the default grid
    pub fn from_model(&self, workflow: &Workflow) -> EditorGraph {
        self.from_model_with_layout(workflow, &NodeLayout::new())
    }

    /// Project a workflow, taking positions from `layout` where present
    pub fn from_model_with_layout(&self, workflow: &Workflow, layout: &NodeLayout) -> EditorGraph {
        let nodes = workflow
            .activities
            .iter()
            .enumerate()
            .map(|(index, activity)| {
                let position = layout
                    .position(&activity.id)
                    .unwrap_or_else(|| self.placement.slot(index));
                self.node_for(activity, position)
            })
            .collect();
        let edges = workflow
            .transitions
            .iter()
            .map(|t| self.edge_for(t))
            .collect();

        EditorGraph { nodes, edges }
    }

    /// Rebuild the workflow from the graph, dropping all visual state
    pub fn to_model(
        &self,
        graph: &EditorGraph,
        existing_id: Option<WorkflowId>,
        name: &str,
    ) -> EditorResult<Workflow> {
        let activities = graph
            .nodes
            .iter()
            .map(|node| self.activity_for(node))
            .collect::<EditorResult<Vec<_>>>()?;
        let transitions = graph.edges.iter().map(|e| self.transition_for(e)).collect();

        Ok(Workflow {
            id: existing_id,
            name: name.to_string(),
            activities,
            transitions,
        })
    }

    pub fn node_for(&self, activity: &Activity, position: Position) -> GraphNode {
        let mut data = activity.data.as_map().clone();
        data.insert(LABEL_KEY.to_string(), Value::String(activity.label.clone()));

        GraphNode {
            id: activity.id.clone(),
            visual_kind: self.registry.visual_kind(activity.activity_type).to_string(),
            position,
            data,
        }
    }

    pub fn edge_for(&self, transition: &Transition) -> GraphEdge {
        GraphEdge {
            id: transition.id.clone(),
            source: transition.source_activity_id.clone(),
            target: transition.target_activity_id.clone(),
            animated: self.edge_style.animated,
            marker_style: self.edge_style.marker,
            data: EdgeData {
                transition_kind: transition.transition_kind,
            },
        }
    }

    pub fn activity_for(&self, node: &GraphNode) -> EditorResult<Activity> {
        let activity_type = self
            .registry
            .parse_visual_kind(&node.visual_kind)
            .map_err(|e| EditorError::MalformedGraph(format!("node '{}': {e}", node.id)))?;

        let label = match node.data.get(LABEL_KEY) {
            None => String::new(),
            Some(Value::String(label)) => label.clone(),
            Some(other) => {
                return Err(EditorError::MalformedGraph(format!(
                    "node '{}' has non-string label {other}",
                    node.id
                )))
            }
        };

        Ok(Activity {
            id: node.id.clone(),
            activity_type,
            label,
            data: ActivityData::from_map(node.data.clone()),
        })
    }

    pub fn transition_for(&self, edge: &GraphEdge) -> Transition {
        Transition {
            id: edge.id.clone(),
            source_activity_id: edge.source.clone(),
            target_activity_id: edge.target.clone(),
            transition_kind: edge.data.transition_kind,
        }
    }
}

impl Default for GraphProjection {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
