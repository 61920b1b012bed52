//! The editable graph: nodes and edges as the rendering layer sees them
//!
//! Graph nodes and edges carry presentation state (position, animation,
//! arrow markers) next to a mirror of the activity or transition they
//! stand for. None of it is persisted with the workflow.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use workflow_types::{ActivityId, TransitionId, TransitionKind};

/// Screen position of a node
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Arrow head drawn at the target end of an edge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerStyle {
    #[default]
    ArrowClosed,
    Arrow,
    None,
}

/// A node of the editable graph; its id is the activity id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: ActivityId,
    /// Rendering hint naming the activity type
    #[serde(rename = "type")]
    pub visual_kind: String,
    pub position: Position,
    /// The activity payload plus its `label`
    pub data: Map<String, Value>,
}

impl GraphNode {
    pub fn label(&self) -> Option<&str> {
        self.data.get(workflow_types::payload::LABEL_KEY).and_then(Value::as_str)
    }
}

/// Transition semantics mirrored onto an edge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub transition_kind: TransitionKind,
}

/// An edge of the editable graph; its id is the transition id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: TransitionId,
    pub source: ActivityId,
    pub target: ActivityId,
    pub animated: bool,
    pub marker_style: MarkerStyle,
    pub data: EdgeData,
}

impl GraphEdge {
    pub fn touches(&self, activity_id: &ActivityId) -> bool {
        &self.source == activity_id || &self.target == activity_id
    }
}

/// The `(nodes, edges)` pair handed to the rendering layer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl EditorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &ActivityId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &ActivityId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &TransitionId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: &ActivityId) -> bool {
        self.node(id).is_some()
    }

    pub fn outgoing_count(&self, id: &ActivityId) -> usize {
        self.edges.iter().filter(|e| &e.source == id).count()
    }

    pub fn incoming_count(&self, id: &ActivityId) -> usize {
        self.edges.iter().filter(|e| &e.target == id).count()
    }

    pub fn has_edge_between(&self, source: &ActivityId, target: &ActivityId) -> bool {
        self.edges
            .iter()
            .any(|e| &e.source == source && &e.target == target)
    }

    /// Edges entering or leaving the node
    pub fn incident_edges(&self, id: &ActivityId) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.touches(id)).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Current node positions
    pub fn layout(&self) -> NodeLayout {
        NodeLayout(
            self.nodes
                .iter()
                .map(|n| (n.id.clone(), n.position))
                .collect(),
        )
    }
}

/// Node positions kept outside the workflow definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeLayout(BTreeMap<ActivityId, Position>);

impl NodeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ActivityId, position: Position) -> Self {
        self.0.insert(id, position);
        self
    }

    pub fn insert(&mut self, id: ActivityId, position: Position) -> Option<Position> {
        self.0.insert(id, position)
    }

    pub fn position(&self, id: &ActivityId) -> Option<Position> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
