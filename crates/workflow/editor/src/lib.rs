//! Workflow Editor Core for the Workflow Designer
//!
//! The editor sits between a rendering layer (a node/edge canvas) and the
//! workflow model. It keeps an editable graph in sync with a persistable
//! [`Workflow`](workflow_types::Workflow) and guarantees that every edit
//! either applies completely or not at all.
//!
//! # Architecture
//!
//! - [`IdentifierAllocator`] — Issues activity and transition ids that are
//!   unique within a session
//! - [`GraphProjection`] — Translates between the workflow model and the
//!   editable graph
//! - [`MutationEngine`] — The only code path that changes the graph;
//!   enforces per-type transition limits at edit time
//! - [`EditorSession`] — One user's editing of one workflow, including
//!   save-time validation and the asynchronous save protocol
//! - [`WorkflowStore`] — The persistence boundary
//!
//! # Example
//!
//! ```rust
//! use workflow_editor::*;
//! use workflow_types::{ActivityType, TransitionKind};
//!
//! let mut session = EditorSession::with_start("Expense Approval", EditorConfig::default()).unwrap();
//! let start = session.graph().nodes[0].id.clone();
//! let end = session.add_activity(ActivityType::End).unwrap();
//! session.connect(&start, &end.id, TransitionKind::Standard).unwrap();
//!
//! assert!(session.validate().unwrap().is_empty());
//! ```

#![deny(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod persistence;
pub mod projection;
pub mod session;
pub mod telemetry;

pub use allocator::{IdSource, IdentifierAllocator, ACTIVITY_PREFIX, TRANSITION_PREFIX};
pub use config::{EdgeStyleConfig, EditorConfig, IdStrategy, PlacementConfig};
pub use error::{
    ConstraintViolation, EditorError, EditorResult, ErrorKind, NotFound, PersistenceError,
};
pub use graph::{EdgeData, EditorGraph, GraphEdge, GraphNode, MarkerStyle, NodeLayout, Position};
pub use mutation::MutationEngine;
pub use persistence::{
    InMemoryWorkflowStore, SaveOutcome, SaveRequest, SessionToken, WorkflowStore,
};
pub use projection::GraphProjection;
pub use session::{CommandOutcome, EditorCommand, EditorSession};
pub use telemetry::{init_tracing, TelemetryConfig};
