//! Workflow Model Types for the Workflow Designer
//!
//! A workflow is a directed graph of typed **activities** connected by
//! **transitions**. This crate holds the canonical, persistence-ready form
//! of that graph. It knows nothing about screen positions, edge styling or
//! any other editor concern; the editor projects it into an editable graph
//! and back.
//!
//! # Key Concepts
//!
//! - **Workflow**: the persisted definition (activities + transitions).
//! - **ActivityType**: the closed set of step kinds (Start, End, User,
//!   System, Timer, MultiInnerWorkflow, AwaitParallel).
//! - **ActivityData**: the type-specific payload of an activity.
//! - **ActivityTypeRegistry**: per-type structural rules (allowed incoming
//!   and outgoing transitions), default payloads and required fields.
//! - **Validation**: the whole-graph check run before a workflow is saved.
//!
//! # Example
//!
//! ```rust
//! use workflow_types::*;
//!
//! let mut wf = Workflow::new("Expense Approval");
//! wf.add_activity(Activity::start("start")).unwrap();
//! wf.add_activity(Activity::user("approve", "Manager Approval")).unwrap();
//! wf.add_activity(Activity::end("end")).unwrap();
//! wf.add_transition(Transition::new("t1", "start", "approve")).unwrap();
//! wf.add_transition(Transition::new("t2", "approve", "end")).unwrap();
//!
//! assert!(validate(&wf).is_empty());
//! ```

#![deny(unsafe_code)]

mod definition;
mod errors;
pub mod payload;
mod registry;
mod transition;
mod validation;

pub use definition::*;
pub use errors::*;
pub use payload::{ActivityData, FunctionRef};
pub use registry::*;
pub use transition::*;
pub use validation::*;
