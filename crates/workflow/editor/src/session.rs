//! Editor sessions: one user's editing of one workflow
//!
//! An [`EditorSession`] owns the editable graph together with everything
//! needed to change it consistently: the id allocator, the mutation engine
//! and the last workflow known to project cleanly. The rendering layer
//! forwards user intents as [`EditorCommand`]s and redraws from
//! [`EditorSession::graph`]; it never mutates the graph itself.

use crate::allocator::IdentifierAllocator;
use crate::config::EditorConfig;
use crate::error::{ConstraintViolation, EditorError, EditorResult, NotFound, PersistenceError};
use crate::graph::{EditorGraph, GraphEdge, GraphNode, NodeLayout, Position};
use crate::mutation::MutationEngine;
use crate::persistence::{SaveOutcome, SaveRequest, SessionToken, WorkflowStore};
use crate::projection::GraphProjection;
use serde_json::{Map, Value};
use tracing::{error, info};
use workflow_types::{
    validate_with, ActivityId, ActivityType, TransitionId, TransitionKind, Violation, Workflow,
    WorkflowId,
};

/// A user intent forwarded by the rendering layer
#[derive(Clone, Debug, PartialEq)]
pub enum EditorCommand {
    AddActivity {
        activity_type: ActivityType,
    },
    UpdateActivityData {
        id: ActivityId,
        patch: Map<String, Value>,
    },
    DeleteActivity {
        id: ActivityId,
    },
    Connect {
        source: ActivityId,
        target: ActivityId,
        kind: TransitionKind,
    },
    MoveActivity {
        id: ActivityId,
        position: Position,
    },
    Disconnect {
        id: TransitionId,
    },
    Rename {
        name: String,
    },
}

/// What an applied command produced
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    ActivityAdded(GraphNode),
    ActivityUpdated,
    ActivityDeleted { removed_transitions: Vec<TransitionId> },
    Connected(GraphEdge),
    ActivityMoved,
    Disconnected(GraphEdge),
    Renamed,
}

/// The editing state of a single workflow
#[derive(Clone, Debug)]
pub struct EditorSession {
    workflow_id: Option<WorkflowId>,
    name: String,
    graph: EditorGraph,
    allocator: IdentifierAllocator,
    engine: MutationEngine,
    config: EditorConfig,
    /// Last workflow that projected without error
    last_good: Workflow,
    token: SessionToken,
}

impl EditorSession {
    /// Start editing a new, empty workflow
    pub fn new(name: impl Into<String>, config: EditorConfig) -> Self {
        let name = name.into();
        Self {
            workflow_id: None,
            graph: EditorGraph::new(),
            allocator: IdentifierAllocator::new(config.id_strategy, config.max_id_attempts),
            engine: MutationEngine::new(GraphProjection::new(&config)),
            last_good: Workflow::new(name.clone()),
            name,
            config,
            token: SessionToken::new(),
        }
    }

    /// Start editing a new workflow that already contains a Start activity
    pub fn with_start(name: impl Into<String>, config: EditorConfig) -> EditorResult<Self> {
        let mut session = Self::new(name, config);
        session.add_activity(ActivityType::Start)?;
        session.last_good = session.project()?;
        Ok(session)
    }

    /// Start editing an existing workflow
    ///
    /// Every id in the workflow is reserved before any new id is issued.
    pub fn from_workflow(workflow: Workflow, layout: &NodeLayout, config: EditorConfig) -> Self {
        let projection = GraphProjection::new(&config);
        let graph = projection.from_model_with_layout(&workflow, layout);
        let mut allocator = IdentifierAllocator::new(config.id_strategy, config.max_id_attempts);
        allocator.seed(workflow.all_ids());

        Self {
            workflow_id: workflow.id.clone(),
            name: workflow.name.clone(),
            graph,
            allocator,
            engine: MutationEngine::new(projection),
            config,
            last_good: workflow,
            token: SessionToken::new(),
        }
    }

    /// Load a stored workflow and start editing it
    pub async fn open<S>(store: &S, id: &WorkflowId, config: EditorConfig) -> EditorResult<Self>
    where
        S: WorkflowStore + ?Sized,
    {
        let workflow = store.load(id).await.map_err(|e| match e {
            PersistenceError::NotFound(id) => EditorError::NotFound(NotFound::Workflow(id)),
            other => EditorError::Persistence(other),
        })?;
        info!(
            workflow_id = %id,
            activities = workflow.activity_count(),
            transitions = workflow.transition_count(),
            "Workflow opened"
        );
        Ok(Self::from_workflow(workflow, &NodeLayout::new(), config))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn graph(&self) -> &EditorGraph {
        &self.graph
    }

    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn is_open(&self) -> bool {
        self.token.is_open()
    }

    pub fn last_known_good(&self) -> &Workflow {
        &self.last_good
    }

    /// Current node positions, for storage next to the workflow
    pub fn layout(&self) -> NodeLayout {
        self.graph.layout()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply a command in place; on error the session is unchanged
    pub fn apply(&mut self, command: EditorCommand) -> EditorResult<CommandOutcome> {
        match command {
            EditorCommand::AddActivity { activity_type } => self
                .add_activity(activity_type)
                .map(CommandOutcome::ActivityAdded),
            EditorCommand::UpdateActivityData { id, patch } => self
                .update_activity_data(&id, patch)
                .map(|_| CommandOutcome::ActivityUpdated),
            EditorCommand::DeleteActivity { id } => {
                self.delete_activity(&id)
                    .map(|removed_transitions| CommandOutcome::ActivityDeleted {
                        removed_transitions,
                    })
            }
            EditorCommand::Connect {
                source,
                target,
                kind,
            } => self
                .connect(&source, &target, kind)
                .map(CommandOutcome::Connected),
            EditorCommand::MoveActivity { id, position } => self
                .move_activity(&id, position)
                .map(|_| CommandOutcome::ActivityMoved),
            EditorCommand::Disconnect { id } => {
                self.disconnect(&id).map(CommandOutcome::Disconnected)
            }
            EditorCommand::Rename { name } => {
                self.rename(name);
                Ok(CommandOutcome::Renamed)
            }
        }
    }

    /// Apply a command to a copy of the session, leaving `self` untouched
    ///
    /// The copy is a later version of the same editing session, not a new
    /// session: both share one [`SessionToken`], so closing either one
    /// discards saves started from the other.
    pub fn dispatch(&self, command: EditorCommand) -> EditorResult<(Self, CommandOutcome)> {
        let mut next = self.clone();
        let outcome = next.apply(command)?;
        Ok((next, outcome))
    }

    pub fn add_activity(&mut self, activity_type: ActivityType) -> EditorResult<GraphNode> {
        self.engine
            .add_activity(&mut self.graph, &mut self.allocator, activity_type)
    }

    pub fn update_activity_data(
        &mut self,
        id: &ActivityId,
        patch: Map<String, Value>,
    ) -> EditorResult<()> {
        self.engine.update_activity_data(&mut self.graph, id, patch)
    }

    pub fn delete_activity(&mut self, id: &ActivityId) -> EditorResult<Vec<TransitionId>> {
        self.engine.delete_activity(&mut self.graph, id)
    }

    pub fn connect(
        &mut self,
        source: &ActivityId,
        target: &ActivityId,
        kind: TransitionKind,
    ) -> EditorResult<GraphEdge> {
        self.engine
            .connect(&mut self.graph, &mut self.allocator, source, target, kind)
    }

    pub fn move_activity(&mut self, id: &ActivityId, position: Position) -> EditorResult<()> {
        self.engine.move_activity(&mut self.graph, id, position)
    }

    pub fn disconnect(&mut self, id: &TransitionId) -> EditorResult<GraphEdge> {
        self.engine.disconnect(&mut self.graph, id)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ── Model ────────────────────────────────────────────────────────

    /// The workflow the graph currently describes
    ///
    /// If the graph no longer projects onto a workflow, the error is logged
    /// and the graph is rebuilt from the last known-good workflow, keeping
    /// current node positions.
    pub fn snapshot(&mut self) -> EditorResult<Workflow> {
        match self.project() {
            Ok(workflow) => {
                self.last_good = workflow.clone();
                Ok(workflow)
            }
            Err(err) => {
                error!(error = %err, "Graph failed to project, restoring last known-good workflow");
                self.fall_back();
                Err(err)
            }
        }
    }

    /// Violations the current workflow would be rejected for at save time
    pub fn validate(&mut self) -> EditorResult<Vec<Violation>> {
        let workflow = self.snapshot()?;
        Ok(validate_with(self.engine.projection().registry(), &workflow))
    }

    /// Replace the graph with one handed back by the rendering layer
    ///
    /// The graph is accepted only if it projects cleanly; otherwise the
    /// current graph stays in place.
    pub fn restore_graph(&mut self, graph: EditorGraph) -> EditorResult<()> {
        let workflow = self
            .engine
            .projection()
            .to_model(&graph, self.workflow_id.clone(), &self.name)
            .map_err(|err| {
                error!(error = %err, "Rejected malformed graph, keeping current graph");
                err
            })?;

        self.allocator.seed(workflow.all_ids());
        self.graph = graph;
        self.last_good = workflow;
        Ok(())
    }

    fn project(&self) -> EditorResult<Workflow> {
        self.engine
            .projection()
            .to_model(&self.graph, self.workflow_id.clone(), &self.name)
    }

    fn fall_back(&mut self) {
        let layout = self.graph.layout();
        self.graph = self
            .engine
            .projection()
            .from_model_with_layout(&self.last_good, &layout);
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Take a validated snapshot for saving
    pub fn begin_save(&mut self) -> EditorResult<SaveRequest> {
        let snapshot = self.snapshot()?;
        let violations = validate_with(self.engine.projection().registry(), &snapshot);
        if !violations.is_empty() {
            info!(
                violations = violations.len(),
                "Save refused, workflow not save-ready"
            );
            return Err(EditorError::Validation(ConstraintViolation::NotSaveReady(
                violations,
            )));
        }
        Ok(SaveRequest::new(snapshot, self.token.clone()))
    }

    /// Record the store's answer to a save
    ///
    /// The graph is not touched, so edits made after the snapshot survive.
    /// Returns the workflow id when the outcome was applied.
    pub fn complete_save(&mut self, outcome: SaveOutcome) -> Option<WorkflowId> {
        let stored = match outcome {
            SaveOutcome::Saved(stored) if self.is_open() => stored,
            _ => return None,
        };

        self.allocator.seed(stored.all_ids());
        self.workflow_id = stored.id.clone();
        self.last_good = stored;
        self.workflow_id.clone()
    }

    /// Validate, send and record a save
    pub async fn save<S>(&mut self, store: &S) -> EditorResult<SaveOutcome>
    where
        S: WorkflowStore + ?Sized,
    {
        let request = self.begin_save()?;
        let outcome = request.send(store).await?;
        self.complete_save(outcome.clone());
        Ok(outcome)
    }

    /// End the session; saves still in flight will be discarded
    pub fn close(&self) {
        info!(workflow_id = ?self.workflow_id, "Editor session closed");
        self.token.close();
    }
}
