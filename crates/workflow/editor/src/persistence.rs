//! Persistence boundary: loading and saving workflows
//!
//! Saving is asynchronous with respect to the editing session. A save works
//! on an immutable snapshot taken when it was requested, so edits made while
//! the request is in flight are not part of it and are picked up by the next
//! save. If the session is closed before the store answers, the answer is
//! discarded.

use crate::error::PersistenceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use workflow_types::{Workflow, WorkflowId};

/// Where workflow definitions are stored
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Load a stored workflow
    async fn load(&self, id: &WorkflowId) -> Result<Workflow, PersistenceError>;

    /// Store a workflow, assigning an id on its first save
    ///
    /// Returns the authoritative stored form.
    async fn save(&self, workflow: Workflow) -> Result<Workflow, PersistenceError>;
}

/// Liveness flag shared between a session and its in-flight saves
#[derive(Clone, Debug)]
pub struct SessionToken(Arc<AtomicBool>);

impl SessionToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a save once the store has answered
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// The stored form returned by the store
    Saved(Workflow),
    /// The session closed while the save was in flight
    Discarded,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

/// A validated snapshot on its way to the store
#[derive(Clone, Debug)]
pub struct SaveRequest {
    snapshot: Workflow,
    token: SessionToken,
}

impl SaveRequest {
    pub(crate) fn new(snapshot: Workflow, token: SessionToken) -> Self {
        Self { snapshot, token }
    }

    pub fn snapshot(&self) -> &Workflow {
        &self.snapshot
    }

    /// Send the snapshot to the store
    ///
    /// Store failures propagate unless the session closed in the meantime;
    /// a closed session discards success and failure alike.
    pub async fn send<S>(self, store: &S) -> Result<SaveOutcome, PersistenceError>
    where
        S: WorkflowStore + ?Sized,
    {
        let name = self.snapshot.name.clone();
        let result = store.save(self.snapshot).await;

        if !self.token.is_open() {
            info!(workflow = %name, "Session closed during save, result discarded");
            return Ok(SaveOutcome::Discarded);
        }

        let stored = result?;
        info!(
            workflow = %name,
            workflow_id = ?stored.id,
            activities = stored.activity_count(),
            transitions = stored.transition_count(),
            "Workflow saved"
        );
        Ok(SaveOutcome::Saved(stored))
    }
}

#[derive(Clone, Debug)]
struct StoredRecord {
    json: String,
    saved_at: DateTime<Utc>,
    revision: u32,
}

/// Store keeping serialized workflows in memory
///
/// Workflows pass through their JSON form on every save and load, so the
/// persisted shape is exercised exactly as a remote store would see it.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    records: RwLock<HashMap<WorkflowId, StoredRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`PersistenceError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of times the workflow has been saved
    pub async fn revision(&self, id: &WorkflowId) -> Option<u32> {
        self.records.read().await.get(id).map(|r| r.revision)
    }

    pub async fn saved_at(&self, id: &WorkflowId) -> Option<DateTime<Utc>> {
        self.records.read().await.get(id).map(|r| r.saved_at)
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(PersistenceError::Unavailable(
                "in-memory store is offline".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn load(&self, id: &WorkflowId) -> Result<Workflow, PersistenceError> {
        self.check_available()?;
        let records = self.records.read().await;
        let record = records
            .get(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        Ok(serde_json::from_str(&record.json)?)
    }

    async fn save(&self, mut workflow: Workflow) -> Result<Workflow, PersistenceError> {
        self.check_available()?;
        let id = workflow.id.get_or_insert_with(WorkflowId::generate).clone();
        let json = serde_json::to_string(&workflow)?;

        let mut records = self.records.write().await;
        let revision = records.get(&id).map_or(1, |r| r.revision + 1);
        records.insert(
            id,
            StoredRecord {
                json: json.clone(),
                saved_at: Utc::now(),
                revision,
            },
        );
        drop(records);

        Ok(serde_json::from_str(&json)?)
    }
}
