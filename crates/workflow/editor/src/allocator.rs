//! Identifier allocation for activities and transitions
//!
//! The allocator remembers every id it has issued or been told about, and
//! never hands out an id twice within a session. Loading a workflow seeds
//! it with the ids already present.

use crate::config::IdStrategy;
use crate::error::{EditorError, EditorResult};
use std::collections::{HashMap, HashSet};
use workflow_types::{ActivityId, TransitionId};

/// Prefix of generated activity ids
pub const ACTIVITY_PREFIX: &str = "activity";

/// Prefix of generated transition ids
pub const TRANSITION_PREFIX: &str = "transition";

/// Produces candidate ids; the allocator rejects candidates already in use
pub trait IdSource: std::fmt::Debug + Send + Sync {
    /// Draw a candidate id for the given prefix
    fn draw(&mut self, prefix: &str) -> String;

    /// Learn about an id that exists already
    fn observe(&mut self, _id: &str) {}

    fn clone_box(&self) -> Box<dyn IdSource>;
}

impl Clone for Box<dyn IdSource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Draws `<prefix>_<uuid v4>`
#[derive(Clone, Debug, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn draw(&mut self, prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }

    fn clone_box(&self) -> Box<dyn IdSource> {
        Box::new(self.clone())
    }
}

/// Draws `<prefix>_<n>` from a per-prefix counter
///
/// Observed ids of the same shape move the counter past their number, so a
/// counter seeded from a loaded workflow continues where it left off.
///
/// Once a prefix reaches `u64::MAX` its counter stops advancing and keeps
/// drawing that last id, which the allocator already holds as taken.
#[derive(Clone, Debug, Default)]
pub struct CounterSource {
    last: HashMap<String, u64>,
}

impl IdSource for CounterSource {
    fn draw(&mut self, prefix: &str) -> String {
        let last = self.last.entry(prefix.to_string()).or_insert(0);
        if let Some(next) = last.checked_add(1) {
            *last = next;
        }
        format!("{prefix}_{last}")
    }

    fn observe(&mut self, id: &str) {
        if let Some((prefix, n)) = id.rsplit_once('_') {
            if let Ok(n) = n.parse::<u64>() {
                let last = self.last.entry(prefix.to_string()).or_insert(0);
                *last = (*last).max(n);
            }
        }
    }

    fn clone_box(&self) -> Box<dyn IdSource> {
        Box::new(self.clone())
    }
}

/// Issues ids unique among everything issued or seeded in this session
#[derive(Clone, Debug)]
pub struct IdentifierAllocator {
    source: Box<dyn IdSource>,
    seen: HashSet<String>,
    max_attempts: u32,
}

impl IdentifierAllocator {
    pub fn new(strategy: IdStrategy, max_attempts: u32) -> Self {
        let source: Box<dyn IdSource> = match strategy {
            IdStrategy::Uuid => Box::new(UuidSource),
            IdStrategy::Counter => Box::new(CounterSource::default()),
        };
        Self::with_source(source, max_attempts)
    }

    pub fn with_source(source: Box<dyn IdSource>, max_attempts: u32) -> Self {
        Self {
            source,
            seen: HashSet::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Mark ids as taken, e.g. every id of a loaded workflow
    pub fn seed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            self.source.observe(&id);
            self.seen.insert(id);
        }
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of ids issued or seeded so far
    pub fn taken_count(&self) -> usize {
        self.seen.len()
    }

    /// Issue a fresh id for the given prefix
    pub fn generate(&mut self, prefix: &str) -> EditorResult<String> {
        for _ in 0..self.max_attempts {
            let candidate = self.source.draw(prefix);
            if self.seen.insert(candidate.clone()) {
                return Ok(candidate);
            }
            tracing::debug!(prefix, candidate = %candidate, "Id collision, drawing again");
        }

        tracing::error!(
            prefix,
            attempts = self.max_attempts,
            "Identifier allocation exhausted its attempts"
        );
        Err(EditorError::IdentifierCollision {
            prefix: prefix.to_string(),
            attempts: self.max_attempts,
        })
    }

    pub fn activity_id(&mut self) -> EditorResult<ActivityId> {
        self.generate(ACTIVITY_PREFIX).map(ActivityId)
    }

    pub fn transition_id(&mut self) -> EditorResult<TransitionId> {
        self.generate(TRANSITION_PREFIX).map(TransitionId)
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new(IdStrategy::default(), 8)
    }
}
