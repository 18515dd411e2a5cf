//! Timeline reads.
//!
//! Appends happen inside the store as part of the executor's atomic
//! commit; this facade only exposes the ordered, restartable read side.

use limsflow_store::EntityStore;
use limsflow_types::{EntityRef, TransitionRecord};
use std::sync::Arc;

/// Read-only view over an entity's append-only transition log.
pub struct TimelineRecorder {
    store: Arc<EntityStore>,
}

impl TimelineRecorder {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// The entity's records, oldest timestamp first. Each call re-reads
    /// the log, so the sequence is restartable and reflects later
    /// commits.
    pub fn read(&self, entity: &EntityRef) -> Vec<TransitionRecord> {
        self.store.timeline(entity)
    }

    pub fn iter(&self, entity: &EntityRef) -> impl Iterator<Item = TransitionRecord> {
        self.read(entity).into_iter()
    }
}
