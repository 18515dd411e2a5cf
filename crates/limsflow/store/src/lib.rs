//! In-memory persistence for the workflow engine.
//!
//! The store keeps three tables behind one lock: versioned entity rows,
//! the append-only transition log, and SLA alert rows. The entity status
//! field has exactly one mutation path, [`EntityStore::apply_transition`],
//! which performs the version-conditioned status write and the timeline
//! append under a single write guard — both land or neither does, and a
//! stale version aborts with [`StoreError::VersionConflict`] instead of
//! overwriting a concurrent commit.
//!
//! This adapter is deterministic and test-friendly; a transactional
//! backend would implement the same contract with row locks.

#![deny(unsafe_code)]

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{EntityRow, EntityStore};
