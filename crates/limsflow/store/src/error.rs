//! Store-layer errors.

use limsflow_types::{EntityRef, WorkflowError};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(EntityRef),

    /// The conditional write observed a version other than the one the
    /// caller read; someone else committed in between.
    #[error("{entity} version check failed: expected {expected}, found {found}")]
    VersionConflict {
        entity: EntityRef,
        expected: u64,
        found: u64,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => WorkflowError::NotFound(entity.to_string()),
            StoreError::VersionConflict { entity, .. } => WorkflowError::Conflict { entity },
            StoreError::InvariantViolation(msg) => WorkflowError::Internal(msg),
        }
    }
}
