//! The workflow error taxonomy.
//!
//! Every rejection raised by the engine is one of these variants; nothing
//! is downgraded to a generic failure. The HTTP layer maps variants to
//! status codes (400/401/403/404/409) without inspecting message text.

use crate::ids::{EntityRef, Kind, State};
use thiserror::Error;

/// Result alias used throughout the engine crates.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors raised by rule lookup, authorization, and transition execution.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Malformed or missing payload field; always field-scoped.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity does not exist, or sits outside the caller's scope.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller presented no authenticated identity.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is authenticated but lacks membership or role.
    #[error("{0}")]
    PermissionDenied(String),

    /// The entity is in a terminal state; no transition can ever apply.
    #[error("Invalid {kind} status transition: {from} → {to} ({from} is terminal)")]
    TerminalLocked { kind: Kind, from: State, to: State },

    /// The (from, to) edge is not in the rule table for this kind.
    #[error("Invalid {kind} status transition: {from} → {to}")]
    IllegalTransition { kind: Kind, from: State, to: State },

    /// Optimistic write check failed: the entity changed between the
    /// consistency read and the conditional write.
    #[error("{entity} was modified concurrently; transition aborted")]
    Conflict { entity: EntityRef },

    /// Configuration error: the kind has no rule set. Never treated as
    /// an ordinary illegal transition, and never defaults to allow.
    #[error("unknown workflow kind: {0}")]
    UnknownKind(Kind),

    /// Configuration error: the state is not in the kind's status universe.
    #[error("unknown {kind} state: {state}")]
    UnknownState { kind: Kind, state: State },

    /// Internal fault (lock poisoning, invariant breach in the store).
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Convenience constructor for field-scoped validation failures.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The payload field this error is scoped to, if any. Transition
    /// legality errors are reported against the `to` field, matching the
    /// wire contract.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::TerminalLocked { .. } | Self::IllegalTransition { .. } => Some("to"),
            _ => None,
        }
    }
}
