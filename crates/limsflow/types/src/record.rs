//! Immutable records produced by the engine.
//!
//! A [`TransitionRecord`] is appended exactly once per successful
//! transition and never mutated afterwards. [`SlaAlert`] rows are raised
//! by the SLA monitor and resolved in place (marked, never deleted).

use crate::ids::{ActorId, AlertId, EntityId, EntityRef, Kind, LabId, RecordId, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Transition record ────────────────────────────────────────────────

/// One append-only timeline entry: who moved which entity from where to
/// where, in which laboratory, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: RecordId,
    pub entity: EntityRef,
    pub lab: LabId,
    pub from: State,
    pub to: State,
    pub actor: ActorId,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TransitionRecord {
    pub fn new(
        entity: EntityRef,
        lab: LabId,
        from: State,
        to: State,
        actor: ActorId,
        at: DateTime<Utc>,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            entity,
            lab,
            from,
            to,
            actor,
            at,
            comment,
        }
    }
}

// ── Executor response ────────────────────────────────────────────────

/// What the executor hands back after a committed transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReceipt {
    pub id: EntityId,
    pub kind: Kind,
    pub from: State,
    pub to: State,
    /// The entity's status after commit; always equals `to`.
    pub status: State,
    pub record_id: RecordId,
    pub at: DateTime<Utc>,
}

// ── SLA alert ────────────────────────────────────────────────────────

/// Alert severity, configured per (kind, state) threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// A derived record marking that an entity sat in a state past its
/// configured threshold. Resolution sets `resolved_at` and the computed
/// `duration_secs`; the row itself is never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaAlert {
    pub id: AlertId,
    pub entity: EntityRef,
    pub state: State,
    pub severity: AlertSeverity,
    /// The configured threshold that was exceeded, in seconds.
    pub threshold_secs: i64,
    pub raised_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Seconds between raise and resolution; set when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
}

impl SlaAlert {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}
