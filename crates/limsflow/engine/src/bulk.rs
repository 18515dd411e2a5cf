//! Bulk application: best-effort, per-item, never all-or-nothing.

use crate::executor::{TransitionExecutor, TransitionRequest};
use limsflow_types::{Actor, EntityId, EntityRef, Kind, LabId, State};
use serde::Serialize;
use std::sync::Arc;

/// One bulk submission: the same target status for many entities of
/// one kind.
#[derive(Clone, Debug)]
pub struct BulkRequest {
    pub kind: Kind,
    pub target: State,
    pub ids: Vec<EntityId>,
    pub actor: Actor,
    pub lab: LabId,
    pub comment: Option<String>,
}

/// Per-item result. Serializes as either `{object_id, from, to, status}`
/// or `{object_id, error}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BulkItemOutcome {
    Applied {
        object_id: EntityId,
        from: State,
        to: State,
        status: State,
    },
    Skipped {
        object_id: EntityId,
        error: String,
    },
}

/// The bulk result: `ok_count + skipped_count` always equals the number
/// of submitted ids, and `results` preserves submission order.
#[derive(Clone, Debug, Serialize)]
pub struct BulkOutcome {
    pub ok_count: usize,
    pub skipped_count: usize,
    pub results: Vec<BulkItemOutcome>,
}

/// Applies a bulk request by invoking the executor once per id; one
/// item's rejection never stops the remaining items.
pub struct BulkCoordinator {
    executor: Arc<TransitionExecutor>,
}

impl BulkCoordinator {
    pub fn new(executor: Arc<TransitionExecutor>) -> Self {
        Self { executor }
    }

    pub fn apply(&self, request: BulkRequest) -> BulkOutcome {
        let mut ok_count = 0;
        let mut skipped_count = 0;
        let mut results = Vec::with_capacity(request.ids.len());

        for id in &request.ids {
            let entity = EntityRef::new(request.kind.clone(), *id);
            let outcome = self.executor.execute(TransitionRequest {
                entity,
                target: request.target.clone(),
                actor: request.actor.clone(),
                lab: request.lab.clone(),
                comment: request.comment.clone(),
            });
            match outcome {
                Ok(receipt) => {
                    ok_count += 1;
                    results.push(BulkItemOutcome::Applied {
                        object_id: *id,
                        from: receipt.from,
                        to: receipt.to,
                        status: receipt.status,
                    });
                }
                Err(err) => {
                    skipped_count += 1;
                    results.push(BulkItemOutcome::Skipped {
                        object_id: *id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            kind = %request.kind,
            target = %request.target,
            submitted = request.ids.len(),
            ok_count,
            skipped_count,
            "bulk apply finished"
        );

        BulkOutcome {
            ok_count,
            skipped_count,
            results,
        }
    }
}
