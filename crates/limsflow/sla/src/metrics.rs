//! Time-in-state metrics derived from the transition log.
//!
//! Each dwell covers one stay in one state, from the record that entered
//! it to the record that left it (or `now` for the current state), and
//! carries the policy verdict for that stay. The segment before the
//! first transition starts at the row's creation time, matching how the
//! scan ages seeded entities.

use crate::policy::SlaPolicy;
use chrono::{DateTime, Utc};
use limsflow_store::EntityRow;
use limsflow_types::{State, TransitionRecord};
use serde::Serialize;

/// Policy verdict for one dwell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SlaVerdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "BREACHED")]
    Breached,
    /// No threshold is configured for the state.
    #[serde(rename = "N/A")]
    Untracked,
}

/// One stay in one state.
#[derive(Clone, Debug, Serialize)]
pub struct StateDwell {
    pub state: State,
    pub entered_at: DateTime<Utc>,
    /// `None` while the entity is still in the state.
    pub exited_at: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub sla_secs: Option<i64>,
    pub sla_status: SlaVerdict,
}

/// Dwells for one entity, oldest first; the last entry is always the
/// open dwell in the current state. `records` must be the entity's
/// timeline in ascending timestamp order.
pub fn compute_dwells(
    policy: &SlaPolicy,
    row: &EntityRow,
    records: &[TransitionRecord],
    now: DateTime<Utc>,
) -> Vec<StateDwell> {
    let mut dwells = Vec::with_capacity(records.len() + 1);

    let mut state = records
        .first()
        .map(|r| r.from.clone())
        .unwrap_or_else(|| row.status.clone());
    let mut entered_at = row.created_at;

    for record in records {
        dwells.push(dwell(policy, row, state, entered_at, Some(record.at), now));
        state = record.to.clone();
        entered_at = record.at;
    }
    dwells.push(dwell(policy, row, state, entered_at, None, now));

    dwells
}

fn dwell(
    policy: &SlaPolicy,
    row: &EntityRow,
    state: State,
    entered_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StateDwell {
    let duration_secs = (exited_at.unwrap_or(now) - entered_at).num_seconds().max(0);
    let threshold = policy.threshold_for(&row.entity.kind, &state);
    let sla_secs = threshold.map(|t| t.max_age_secs);
    let sla_status = match sla_secs {
        Some(limit) if duration_secs > limit => SlaVerdict::Breached,
        Some(_) => SlaVerdict::Ok,
        None => SlaVerdict::Untracked,
    };
    StateDwell {
        state,
        entered_at,
        exited_at,
        duration_secs,
        sla_secs,
        sla_status,
    }
}
