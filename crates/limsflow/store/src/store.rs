//! The entity store and its three tables.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use limsflow_types::{EntityId, EntityRef, Kind, LabId, SlaAlert, State, TransitionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// One tracked entity as the engine sees it: current status plus the
/// version counter the optimistic write discipline compares against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    pub entity: EntityRef,
    pub lab: LabId,
    pub status: State,
    /// Incremented on every committed transition.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    entities: HashMap<EntityRef, EntityRow>,
    next_ids: HashMap<Kind, u64>,
    log: Vec<TransitionRecord>,
    alerts: Vec<SlaAlert>,
}

/// In-memory store for entities, timeline records, and alerts.
#[derive(Default)]
pub struct EntityStore {
    inner: RwLock<Inner>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Create a new entity directly in `status`, with no timeline record.
    ///
    /// This is the fixture/migration path — the one write that does not
    /// go through the executor. It can only create, never overwrite, so
    /// an existing entity's status remains executor-only. Nothing in the
    /// HTTP surface reaches this method.
    pub fn seed(&self, kind: Kind, lab: LabId, status: State, at: DateTime<Utc>) -> EntityRow {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let next = inner.next_ids.entry(kind.clone()).or_insert(0);
        *next += 1;
        let row = EntityRow {
            entity: EntityRef::new(kind, EntityId(*next)),
            lab,
            status,
            version: 0,
            created_at: at,
            updated_at: at,
        };
        inner.entities.insert(row.entity.clone(), row.clone());
        row
    }

    pub fn get(&self, entity: &EntityRef) -> Option<EntityRow> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.entities.get(entity).cloned()
    }

    /// Consistency-preserving read: the returned row's `version` is what
    /// a subsequent [`apply_transition`](Self::apply_transition) must
    /// present to commit.
    pub fn snapshot(&self, entity: &EntityRef) -> StoreResult<EntityRow> {
        self.get(entity)
            .ok_or_else(|| StoreError::NotFound(entity.clone()))
    }

    /// All entity rows, every kind. Used by the SLA scanner.
    pub fn entities(&self) -> Vec<EntityRow> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<_> = inner.entities.values().cloned().collect();
        rows.sort_by(|a, b| a.entity.kind.cmp(&b.entity.kind).then(a.entity.id.cmp(&b.entity.id)));
        rows
    }

    // ── The single status mutation path ──────────────────────────────

    /// Commit a transition: conditionally write the new status and append
    /// the timeline record in one atomic step.
    ///
    /// The write only proceeds if the row's version still equals
    /// `expected_version` (the value read at snapshot time). On a
    /// mismatch nothing is written and the caller gets a
    /// [`StoreError::VersionConflict`] to re-evaluate against the new
    /// status.
    pub fn apply_transition(
        &self,
        entity: &EntityRef,
        expected_version: u64,
        record: TransitionRecord,
    ) -> StoreResult<EntityRow> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        let row = inner
            .entities
            .get_mut(entity)
            .ok_or_else(|| StoreError::NotFound(entity.clone()))?;

        if row.version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: entity.clone(),
                expected: expected_version,
                found: row.version,
            });
        }
        if row.status != record.from {
            return Err(StoreError::InvariantViolation(format!(
                "{entity} status {} does not match record.from {}",
                row.status, record.from
            )));
        }

        row.status = record.to.clone();
        row.version += 1;
        row.updated_at = record.at;
        let updated = row.clone();
        tracing::debug!(
            entity = %updated.entity,
            from = %record.from,
            to = %record.to,
            version = updated.version,
            "transition committed"
        );
        inner.log.push(record);
        Ok(updated)
    }

    // ── Timeline ─────────────────────────────────────────────────────

    /// The entity's transition records, ascending by timestamp; records
    /// sharing a timestamp keep their commit order. Callers may commit
    /// with an earlier timestamp than the log tail, so the read sorts
    /// rather than trusting append order.
    pub fn timeline(&self, entity: &EntityRef) -> Vec<TransitionRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<TransitionRecord> = inner
            .log
            .iter()
            .filter(|r| &r.entity == entity)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.at);
        records
    }

    /// When the entity most recently entered `state`: the latest-stamped
    /// record into it, ties broken by commit order.
    pub fn last_entered(&self, entity: &EntityRef, state: &State) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .log
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.entity == entity && &r.to == state)
            .max_by_key(|(i, r)| (r.at, *i))
            .map(|(_, r)| r.at)
    }

    // ── Alerts ───────────────────────────────────────────────────────

    /// The unresolved alert for (entity, state), if one exists.
    pub fn open_alert(&self, entity: &EntityRef, state: &State) -> Option<SlaAlert> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .alerts
            .iter()
            .find(|a| &a.entity == entity && &a.state == state && a.is_open())
            .cloned()
    }

    /// Record an alert unless an unresolved one already exists for the
    /// same (entity, state); returns the stored alert and whether this
    /// call created it.
    pub fn raise_alert(&self, alert: SlaAlert) -> (SlaAlert, bool) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(open) = inner
            .alerts
            .iter()
            .find(|a| a.entity == alert.entity && a.state == alert.state && a.is_open())
        {
            return (open.clone(), false);
        }
        inner.alerts.push(alert.clone());
        (alert, true)
    }

    /// Resolve all open alerts for (entity, state), stamping the
    /// resolution time and computed duration. Rows are marked, never
    /// removed. Returns the alerts that were resolved by this call.
    pub fn resolve_alerts(
        &self,
        entity: &EntityRef,
        state: &State,
        now: DateTime<Utc>,
    ) -> Vec<SlaAlert> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut resolved = Vec::new();
        for alert in inner
            .alerts
            .iter_mut()
            .filter(|a| &a.entity == entity && &a.state == state && a.is_open())
        {
            alert.resolved_at = Some(now);
            alert.duration_secs = Some((now - alert.raised_at).num_seconds().max(0));
            resolved.push(alert.clone());
        }
        resolved
    }

    /// Every alert row, open and resolved.
    pub fn alerts(&self) -> Vec<SlaAlert> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.alerts.clone()
    }
}
