//! The SLA monitor: state-change hooks and the periodic scan.

use crate::metrics::{self, StateDwell};
use crate::policy::SlaPolicy;
use chrono::{DateTime, Utc};
use limsflow_store::{EntityRow, EntityStore};
use limsflow_types::{AlertId, EntityRef, SlaAlert, State};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// What one [`SlaMonitor::scan`] pass did.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    /// Alerts raised by this pass.
    pub raised: Vec<SlaAlert>,
    /// Stale alerts resolved by this pass (entity had already left the
    /// alerted state).
    pub resolved: Vec<SlaAlert>,
}

/// Watches entity dwell times against an [`SlaPolicy`].
///
/// The executor drives [`on_state_exit`](Self::on_state_exit) and
/// [`on_state_enter`](Self::on_state_enter) after each commit; a
/// scheduler drives [`scan`](Self::scan) for entities that sit in a
/// state with no intervening transition.
pub struct SlaMonitor {
    policy: SlaPolicy,
    store: Arc<EntityStore>,
}

impl SlaMonitor {
    pub fn new(policy: SlaPolicy, store: Arc<EntityStore>) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &SlaPolicy {
        &self.policy
    }

    /// The entity left `state`: resolve any open alert for that window,
    /// stamping the resolution time and duration.
    pub fn on_state_exit(&self, entity: &EntityRef, state: &State, at: DateTime<Utc>) -> Vec<SlaAlert> {
        let resolved = self.store.resolve_alerts(entity, state, at);
        for alert in &resolved {
            tracing::info!(
                entity = %alert.entity,
                state = %alert.state,
                duration_secs = alert.duration_secs,
                "sla alert resolved"
            );
        }
        resolved
    }

    /// The entity entered `state`: returns the deadline if the new state
    /// is tracked, so callers can surface or log it. Raising is left to
    /// [`scan`](Self::scan) once the deadline actually passes.
    pub fn on_state_enter(
        &self,
        entity: &EntityRef,
        state: &State,
        at: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let threshold = self.policy.threshold_for(&entity.kind, state)?;
        let deadline = at + threshold.max_age();
        tracing::debug!(entity = %entity, state = %state, %deadline, "sla window opened");
        Some(deadline)
    }

    /// How long the entity has spent in each state, oldest first, each
    /// dwell annotated with the policy verdict.
    pub fn time_in_states(&self, row: &EntityRow, now: DateTime<Utc>) -> Vec<StateDwell> {
        let records = self.store.timeline(&row.entity);
        metrics::compute_dwells(&self.policy, row, &records, now)
    }

    /// Walk every entity, raise alerts for exceeded windows, and sweep
    /// up stale alerts whose entity has since changed state.
    ///
    /// At most one unresolved alert exists per `(entity, state)`, so
    /// repeated scans with no state change raise nothing new.
    pub fn scan(&self, now: DateTime<Utc>) -> ScanReport {
        let mut report = ScanReport::default();
        let rows = self.store.entities();

        // One pass over the alert table: an open alert for a state the
        // entity is no longer in means the exit hook was never observed
        // for that window.
        let status_by_entity: HashMap<&EntityRef, &State> =
            rows.iter().map(|r| (&r.entity, &r.status)).collect();
        let stale: Vec<(EntityRef, State)> = self
            .store
            .alerts()
            .into_iter()
            .filter(|a| {
                a.is_open()
                    && status_by_entity
                        .get(&a.entity)
                        .is_some_and(|current| **current != a.state)
            })
            .map(|a| (a.entity, a.state))
            .collect();
        for (entity, state) in stale {
            report
                .resolved
                .extend(self.store.resolve_alerts(&entity, &state, now));
        }

        for row in rows {
            let Some(threshold) = self.policy.threshold_for(&row.entity.kind, &row.status) else {
                continue;
            };

            // When the entity entered its current state: latest timeline
            // record into that state, or creation time for seeded rows.
            let entered_at = self
                .store
                .last_entered(&row.entity, &row.status)
                .unwrap_or(row.created_at);
            if now <= entered_at + threshold.max_age() {
                continue;
            }

            let (alert, created) = self.store.raise_alert(SlaAlert {
                id: AlertId::generate(),
                entity: row.entity.clone(),
                state: row.status.clone(),
                severity: threshold.severity,
                threshold_secs: threshold.max_age_secs,
                raised_at: now,
                resolved_at: None,
                duration_secs: None,
            });
            if created {
                tracing::warn!(
                    entity = %alert.entity,
                    state = %alert.state,
                    severity = ?alert.severity,
                    threshold_secs = alert.threshold_secs,
                    "sla alert raised"
                );
                report.raised.push(alert);
            }
        }

        report
    }
}
