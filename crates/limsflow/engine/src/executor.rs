//! The executor: the single authoritative mutation path.

use crate::guard;
use chrono::{DateTime, Utc};
use limsflow_access::PermissionResolver;
use limsflow_rules::RuleTable;
use limsflow_sla::SlaMonitor;
use limsflow_store::{EntityRow, EntityStore};
use limsflow_types::{
    Actor, EntityRef, LabId, State, TransitionReceipt, TransitionRecord, WorkflowError,
    WorkflowResult,
};
use std::sync::Arc;

/// One transition attempt, fully specified.
#[derive(Clone, Debug)]
pub struct TransitionRequest {
    pub entity: EntityRef,
    pub target: State,
    pub actor: Actor,
    pub lab: LabId,
    pub comment: Option<String>,
}

/// Executes transitions by running the fixed step sequence: consistency
/// read, role resolution, guard checks, version-conditioned commit, SLA
/// hooks. Rejections in the early steps attempt no mutation; a version
/// mismatch at commit time aborts with [`WorkflowError::Conflict`].
pub struct TransitionExecutor {
    rules: Arc<RuleTable>,
    resolver: PermissionResolver,
    store: Arc<EntityStore>,
    sla: Arc<SlaMonitor>,
}

impl TransitionExecutor {
    pub fn new(
        rules: Arc<RuleTable>,
        resolver: PermissionResolver,
        store: Arc<EntityStore>,
        sla: Arc<SlaMonitor>,
    ) -> Self {
        Self {
            rules,
            resolver,
            store,
            sla,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// The entity row, if it exists and belongs to `lab`. Entities
    /// outside the caller's laboratory read as absent rather than
    /// leaking their existence.
    pub fn entity_in_scope(&self, entity: &EntityRef, lab: &LabId) -> WorkflowResult<EntityRow> {
        let row = self.store.snapshot(entity)?;
        if &row.lab != lab {
            return Err(WorkflowError::NotFound(entity.to_string()));
        }
        Ok(row)
    }

    /// Role-filtered allowed-transitions query for one entity: resolves
    /// the actor's roles and asks the guard which targets they could
    /// reach from the entity's current status.
    pub fn allowed_transitions(
        &self,
        entity: &EntityRef,
        actor: &Actor,
        lab: &LabId,
    ) -> WorkflowResult<(State, Vec<State>)> {
        let row = self.entity_in_scope(entity, lab)?;
        let roles = self.resolver.resolve(actor, lab)?;
        let allowed = guard::allowed_transitions(&self.rules, &entity.kind, &row.status, &roles)?;
        Ok((row.status, allowed))
    }

    pub fn execute(&self, request: TransitionRequest) -> WorkflowResult<TransitionReceipt> {
        self.execute_at(request, Utc::now())
    }

    /// Execute one transition at an explicit timestamp.
    pub fn execute_at(
        &self,
        request: TransitionRequest,
        now: DateTime<Utc>,
    ) -> WorkflowResult<TransitionReceipt> {
        if request.target.is_empty() {
            return Err(WorkflowError::validation("to", "target status is required"));
        }

        // Step 1: consistency read; the row's version conditions the write.
        let row = self.entity_in_scope(&request.entity, &request.lab)?;

        // Step 2: role resolution (rejects anonymous and non-member actors).
        let roles = self.resolver.resolve(&request.actor, &request.lab)?;

        // Step 3: guard checks, most specific rejection first.
        if let Err(err) = guard::check_transition(
            &self.rules,
            &request.entity.kind,
            &row.status,
            &request.target,
            &roles,
        ) {
            tracing::info!(
                entity = %request.entity,
                from = %row.status,
                to = %request.target,
                error = %err,
                "transition rejected"
            );
            return Err(err);
        }

        // The resolver has already rejected anonymous actors.
        let actor_id = request.actor.id.clone().ok_or(WorkflowError::Unauthenticated)?;

        // Step 4: status write + timeline append, atomically, conditioned
        // on the version read in step 1.
        let record = TransitionRecord::new(
            request.entity.clone(),
            request.lab.clone(),
            row.status.clone(),
            request.target.clone(),
            actor_id,
            now,
            request.comment.clone(),
        );
        let record_id = record.id.clone();
        let updated = self.store.apply_transition(&request.entity, row.version, record)?;

        tracing::info!(
            entity = %request.entity,
            lab = %request.lab,
            from = %row.status,
            to = %updated.status,
            "transition applied"
        );

        // Step 5: SLA hooks for the departed and entered states.
        self.sla.on_state_exit(&request.entity, &row.status, now);
        self.sla.on_state_enter(&request.entity, &updated.status, now);

        // Step 6: the receipt mirrors the committed record.
        Ok(TransitionReceipt {
            id: request.entity.id,
            kind: request.entity.kind.clone(),
            from: row.status,
            to: request.target,
            status: updated.status,
            record_id,
            at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsflow_access::InMemoryMemberships;
    use limsflow_sla::{SlaPolicy, SlaThreshold};
    use limsflow_types::{AlertSeverity, Kind};

    struct Fixture {
        executor: TransitionExecutor,
        store: Arc<EntityStore>,
        lab: LabId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(EntityStore::new());
        let lab = LabId::new("lab-a");

        let memberships = Arc::new(InMemoryMemberships::new());
        memberships.grant(limsflow_types::ActorId::new("tech1"), lab.clone(), "TECHNICIAN");
        memberships.grant(limsflow_types::ActorId::new("qa1"), lab.clone(), "QA");
        memberships.grant(limsflow_types::ActorId::new("guest"), lab.clone(), "READONLY");

        let policy = SlaPolicy::new().with_threshold(
            Kind::new("sample"),
            State::new("QC_PENDING"),
            SlaThreshold::hours(24, AlertSeverity::Warning),
        );
        let sla = Arc::new(SlaMonitor::new(policy, store.clone()));

        Fixture {
            executor: TransitionExecutor::new(
                Arc::new(limsflow_rules::builtin()),
                PermissionResolver::new(memberships),
                store.clone(),
                sla,
            ),
            store,
            lab,
        }
    }

    fn seed_sample(fx: &Fixture, status: &str) -> EntityRef {
        fx.store
            .seed(Kind::new("sample"), fx.lab.clone(), State::new(status), Utc::now())
            .entity
    }

    fn request(fx: &Fixture, entity: &EntityRef, actor: Actor, target: &str) -> TransitionRequest {
        TransitionRequest {
            entity: entity.clone(),
            target: State::new(target),
            actor,
            lab: fx.lab.clone(),
            comment: None,
        }
    }

    #[test]
    fn technician_moves_received_sample_to_qc_pending() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");

        let receipt = fx
            .executor
            .execute(request(&fx, &entity, Actor::user("tech1"), "QC_PENDING"))
            .unwrap();

        assert_eq!(receipt.from, State::new("RECEIVED"));
        assert_eq!(receipt.to, State::new("QC_PENDING"));
        assert_eq!(receipt.status, receipt.to);

        // Exactly one record, matching the receipt.
        let timeline = fx.store.timeline(&entity);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].id, receipt.record_id);
        assert_eq!(timeline[0].comment, None);
    }

    #[test]
    fn role_denial_writes_nothing() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");

        let err = fx
            .executor
            .execute(request(&fx, &entity, Actor::user("guest"), "QC_PENDING"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied(_)));
        assert_eq!(fx.store.get(&entity).unwrap().status, State::new("RECEIVED"));
        assert!(fx.store.timeline(&entity).is_empty());
    }

    #[test]
    fn terminal_entity_rejects_even_elevated_actors() {
        let fx = fixture();
        let entity = seed_sample(&fx, "ARCHIVED");

        let err = fx
            .executor
            .execute(request(&fx, &entity, Actor::superuser("root"), "QC_PENDING"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::TerminalLocked { .. }));
        assert!(fx.store.timeline(&entity).is_empty());
    }

    #[test]
    fn resubmission_after_success_is_rejected() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");
        let actor = Actor::user("tech1");

        fx.executor
            .execute(request(&fx, &entity, actor.clone(), "QC_PENDING"))
            .unwrap();
        let err = fx
            .executor
            .execute(request(&fx, &entity, actor, "QC_PENDING"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
        assert_eq!(fx.store.timeline(&entity).len(), 1);
    }

    #[test]
    fn anonymous_actor_is_unauthenticated_not_denied() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");

        let err = fx
            .executor
            .execute(request(&fx, &entity, Actor::anonymous(), "QC_PENDING"))
            .unwrap_err();
        assert_eq!(err, WorkflowError::Unauthenticated);
    }

    #[test]
    fn entity_in_another_lab_reads_as_absent() {
        let fx = fixture();
        let foreign = fx
            .store
            .seed(Kind::new("sample"), LabId::new("lab-b"), State::new("RECEIVED"), Utc::now())
            .entity;

        let err = fx
            .executor
            .execute(request(&fx, &foreign, Actor::user("tech1"), "QC_PENDING"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let fx = fixture();
        let ghost = EntityRef::new(Kind::new("sample"), limsflow_types::EntityId(99));
        let err = fx
            .executor
            .execute(request(&fx, &ghost, Actor::user("tech1"), "QC_PENDING"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn empty_target_is_a_field_scoped_validation_error() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");
        let err = fx
            .executor
            .execute(request(&fx, &entity, Actor::user("tech1"), ""))
            .unwrap_err();
        assert_eq!(err.field(), Some("to"));
    }

    #[test]
    fn commit_resolves_open_alert_for_departed_state() {
        let fx = fixture();
        let entity = seed_sample(&fx, "QC_PENDING");

        // An alert raised while the sample sat in QC_PENDING.
        let t0 = fx.store.get(&entity).unwrap().created_at;
        let scan_at = t0 + chrono::Duration::hours(25);
        // Reuse the executor's monitor by scanning through the store-backed
        // policy configured in the fixture.
        let policy = SlaPolicy::new().with_threshold(
            Kind::new("sample"),
            State::new("QC_PENDING"),
            SlaThreshold::hours(24, AlertSeverity::Warning),
        );
        let monitor = SlaMonitor::new(policy, fx.store.clone());
        assert_eq!(monitor.scan(scan_at).raised.len(), 1);

        fx.executor
            .execute_at(
                request(&fx, &entity, Actor::user("qa1"), "QC_PASSED"),
                scan_at + chrono::Duration::hours(1),
            )
            .unwrap();

        let alerts = fx.store.alerts();
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].is_open());
        assert_eq!(alerts[0].duration_secs, Some(3600));
    }

    #[test]
    fn allowed_transitions_reflects_caller_roles() {
        let fx = fixture();
        let entity = seed_sample(&fx, "QC_PENDING");

        let (current, allowed) = fx
            .executor
            .allowed_transitions(&entity, &Actor::user("qa1"), &fx.lab)
            .unwrap();
        assert_eq!(current, State::new("QC_PENDING"));
        assert_eq!(allowed, vec![State::new("QC_FAILED"), State::new("QC_PASSED")]);

        let (_, none) = fx
            .executor
            .allowed_transitions(&entity, &Actor::user("tech1"), &fx.lab)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn comment_is_carried_onto_the_record() {
        let fx = fixture();
        let entity = seed_sample(&fx, "RECEIVED");
        let mut req = request(&fx, &entity, Actor::user("tech1"), "IN_PROCESS");
        req.comment = Some("began extraction".to_string());
        fx.executor.execute(req).unwrap();
        assert_eq!(
            fx.store.timeline(&entity)[0].comment.as_deref(),
            Some("began extraction")
        );
    }
}
