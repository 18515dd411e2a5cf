//! Application state shared by API handlers.

use limsflow_access::{InMemoryMemberships, PermissionResolver};
use limsflow_engine::{BulkCoordinator, TimelineRecorder, TransitionExecutor};
use limsflow_rules::RuleTable;
use limsflow_sla::{SlaMonitor, SlaPolicy};
use limsflow_store::EntityStore;
use limsflow_types::{ActorId, Kind, LabId, State};
use std::sync::Arc;

/// Shared application state: every handler works through these handles.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleTable>,
    pub resolver: PermissionResolver,
    pub store: Arc<EntityStore>,
    pub memberships: Arc<InMemoryMemberships>,
    pub executor: Arc<TransitionExecutor>,
    pub bulk: Arc<BulkCoordinator>,
    pub timeline: Arc<TimelineRecorder>,
    pub sla: Arc<SlaMonitor>,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire the engine together around one in-memory store.
    pub fn new(rules: Arc<RuleTable>, policy: SlaPolicy) -> Self {
        let store = Arc::new(EntityStore::new());
        let memberships = Arc::new(InMemoryMemberships::new());
        let resolver = PermissionResolver::new(memberships.clone());
        let sla = Arc::new(SlaMonitor::new(policy, store.clone()));
        let executor = Arc::new(TransitionExecutor::new(
            rules.clone(),
            resolver.clone(),
            store.clone(),
            sla.clone(),
        ));
        let bulk = Arc::new(BulkCoordinator::new(executor.clone()));
        let timeline = Arc::new(TimelineRecorder::new(store.clone()));

        Self {
            rules,
            resolver,
            store,
            memberships,
            executor,
            bulk,
            timeline,
            sla,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Demo fixtures: a small lab with one member per role and a handful
    /// of entities to push through the workflow. Seeding creates fresh
    /// entities only; it never rewrites an existing status.
    pub fn seed_demo(&self) {
        let lab = LabId::new("lab-a");
        self.memberships
            .grant(ActorId::new("tech1"), lab.clone(), "LAB_TECH");
        self.memberships.grant(ActorId::new("qa1"), lab.clone(), "QA");
        self.memberships
            .grant(ActorId::new("admin"), lab.clone(), "ADMIN");

        let now = chrono::Utc::now();
        for _ in 0..3 {
            self.store
                .seed(Kind::new("sample"), lab.clone(), State::new("RECEIVED"), now);
        }
        self.store
            .seed(Kind::new("experiment"), lab.clone(), State::new("PLANNED"), now);
        tracing::info!(lab = %lab, "demo fixtures seeded");
    }

    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}
