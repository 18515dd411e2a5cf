//! Permission resolution for the workflow engine.
//!
//! The engine never authenticates anyone; it is handed an [`Actor`] by
//! the identity collaborator and resolves that actor's effective roles
//! within one laboratory scope. Resolution is a read-only lookup:
//!
//! 1. the actor must be authenticated — a missing identity is
//!    [`WorkflowError::Unauthenticated`], not a role failure;
//! 2. the scope is explicit — callers pass the laboratory, nothing is
//!    inferred from a default;
//! 3. the actor must hold at least one membership in that laboratory,
//!    otherwise [`WorkflowError::PermissionDenied`];
//! 4. the elevated capability short-circuits the membership check (it
//!    resolves to `ADMIN`) but grants nothing beyond what the rule
//!    table allows — terminal lock and edge legality still apply.

#![deny(unsafe_code)]

use limsflow_rules::normalize_role;
use limsflow_types::{Actor, ActorId, LabId, Role, WorkflowError, WorkflowResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

// ── Membership store ─────────────────────────────────────────────────

/// Read-only view of the external membership store: which roles an
/// actor holds within a laboratory.
pub trait MembershipStore: Send + Sync {
    /// Raw (un-normalized) role codes for the actor in the lab.
    fn roles_for(&self, actor: &ActorId, lab: &LabId) -> Vec<Role>;
}

/// In-memory membership table, used by tests and single-process
/// deployments. Grants are keyed by (actor, lab).
#[derive(Default)]
pub struct InMemoryMemberships {
    grants: RwLock<HashMap<(ActorId, LabId), BTreeSet<Role>>>,
}

impl InMemoryMemberships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a role to an actor within a lab. The raw role string is
    /// stored as-is; normalization happens at resolution time.
    pub fn grant(&self, actor: ActorId, lab: LabId, role: impl AsRef<str>) {
        let mut grants = self.grants.write().unwrap_or_else(|e| e.into_inner());
        grants
            .entry((actor, lab))
            .or_default()
            .insert(Role::new(role));
    }
}

impl MembershipStore for InMemoryMemberships {
    fn roles_for(&self, actor: &ActorId, lab: &LabId) -> Vec<Role> {
        let grants = self.grants.read().unwrap_or_else(|e| e.into_inner());
        grants
            .get(&(actor.clone(), lab.clone()))
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

/// Resolves an actor's effective role set within a laboratory.
#[derive(Clone)]
pub struct PermissionResolver {
    memberships: std::sync::Arc<dyn MembershipStore>,
}

impl PermissionResolver {
    pub fn new(memberships: std::sync::Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// Effective, normalized roles for the actor in the lab.
    pub fn resolve(&self, actor: &Actor, lab: &LabId) -> WorkflowResult<BTreeSet<Role>> {
        let actor_id = actor.id.as_ref().ok_or(WorkflowError::Unauthenticated)?;

        if actor.superuser {
            return Ok(BTreeSet::from([Role::new("ADMIN")]));
        }

        let roles: BTreeSet<Role> = self
            .memberships
            .roles_for(actor_id, lab)
            .iter()
            .map(|r| normalize_role(r.as_str()))
            .collect();

        if roles.is_empty() {
            tracing::debug!(actor = %actor_id, lab = %lab, "no membership in laboratory");
            return Err(WorkflowError::PermissionDenied(format!(
                "no membership in laboratory {lab}"
            )));
        }

        Ok(roles)
    }

    /// Whether the actor can see entities in the lab at all (any
    /// membership, or the elevated capability). Used by read paths.
    pub fn has_access(&self, actor: &Actor, lab: &LabId) -> WorkflowResult<bool> {
        match self.resolve(actor, lab) {
            Ok(_) => Ok(true),
            Err(WorkflowError::PermissionDenied(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }
}
