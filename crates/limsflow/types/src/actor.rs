//! Actor identity as seen by the engine.

use crate::ids::ActorId;
use serde::{Deserialize, Serialize};

/// The identity attempting an operation, as resolved by the external
/// identity collaborator. An absent `id` means the request carried no
/// authenticated identity at all, which is a different failure from an
/// authenticated actor lacking a role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Authenticated identity, if any.
    pub id: Option<ActorId>,
    /// Elevated capability. Short-circuits scope membership checks but
    /// never bypasses terminal-lock or rule-table legality.
    pub superuser: bool,
}

impl Actor {
    /// An authenticated, non-elevated actor.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: Some(ActorId::new(id)),
            superuser: false,
        }
    }

    /// An authenticated actor with the elevated capability.
    pub fn superuser(id: impl Into<String>) -> Self {
        Self {
            id: Some(ActorId::new(id)),
            superuser: true,
        }
    }

    /// A request with no authenticated identity.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            superuser: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(!Actor::anonymous().is_authenticated());
        assert!(Actor::user("u1").is_authenticated());
        assert!(Actor::superuser("root").superuser);
    }
}
