//! Guard checks: the pure decision layer in front of the executor.
//!
//! Checks run in a fixed order — terminal lock, edge legality, role
//! intersection — so a caller always sees the most specific rejection.
//! A same-state request is not a self-edge: it fails edge legality
//! (or terminal lock, when the current state is terminal) rather than
//! succeeding as a no-op, so a retried-after-success submission is
//! rejected instead of silently reapplied.

use limsflow_rules::RuleTable;
use limsflow_types::{Kind, Role, State, WorkflowError, WorkflowResult};
use std::collections::BTreeSet;

/// Decide whether `roles` may move a `kind` entity from `current` to
/// `target`. Returns `Ok(())` or the first failing check's error.
pub fn check_transition(
    rules: &RuleTable,
    kind: &Kind,
    current: &State,
    target: &State,
    roles: &BTreeSet<Role>,
) -> WorkflowResult<()> {
    if rules.is_terminal(kind, current)? {
        return Err(WorkflowError::TerminalLocked {
            kind: kind.clone(),
            from: current.clone(),
            to: target.clone(),
        });
    }

    if !rules.valid_transition(kind, current, target)? {
        return Err(WorkflowError::IllegalTransition {
            kind: kind.clone(),
            from: current.clone(),
            to: target.clone(),
        });
    }

    let required = rules.required_roles(kind, current, target)?;
    if required.is_disjoint(roles) {
        let wanted: Vec<&str> = required.iter().map(Role::as_str).collect();
        return Err(WorkflowError::PermissionDenied(format!(
            "{kind} transition {current} → {target} requires one of: {}",
            wanted.join(", ")
        )));
    }

    Ok(())
}

/// The role-filtered read-only query: which target states could `roles`
/// actually reach from `current`. Empty for terminal states and for
/// callers whose roles match no outgoing edge.
pub fn allowed_transitions(
    rules: &RuleTable,
    kind: &Kind,
    current: &State,
    roles: &BTreeSet<Role>,
) -> WorkflowResult<Vec<State>> {
    let mut allowed = Vec::new();
    for target in rules.allowed_next_states(kind, current)? {
        let required = rules.required_roles(kind, current, &target)?;
        if !required.is_disjoint(roles) {
            allowed.push(target);
        }
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsflow_rules::builtin;

    fn roles(names: &[&str]) -> BTreeSet<Role> {
        names.iter().map(Role::new).collect()
    }

    #[test]
    fn legal_edge_with_matching_role_passes() {
        let table = builtin();
        check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("RECEIVED"),
            &State::new("QC_PENDING"),
            &roles(&["LAB_TECH"]),
        )
        .unwrap();
    }

    #[test]
    fn terminal_lock_wins_over_everything() {
        let table = builtin();
        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("ARCHIVED"),
            &State::new("QC_PENDING"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::TerminalLocked { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid sample status transition: ARCHIVED → QC_PENDING (ARCHIVED is terminal)"
        );
    }

    #[test]
    fn missing_edge_is_illegal_regardless_of_role() {
        let table = builtin();
        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("RECEIVED"),
            &State::new("QC_PASSED"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid sample status transition: RECEIVED → QC_PASSED"
        );
    }

    #[test]
    fn same_state_is_not_a_self_edge() {
        let table = builtin();
        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("RECEIVED"),
            &State::new("RECEIVED"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));

        // Terminal current state still reports the lock.
        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("ARCHIVED"),
            &State::new("ARCHIVED"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::TerminalLocked { .. }));
    }

    #[test]
    fn role_mismatch_on_a_legal_edge_is_denied() {
        let table = builtin();
        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("QC_PENDING"),
            &State::new("QC_PASSED"),
            &roles(&["LAB_TECH"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied(_)));
        assert!(err.to_string().contains("QA"));
    }

    #[test]
    fn unknown_kind_and_state_are_config_errors() {
        let table = builtin();
        let err = check_transition(
            &table,
            &Kind::new("plate"),
            &State::new("RECEIVED"),
            &State::new("ARCHIVED"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownKind(_)));

        let err = check_transition(
            &table,
            &Kind::new("sample"),
            &State::new("RECEIVED"),
            &State::new("SHIPPED"),
            &roles(&["ADMIN"]),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownState { .. }));
    }

    #[test]
    fn allowed_transitions_filters_by_role() {
        let table = builtin();
        let kind = Kind::new("sample");

        let tech = allowed_transitions(&table, &kind, &State::new("RECEIVED"), &roles(&["LAB_TECH"]))
            .unwrap();
        assert_eq!(tech, vec![State::new("IN_PROCESS"), State::new("QC_PENDING")]);

        let admin = allowed_transitions(&table, &kind, &State::new("RECEIVED"), &roles(&["ADMIN"]))
            .unwrap();
        assert_eq!(admin.len(), 3);

        let qa = allowed_transitions(&table, &kind, &State::new("RECEIVED"), &roles(&["QA"])).unwrap();
        assert!(qa.is_empty());

        let terminal =
            allowed_transitions(&table, &kind, &State::new("ARCHIVED"), &roles(&["ADMIN"])).unwrap();
        assert!(terminal.is_empty());
    }
}
