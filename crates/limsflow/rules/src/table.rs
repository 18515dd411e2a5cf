//! Rule table data structure and pure lookup functions.

use limsflow_types::{Kind, Role, State, WorkflowError, WorkflowResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

// ── Per-kind rules ───────────────────────────────────────────────────

/// The status universe and transition edges for one entity kind.
#[derive(Clone, Debug)]
pub struct KindRules {
    kind: Kind,
    states: BTreeSet<State>,
    /// from → (to → roles allowed on that edge).
    edges: BTreeMap<State, BTreeMap<State, BTreeSet<Role>>>,
}

impl KindRules {
    /// Create rules for a kind with its full status universe.
    pub fn new<S: AsRef<str>>(kind: Kind, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            states: states.into_iter().map(State::new).collect(),
            edges: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Register an edge. Both endpoints must be in the status universe —
    /// a typo here is a configuration fault, not a runtime rejection.
    pub fn add_edge<R: AsRef<str>>(
        &mut self,
        from: &str,
        to: &str,
        roles: impl IntoIterator<Item = R>,
    ) -> WorkflowResult<()> {
        let from = State::new(from);
        let to = State::new(to);
        for state in [&from, &to] {
            if !self.states.contains(state) {
                return Err(WorkflowError::UnknownState {
                    kind: self.kind.clone(),
                    state: state.clone(),
                });
            }
        }
        self.edges
            .entry(from)
            .or_default()
            .insert(to, roles.into_iter().map(|r| Role::new(r.as_ref())).collect());
        Ok(())
    }

    fn require_state(&self, state: &State) -> WorkflowResult<()> {
        if self.states.contains(state) {
            Ok(())
        } else {
            Err(WorkflowError::UnknownState {
                kind: self.kind.clone(),
                state: state.clone(),
            })
        }
    }
}

// ── Rule table ───────────────────────────────────────────────────────

/// Immutable mapping from entity kind to its workflow rules.
///
/// Built once, then passed by reference into the guard layer and the
/// executor. All query methods are pure; none touch an entity instance.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    kinds: BTreeMap<Kind, KindRules>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for one kind, consuming and returning the table so
    /// construction reads as a chain.
    pub fn with_kind(mut self, rules: KindRules) -> Self {
        self.kinds.insert(rules.kind.clone(), rules);
        self
    }

    pub fn known_kind(&self, kind: &Kind) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.kinds.keys()
    }

    fn rules_for(&self, kind: &Kind) -> WorkflowResult<&KindRules> {
        self.kinds
            .get(kind)
            .ok_or_else(|| WorkflowError::UnknownKind(kind.clone()))
    }

    /// Whether `state` belongs to the kind's status universe.
    pub fn known_state(&self, kind: &Kind, state: &State) -> WorkflowResult<bool> {
        Ok(self.rules_for(kind)?.states.contains(state))
    }

    /// Whether the (from, to) edge exists. Unknown kind or state is a
    /// configuration error, distinct from an ordinary `false`.
    pub fn valid_transition(&self, kind: &Kind, from: &State, to: &State) -> WorkflowResult<bool> {
        let rules = self.rules_for(kind)?;
        rules.require_state(from)?;
        rules.require_state(to)?;
        Ok(rules
            .edges
            .get(from)
            .is_some_and(|targets| targets.contains_key(to)))
    }

    /// Sorted outgoing targets from `from`. An empty vector signals a
    /// terminal state.
    pub fn allowed_next_states(&self, kind: &Kind, from: &State) -> WorkflowResult<Vec<State>> {
        let rules = self.rules_for(kind)?;
        rules.require_state(from)?;
        Ok(rules
            .edges
            .get(from)
            .map(|targets| targets.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Whether `state` has no outgoing edges.
    pub fn is_terminal(&self, kind: &Kind, state: &State) -> WorkflowResult<bool> {
        Ok(self.allowed_next_states(kind, state)?.is_empty())
    }

    /// Roles authorized to traverse the (from, to) edge. Empty when the
    /// edge does not exist; legality is checked separately.
    pub fn required_roles(
        &self,
        kind: &Kind,
        from: &State,
        to: &State,
    ) -> WorkflowResult<BTreeSet<Role>> {
        let rules = self.rules_for(kind)?;
        rules.require_state(from)?;
        rules.require_state(to)?;
        Ok(rules
            .edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .cloned()
            .unwrap_or_default())
    }

    /// JSON-serializable introspection view for UI callers.
    pub fn definition(&self, kind: &Kind) -> WorkflowResult<WorkflowDefinitionView> {
        let rules = self.rules_for(kind)?;
        let transitions: BTreeMap<State, Vec<State>> = rules
            .states
            .iter()
            .map(|state| {
                let targets = rules
                    .edges
                    .get(state)
                    .map(|t| t.keys().cloned().collect())
                    .unwrap_or_default();
                (state.clone(), targets)
            })
            .collect();
        let terminal_states = transitions
            .iter()
            .filter(|(_, targets)| targets.is_empty())
            .map(|(state, _)| state.clone())
            .collect();
        Ok(WorkflowDefinitionView {
            kind: kind.clone(),
            states: rules.states.iter().cloned().collect(),
            transitions,
            terminal_states,
        })
    }
}

/// Stable, serializable definition of one kind's workflow.
#[derive(Clone, Debug, Serialize)]
pub struct WorkflowDefinitionView {
    pub kind: Kind,
    pub states: Vec<State>,
    pub transitions: BTreeMap<State, Vec<State>>,
    pub terminal_states: Vec<State>,
}
