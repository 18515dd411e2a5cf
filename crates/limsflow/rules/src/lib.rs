//! The workflow rule table: pure, immutable transition configuration.
//!
//! A [`RuleTable`] maps each entity kind to its status universe, the
//! transition edges between statuses, and the roles allowed to traverse
//! each edge. Terminal states are derived, not declared: a state with no
//! outgoing edges can never be left.
//!
//! The table is built once at startup ([`builtin()`] carries the
//! laboratory defaults) and then shared by reference — there is no
//! mutation path after construction. Lookups against an unknown kind or
//! state fail with a configuration error, never with a silent allow.

#![deny(unsafe_code)]

pub mod builtin;
pub mod roles;
pub mod table;

pub use builtin::builtin;
pub use roles::normalize_role;
pub use table::{KindRules, RuleTable, WorkflowDefinitionView};
