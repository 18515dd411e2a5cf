//! Domain types for the limsflow workflow transition engine.
//!
//! Everything that crosses a crate boundary lives here: the normalized
//! string newtypes for workflow kinds, states, and roles; entity and
//! laboratory references; the immutable [`TransitionRecord`] appended per
//! successful transition; SLA alert records; and the [`WorkflowError`]
//! taxonomy shared by every layer of the engine.

#![deny(unsafe_code)]

pub mod actor;
pub mod error;
pub mod ids;
pub mod record;

pub use actor::Actor;
pub use error::{WorkflowError, WorkflowResult};
pub use ids::{ActorId, AlertId, EntityId, EntityRef, Kind, LabId, RecordId, Role, State};
pub use record::{AlertSeverity, SlaAlert, TransitionReceipt, TransitionRecord};
