//! Dwell-time (SLA) monitoring.
//!
//! A threshold is configured per `(kind, state)`. The monitor raises an
//! alert once an entity has sat in a tracked state past its threshold,
//! at most one unresolved alert per `(entity, state)`, and resolves open
//! alerts when the entity leaves the state. Alerts are marked resolved
//! with a computed duration, never deleted.
//!
//! Raising happens on the periodic [`SlaMonitor::scan`]; resolution
//! happens on the executor's exit hook, with `scan` sweeping up any
//! stale alert whose entity has since moved on. The [`metrics`] module
//! derives per-state dwell durations from the same timeline.

#![deny(unsafe_code)]

pub mod metrics;
pub mod monitor;
pub mod policy;

pub use metrics::{SlaVerdict, StateDwell};
pub use monitor::{ScanReport, SlaMonitor};
pub use policy::{SlaPolicy, SlaThreshold};
