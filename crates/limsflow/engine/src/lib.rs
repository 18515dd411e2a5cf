//! The transition engine.
//!
//! [`TransitionExecutor::execute`] is the single authoritative path for
//! changing an entity's status. Every call runs the same ordered steps:
//! consistency read, role resolution, guard checks (terminal lock, edge
//! legality, role intersection), the version-conditioned status write
//! plus timeline append, and the SLA exit/enter hooks. No other
//! component writes an entity status or a timeline record.

#![deny(unsafe_code)]

pub mod bulk;
pub mod executor;
pub mod guard;
pub mod timeline;

pub use bulk::{BulkCoordinator, BulkItemOutcome, BulkOutcome, BulkRequest};
pub use executor::{TransitionExecutor, TransitionRequest};
pub use timeline::TimelineRecorder;
