//! HTTP binding for the limsflow engine.
//!
//! Routes live under `/api/v1`. Callers identify themselves with the
//! `x-actor-id` header and name their laboratory scope with
//! `x-laboratory`; membership lookup and role resolution happen
//! server-side. Domain errors map to HTTP statuses in [`error`], and a
//! background task drives the periodic SLA scan.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod router;
pub mod scheduler;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
pub use router::create_router;
pub use server::Server;
pub use state::AppState;
