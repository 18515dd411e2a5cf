//! Caller identity and laboratory scope, read from request headers.
//!
//! The engine never authenticates anyone; an upstream gateway is
//! expected to validate credentials and stamp these headers. A missing
//! actor header is a 401; a missing laboratory header is a 400 — the
//! scope must always be explicit, never inferred.

use crate::error::ApiError;
use axum::http::HeaderMap;
use limsflow_types::{Actor, LabId, WorkflowError};

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const LAB_HEADER: &str = "x-laboratory";
pub const SUPERUSER_HEADER: &str = "x-superuser";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = header_value(headers, ACTOR_HEADER).ok_or(WorkflowError::Unauthenticated)?;
    let elevated = header_value(headers, SUPERUSER_HEADER)
        .is_some_and(|v| matches!(v, "1" | "true" | "True" | "TRUE"));
    Ok(if elevated {
        Actor::superuser(id)
    } else {
        Actor::user(id)
    })
}

pub fn lab_from_headers(headers: &HeaderMap) -> Result<LabId, ApiError> {
    let lab = header_value(headers, LAB_HEADER).ok_or_else(|| {
        WorkflowError::validation(LAB_HEADER, "laboratory scope header is required")
    })?;
    Ok(LabId::new(lab))
}

/// Actor and laboratory together, in the order the checks must run:
/// identity first (401 wins over 400).
pub fn identity(headers: &HeaderMap) -> Result<(Actor, LabId), ApiError> {
    let actor = actor_from_headers(headers)?;
    let lab = lab_from_headers(headers)?;
    Ok((actor, lab))
}
