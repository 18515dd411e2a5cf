//! API handlers.

use crate::error::{ApiError, ApiResult};
use crate::identity::{actor_from_headers, identity};
use crate::state::AppState;
use axum::{
    extract::{Path, State as AxumState},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use limsflow_engine::{BulkOutcome, BulkRequest, TransitionRequest};
use limsflow_rules::WorkflowDefinitionView;
use limsflow_sla::StateDwell;
use limsflow_types::{
    ActorId, EntityId, EntityRef, Kind, SlaAlert, State, WorkflowError,
};
use serde::{Deserialize, Serialize};

// ── Health ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
}

pub async fn health(AxumState(state): AxumState<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    })
}

// ── Entity reads ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EntityResponse {
    pub id: EntityId,
    pub kind: Kind,
    pub status: State,
}

pub async fn get_entity(
    AxumState(state): AxumState<AppState>,
    Path((kind, id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> ApiResult<Json<EntityResponse>> {
    let (actor, lab) = identity(&headers)?;
    state.resolver.resolve(&actor, &lab)?;
    let entity = EntityRef::new(Kind::new(kind), EntityId(id));
    let row = state.executor.entity_in_scope(&entity, &lab)?;
    Ok(Json(EntityResponse {
        id: entity.id,
        kind: entity.kind,
        status: row.status,
    }))
}

#[derive(Debug, Serialize)]
pub struct TransitionsResponse {
    pub id: EntityId,
    pub kind: Kind,
    pub current: State,
    pub allowed: Vec<State>,
}

pub async fn get_transitions(
    AxumState(state): AxumState<AppState>,
    Path((kind, id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> ApiResult<Json<TransitionsResponse>> {
    let (actor, lab) = identity(&headers)?;
    let entity = EntityRef::new(Kind::new(kind), EntityId(id));
    let (current, allowed) = state.executor.allowed_transitions(&entity, &actor, &lab)?;
    Ok(Json(TransitionsResponse {
        id: entity.id,
        kind: entity.kind,
        current,
        allowed,
    }))
}

// ── Transition execution ─────────────────────────────────────────────

/// Mutation payload. `to` is canonical; `to_status` and `status` are
/// accepted as legacy aliases only.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionPayload {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub to_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TransitionPayload {
    pub fn target(&self) -> Option<State> {
        [&self.to, &self.to_status, &self.status]
            .into_iter()
            .flatten()
            .map(|raw| raw.trim())
            .find(|raw| !raw.is_empty())
            .map(State::new)
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub id: EntityId,
    pub kind: Kind,
    pub from: State,
    pub to: State,
    pub status: State,
}

pub async fn execute_transition(
    AxumState(state): AxumState<AppState>,
    Path((kind, id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(payload): Json<TransitionPayload>,
) -> ApiResult<Json<TransitionResponse>> {
    let (actor, lab) = identity(&headers)?;
    let target = payload
        .target()
        .ok_or_else(|| WorkflowError::validation("to", "this field is required"))?;

    let receipt = state.executor.execute(TransitionRequest {
        entity: EntityRef::new(Kind::new(kind), EntityId(id)),
        target,
        actor,
        lab,
        comment: payload.comment,
    })?;

    Ok(Json(TransitionResponse {
        id: receipt.id,
        kind: receipt.kind,
        from: receipt.from,
        to: receipt.to,
        status: receipt.status,
    }))
}

// ── Timeline ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub user: ActorId,
    pub from: State,
    pub to: State,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub id: EntityId,
    pub kind: Kind,
    pub timeline: Vec<TimelineEntry>,
}

pub async fn get_timeline(
    AxumState(state): AxumState<AppState>,
    Path((kind, id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> ApiResult<Json<TimelineResponse>> {
    let (actor, lab) = identity(&headers)?;
    state.resolver.resolve(&actor, &lab)?;
    let entity = EntityRef::new(Kind::new(kind), EntityId(id));
    state.executor.entity_in_scope(&entity, &lab)?;

    let timeline = state
        .timeline
        .iter(&entity)
        .map(|record| TimelineEntry {
            at: record.at,
            user: record.actor,
            from: record.from,
            to: record.to,
            comment: record.comment,
        })
        .collect();

    Ok(Json(TimelineResponse {
        id: entity.id,
        kind: entity.kind,
        timeline,
    }))
}

// ── Workflow metrics ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub id: EntityId,
    pub kind: Kind,
    pub metrics: Vec<StateDwell>,
}

/// Time spent in each state, derived from the timeline and annotated
/// with the SLA verdict per dwell.
pub async fn get_metrics(
    AxumState(state): AxumState<AppState>,
    Path((kind, id)): Path<(String, u64)>,
    headers: HeaderMap,
) -> ApiResult<Json<MetricsResponse>> {
    let (actor, lab) = identity(&headers)?;
    state.resolver.resolve(&actor, &lab)?;
    let entity = EntityRef::new(Kind::new(kind), EntityId(id));
    let row = state.executor.entity_in_scope(&entity, &lab)?;

    let metrics = state.sla.time_in_states(&row, Utc::now());
    Ok(Json(MetricsResponse {
        id: entity.id,
        kind: entity.kind,
        metrics,
    }))
}

// ── Bulk ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkPayload {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub target_status: Option<String>,
    #[serde(default)]
    pub object_ids: Option<Vec<u64>>,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn bulk_apply(
    AxumState(state): AxumState<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BulkPayload>,
) -> ApiResult<Json<BulkOutcome>> {
    let (actor, lab) = identity(&headers)?;
    let kind = payload
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WorkflowError::validation("kind", "this field is required"))?;
    let target = payload
        .target_status
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WorkflowError::validation("target_status", "this field is required"))?;
    let ids = payload
        .object_ids
        .ok_or_else(|| WorkflowError::validation("object_ids", "this field is required"))?;

    let outcome = state.bulk.apply(BulkRequest {
        kind: Kind::new(kind),
        target: State::new(target),
        ids: ids.into_iter().map(EntityId).collect(),
        actor,
        lab,
        comment: payload.comment,
    });
    Ok(Json(outcome))
}

// ── Definition introspection ─────────────────────────────────────────

pub async fn get_definition(
    AxumState(state): AxumState<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<WorkflowDefinitionView>> {
    actor_from_headers(&headers)?;
    let view = state.rules.definition(&Kind::new(kind))?;
    Ok(Json(view))
}

// ── SLA ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub raised: usize,
    pub resolved: usize,
}

pub async fn sla_scan(
    AxumState(state): AxumState<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScanResponse>> {
    actor_from_headers(&headers)?;
    let report = state.sla.scan(Utc::now());
    Ok(Json(ScanResponse {
        raised: report.raised.len(),
        resolved: report.resolved.len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<SlaAlert>,
}

/// Alerts for entities in the caller's laboratory, open and resolved.
pub async fn list_alerts(
    AxumState(state): AxumState<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AlertsResponse>> {
    let (actor, lab) = identity(&headers)?;
    state.resolver.resolve(&actor, &lab)?;

    let in_scope: std::collections::HashSet<EntityRef> = state
        .store
        .entities()
        .into_iter()
        .filter(|row| row.lab == lab)
        .map(|row| row.entity)
        .collect();
    let alerts = state
        .store
        .alerts()
        .into_iter()
        .filter(|alert| in_scope.contains(&alert.entity))
        .collect();
    Ok(Json(AlertsResponse { alerts }))
}
