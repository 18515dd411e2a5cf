//! API router configuration.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the service router: the API under `/api/v1` with request
/// tracing over the whole tree. CORS is layered by the server per its
/// configuration.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Workflows
        .route("/workflows/bulk", post(handlers::bulk_apply))
        .route("/workflows/:kind/definition", get(handlers::get_definition))
        .route(
            "/workflows/:kind/:id",
            get(handlers::get_entity).patch(handlers::execute_transition),
        )
        .route(
            "/workflows/:kind/:id/transitions",
            get(handlers::get_transitions),
        )
        .route("/workflows/:kind/:id/timeline", get(handlers::get_timeline))
        .route("/workflows/:kind/:id/metrics", get(handlers::get_metrics))
        // SLA
        .route("/sla/scan", post(handlers::sla_scan))
        .route("/sla/alerts", get(handlers::list_alerts));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use limsflow_sla::SlaPolicy;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let state = AppState::new(Arc::new(limsflow_rules::builtin()), SlaPolicy::builtin());
        state.seed_demo();
        state
    }

    fn request(method: Method, uri: &str, actor: Option<&str>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-laboratory", "lab-a");
        if let Some(actor) = actor {
            builder = builder.header("x-actor-id", actor);
        }
        builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn read_then_transition_round_trip() {
        let app = create_router(test_state());

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/workflows/sample/1", Some("tech1"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "RECEIVED");

        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/1",
                Some("tech1"),
                Some(r#"{"to": "QC_PENDING"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["from"], "RECEIVED");
        assert_eq!(body["to"], "QC_PENDING");
        assert_eq!(body["status"], "QC_PENDING");

        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/workflows/sample/1/timeline",
                Some("tech1"),
                None,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["timeline"].as_array().unwrap().len(), 1);
        assert_eq!(body["timeline"][0]["user"], "tech1");
    }

    #[tokio::test]
    async fn missing_actor_header_is_401() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(Method::GET, "/api/v1/workflows/sample/1", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn missing_lab_header_is_400() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/v1/workflows/sample/1")
                    .header("x-actor-id", "tech1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_target_is_a_field_scoped_400() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/1",
                Some("tech1"),
                Some("{}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["field"], "to");
    }

    #[tokio::test]
    async fn role_denial_is_403_with_nothing_written() {
        let app = create_router(test_state());
        // qa1 may not move RECEIVED samples.
        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/2",
                Some("qa1"),
                Some(r#"{"to": "QC_PENDING"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(Method::GET, "/api/v1/workflows/sample/2", Some("qa1"), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "RECEIVED");
    }

    #[tokio::test]
    async fn bulk_reports_per_item_outcomes() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/workflows/bulk",
                Some("tech1"),
                Some(r#"{"kind": "sample", "target_status": "QC_PENDING", "object_ids": [1, 2, 99]}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok_count"], 2);
        assert_eq!(body["skipped_count"], 1);
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn terminal_transition_is_409() {
        let app = create_router(test_state());
        // Archive sample 3 as admin, then try to move it again.
        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/3",
                Some("admin"),
                Some(r#"{"to": "ARCHIVED"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/3",
                Some("admin"),
                Some(r#"{"to": "IN_PROCESS"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["code"], "TERMINAL_STATE");
    }

    #[tokio::test]
    async fn definition_endpoint_describes_the_kind() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/workflows/sample/definition",
                Some("tech1"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "sample");
        assert!(body["terminal_states"]
            .as_array()
            .unwrap()
            .contains(&Value::String("ARCHIVED".into())));
    }

    #[tokio::test]
    async fn unknown_kind_is_400_not_404() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/workflows/plate/definition",
                Some("tech1"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "UNKNOWN_KIND");
    }

    #[tokio::test]
    async fn metrics_endpoint_reports_dwell_per_state() {
        let app = create_router(test_state());
        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                "/api/v1/workflows/sample/1",
                Some("tech1"),
                Some(r#"{"to": "QC_PENDING"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                Method::GET,
                "/api/v1/workflows/sample/1/metrics",
                Some("tech1"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let metrics = body["metrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0]["state"], "RECEIVED");
        assert!(metrics[0]["exited_at"].is_string());
        assert_eq!(metrics[1]["state"], "QC_PENDING");
        assert!(metrics[1]["exited_at"].is_null());
        assert_eq!(metrics[1]["sla_status"], "OK");
    }

    #[tokio::test]
    async fn sla_scan_endpoint_reports_counts() {
        let app = create_router(test_state());
        let response = app
            .oneshot(request(Method::POST, "/api/v1/sla/scan", Some("admin"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        // Freshly seeded entities are within their windows.
        assert_eq!(body["raised"], 0);
    }
}
