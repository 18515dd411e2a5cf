//! Error types for the service layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use limsflow_types::WorkflowError;
use serde::Serialize;
use thiserror::Error;

/// Server lifecycle errors (startup, bind, shutdown).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A [`WorkflowError`] on its way out as an HTTP response.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub WorkflowError);

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            WorkflowError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            WorkflowError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            WorkflowError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            WorkflowError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            WorkflowError::TerminalLocked { .. } => (StatusCode::CONFLICT, "TERMINAL_STATE"),
            WorkflowError::IllegalTransition { .. } => (StatusCode::CONFLICT, "ILLEGAL_TRANSITION"),
            WorkflowError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            WorkflowError::UnknownKind(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_KIND"),
            WorkflowError::UnknownState { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_STATE"),
            WorkflowError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: code.to_string(),
            field: self.0.field().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
