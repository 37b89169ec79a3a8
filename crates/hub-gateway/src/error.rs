//! `AppError`: the single place a domain error becomes an HTTP response.
//!
//! Mirrors the teacher's `http-rpc-gateway::AppError` shape (an enum
//! implementing `IntoResponse`, matched once at the edge) but renders the
//! `{"message": ...}` envelope spec.md's error-handling table specifies,
//! rather than the teacher's own `{"error":{code,message}}` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use hub_fee::FeeError;
use hub_repo::RepoError;
use serde_json::json;

pub enum AppError {
    BadRequest(String),
    NotFound(String),
    EstimateUnavailable(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::EstimateUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled gateway error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::OrderNotFound(id) => AppError::NotFound(format!("order {id} not found")),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<FeeError> for AppError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::SameNetwork | FeeError::AmountTooSmall => AppError::BadRequest(err.to_string()),
            FeeError::EstimateUnavailable => AppError::EstimateUnavailable(err.to_string()),
            FeeError::NetworkFee(_) => AppError::Internal(err.into()),
        }
    }
}

/// 404 fallback for unmatched routes (spec.md §7 "unknown route").
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
