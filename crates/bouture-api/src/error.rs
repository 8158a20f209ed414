//! HTTP boundary for the domain error taxonomy. Validation failures carry
//! their per-field messages; everything else maps to a bare status with a
//! short reason. Internal detail is logged, never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use bouture_domain::Error;

#[derive(Debug)]
pub enum ApiError {
    Domain(Error),
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    Internal(anyhow::Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Domain(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(Error::Validation(fields)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": fields }))).into_response()
            }
            ApiError::Domain(Error::AccessDenied) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "access denied" })),
            )
                .into_response(),
            ApiError::Domain(Error::NotFound(kind, id)) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{kind} {id} not found") })),
            )
                .into_response(),
            ApiError::Domain(Error::ReferentialConflict(id)) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": format!("ad {id} still has messages attached") })),
            )
                .into_response(),
            ApiError::Domain(Error::Persistence(e)) => {
                error!("persistence failure: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response()
            }
            ApiError::Conflict(reason) => {
                (StatusCode::CONFLICT, Json(json!({ "error": reason }))).into_response()
            }
            ApiError::Internal(e) => {
                error!("internal error: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// A not-found helper for handlers that looked up an entity by id and got
/// nothing back from storage.
pub fn not_found(kind: bouture_domain::EntityKind, id: uuid::Uuid) -> ApiError {
    ApiError::Domain(Error::NotFound(kind, id))
}

/// Wraps a `spawn_blocking` join failure.
pub fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}"))
}
