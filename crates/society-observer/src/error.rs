//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use society_core::{HubError, RepositoryError};
use society_types::RecordError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or a parameter was rejected.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The operation needs a component this server was started without.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The repository failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ObserverError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("agent".to_owned()),
            RepositoryError::Storage(msg) => Self::Storage(msg),
            RepositoryError::Record(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<RecordError> for ObserverError {
    fn from(e: RecordError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<HubError> for ObserverError {
    fn from(e: HubError) -> Self {
        match e {
            HubError::EmptyMessage => Self::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Storage(msg) | Self::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
