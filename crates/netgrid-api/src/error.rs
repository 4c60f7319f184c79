//! NetGrid — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use netgrid_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable or the catalog file is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
///
/// Policy rejections (locked, cooldown, short funds) never pass through
/// here — they are `200 OK` outcomes. This type covers caller errors,
/// transient failures, and infrastructure trouble only.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no (or a malformed) player identity.
    Unauthenticated(String),
    /// A domain-level failure.
    Domain(DomainError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, "unauthenticated", message),
            Self::Domain(err) => {
                let (status, code) = match &err {
                    DomainError::PlayerNotFound(_) => {
                        (StatusCode::PRECONDITION_FAILED, "failed_precondition")
                    }
                    DomainError::CommandNotFound(_) | DomainError::Validation(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_argument")
                    }
                    DomainError::PlayerBanned { .. } => (StatusCode::FORBIDDEN, "permission_denied"),
                    // Raw conflicts stay inside the retry loop; if one ever
                    // escapes, it is as transient as exhausted retries.
                    DomainError::Conflict { .. } | DomainError::Contention { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
                    }
                    DomainError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, code, err.to_string())
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
