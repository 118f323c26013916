//! HTTP error handling and response types.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error details sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Callable error code (`not-found`, `permission-denied`, ...)
    pub code: String,
    /// Spanish, user-facing message
    pub message: String,
}

/// Error response body: `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error
    pub error: ApiError,
}

/// Error type returned by every handler.
#[derive(Debug)]
pub struct AppError(pub Error);

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// HTTP status for a callable error code.
#[must_use]
pub fn status_for(code: &str) -> StatusCode {
    match code {
        "unauthenticated" => StatusCode::UNAUTHORIZED,
        "permission-denied" => StatusCode::FORBIDDEN,
        "not-found" => StatusCode::NOT_FOUND,
        "invalid-argument" | "failed-precondition" => StatusCode::BAD_REQUEST,
        "already-exists" => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = status_for(code);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = ErrorBody {
            error: ApiError {
                code: code.to_string(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use sea_orm::DbErr;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_domain_error_response() {
        let response = AppError(Error::not_found("Estudiante no encontrado")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body.error.code, "not-found");
        assert_eq!(body.error.message, "Estudiante no encontrado");
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let response = AppError::from(DbErr::Custom("no such table".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.error.code, "internal");
        assert_eq!(body.error.message, "Error interno del servidor");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for("unauthenticated"), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for("permission-denied"), StatusCode::FORBIDDEN);
        assert_eq!(status_for("already-exists"), StatusCode::CONFLICT);
        assert_eq!(status_for("failed-precondition"), StatusCode::BAD_REQUEST);
        assert_eq!(status_for("internal"), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
