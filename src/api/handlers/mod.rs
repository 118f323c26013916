//! HTTP handlers for the REST API.
//!
//! Each handler resolves the caller through an extractor, then delegates to
//! the core layer. Handlers hold no business rules of their own beyond
//! checking that the caller may touch the requested record.

use super::error::AppError;
use crate::errors::{Error, Result};
use axum::{Json, http::StatusCode};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub mod academics;
pub mod admin;
pub mod auth;
pub mod finance;
pub mod functions;
pub mod parent;
pub mod public;
pub mod teacher;

/// Result type for handlers.
pub type HandlerResult<T> = std::result::Result<Json<T>, AppError>;

/// Result of a handler that creates a record (`201 Created`).
pub type CreatedResult<T> = std::result::Result<(StatusCode, Json<T>), AppError>;

/// Result of a handler with an empty response body.
pub type EmptyResult = std::result::Result<StatusCode, AppError>;

/// Today in UTC.
fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Turns a missing record into `not-found`.
fn found<T>(record: Option<T>, message: &str) -> Result<T> {
    record.ok_or_else(|| Error::not_found(message))
}

/// Query string carrying an uploaded file's name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Original file name
    pub file_name: String,
}

/// Response of an upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Storage path saved on the record
    pub path: String,
}

/// Rejects uploads that are empty or larger than `max_bytes`.
fn check_upload(bytes: &[u8], max_bytes: usize) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::invalid("El archivo está vacío"));
    }
    if bytes.len() > max_bytes {
        return Err(Error::invalid(format!(
            "El archivo supera el tamaño máximo de {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Response of the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving
    pub status: &'static str,
    /// API version
    pub version: &'static str,
    /// "connected" or an error description
    pub database: String,
}

/// GET /health
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<super::AppState>,
) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    };
    Json(HealthResponse {
        status: "ok",
        version: "v1",
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload() {
        assert!(check_upload(b"", 10).is_err());
        assert!(check_upload(b"hola", 10).is_ok());
        assert!(matches!(
            check_upload(&[0u8; 11], 10),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
