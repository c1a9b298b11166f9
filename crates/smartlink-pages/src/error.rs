//! Error types for the SmartLink page service.
//!
//! Admin endpoints answer with JSON error bodies. The public router never
//! surfaces these to visitors; it falls back to the app shell instead.

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A record is missing required fields (or carries an unusable short id).
///
/// Field names are reported in the camelCase used by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing or invalid fields: {}", .fields.join(", "))]
pub struct ValidationError {
    /// Offending fields, in declaration order.
    pub fields: Vec<&'static str>,
}

/// Filesystem failure inside the page store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O error.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation did not finish within the configured timeout.
    #[error("operation on {} timed out after {secs}s", path.display())]
    Timeout { path: PathBuf, secs: u64 },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Service error type.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Required SmartLink fields missing or empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Page store I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No cached page for this short id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The SmartLink database could not be read.
    #[error("source error: {0}")]
    Source(#[from] rusqlite::Error),

    /// Missing or invalid bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// Anything else (join errors, serialization).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<&'static str>>,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, error, message, fields) = match &self {
            Self::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                err.to_string(),
                Some(err.fields.clone()),
            ),
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("no static page for {id}"),
                None,
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "a valid bearer token is required".to_string(),
                None,
            ),
            Self::Storage(err) => {
                tracing::error!(error = %err, "page store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "The static page could not be written.".to_string(),
                    None,
                )
            }
            Self::Source(err) => {
                tracing::error!(error = %err, "smartlink source error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "source_error",
                    "SmartLink records could not be loaded.".to_string(),
                    None,
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred.".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error,
            message,
            fields,
        };

        (status, Json(body)).into_response()
    }
}
