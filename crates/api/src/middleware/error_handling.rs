//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and JSON error responses so
//! every endpoint fails the same way. Conflict errors keep their full
//! structured report in the body: the caller always sees every overlap
//! found, never just the first.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use presensi_core::errors::JadwalError;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain `JadwalError` values and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
#[derive(Debug)]
pub struct AppError(pub JadwalError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Conflicts carry their report; everything else is a plain
        // message body.
        if let JadwalError::Conflict(report) = &self.0 {
            let body = Json(json!({
                "error": self.0.to_string(),
                "conflicts": report.conflicts,
            }));
            return (StatusCode::CONFLICT, body).into_response();
        }

        let status = match &self.0 {
            JadwalError::NotFound(_) => StatusCode::NOT_FOUND,
            JadwalError::Validation(_) => StatusCode::BAD_REQUEST,
            JadwalError::Conflict(_) => StatusCode::CONFLICT,
            JadwalError::Authentication(_) => StatusCode::UNAUTHORIZED,
            JadwalError::Authorization(_) => StatusCode::FORBIDDEN,
            JadwalError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            JadwalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Allows `?` on functions returning `Result<T, JadwalError>` inside
/// handlers that return `Result<T, AppError>`.
impl From<JadwalError> for AppError {
    fn from(err: JadwalError) -> Self {
        AppError(err)
    }
}

/// Wraps repository-level eyre errors as database failures.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(JadwalError::Database(err))
    }
}

/// Maps a JadwalError to an HTTP response directly.
pub fn map_error(err: JadwalError) -> Response {
    AppError(err).into_response()
}
