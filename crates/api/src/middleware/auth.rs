//! # Admin Gate Middleware
//!
//! All schedule-mutating routes are admin-only. Authentication proper
//! lives outside this service; the gate checks a single bearer token
//! from configuration. When no token is configured the gate stays
//! open and access control is expected at the deployment edge.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use presensi_core::errors::JadwalError;

use crate::{middleware::error_handling::AppError, ApiState};

/// Checks a raw Authorization header value against the configured
/// token. No configured token means the gate is open.
pub fn check_admin_token(
    expected: Option<&str>,
    authorization: Option<&str>,
) -> Result<(), JadwalError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match authorization.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(JadwalError::Authorization(
            "Invalid admin token".to_string(),
        )),
        None => Err(JadwalError::Authentication(
            "Missing bearer token".to_string(),
        )),
    }
}

pub async fn require_admin(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    check_admin_token(state.admin_token.as_deref(), authorization).map_err(AppError)?;
    Ok(next.run(request).await)
}
