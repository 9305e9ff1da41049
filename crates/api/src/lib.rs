//! # Presensi API
//!
//! The API crate provides the web server for the presensi attendance
//! platform's schedule engine. It exposes the jadwal timetable, the
//! period catalog, conflict dry-runs, and the spreadsheet import
//! endpoint.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide cross-cutting concerns like the admin gate
//!   and error handling
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database
//! interactions; every mutating request runs a single transaction in
//! `presensi-db`.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for the admin gate and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Bearer token for the admin gate; None leaves the gate open
    pub admin_token: Option<String>,
    /// Upper bound on import/bulk batch sizes
    pub max_import_rows: usize,
}

/// Builds the application router. Separated from `start_server` so
/// tests can drive the router directly.
pub fn app(state: Arc<ApiState>) -> Router {
    let gated = Router::new()
        .merge(routes::jadwal::routes())
        .merge(routes::jam_pelajaran::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Schedule and period-catalog endpoints, admin-gated
        .merge(gated)
        // Attach shared state to all routes
        .with_state(state)
}

/// Starts the API server with the provided configuration and database
/// connection pool.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if config.admin_token.is_none() {
        warn!("ADMIN_API_TOKEN is not set; schedule routes are not gated");
    }

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        admin_token: config.admin_token.clone(),
        max_import_rows: config.max_import_rows,
    });

    let app = app(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware; on expiry the transaction rolls
    // back with the connection.
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
