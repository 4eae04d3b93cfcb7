//! Health check endpoint handler.
//!
//! `/health` is a pure liveness probe: it answers `200 OK` as long as the
//! HTTP server runs, independent of whether register reads succeed.

use axum::{http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

/// Handler for the /health endpoint.
#[instrument]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Processing /health request");
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        "OK",
    )
}
