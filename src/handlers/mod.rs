//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Liveness endpoint
//! - `/info`: Static metric catalog as JSON
//! - `/config`: Configuration display endpoint

pub mod config;
pub mod health;
pub mod info;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use config::config_handler;
pub use health::health_handler;
pub use info::info_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;

use axum::{routing::get, Router};

use crate::state::SharedState;

/// Builds the HTTP router for the exporter.
pub fn router(state: SharedState) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/info", get(info_handler))
        .route("/config", get(config_handler));

    if state.config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    app.with_state(state)
}
