//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the current exporter configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{Config, DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        render_config_table(&state.config),
    )
}

fn render_config_table(cfg: &Config) -> String {
    let mut out = String::new();

    writeln!(out, "SAIA PCD EXPORTER - CONFIGURATION").ok();
    writeln!(out, "=================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                       {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                       {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(
        out,
        "enable_tls:                 {}",
        cfg.enable_tls.unwrap_or(false)
    )
    .ok();
    writeln!(
        out,
        "tls_cert_path:              {}",
        cfg.tls_cert_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(
        out,
        "tls_key_path:               {}",
        cfg.tls_key_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "COLLECTION").ok();
    writeln!(out, "----------").ok();
    writeln!(out, "server_addr:                {}", cfg.server_addr()).ok();
    writeln!(
        out,
        "csv_file:                   {}",
        cfg.csv_file().display()
    )
    .ok();
    writeln!(
        out,
        "interval:                   {} seconds",
        cfg.interval().as_secs()
    )
    .ok();
    writeln!(
        out,
        "cycle_timeout:              {} seconds",
        cfg.cycle_timeout().as_secs()
    )
    .ok();
    writeln!(
        out,
        "connect_timeout:            {} seconds",
        cfg.connect_timeout().as_secs()
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "FEATURES").ok();
    writeln!(out, "--------").ok();
    writeln!(
        out,
        "enable_health:              {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "enable_telemetry:           {}",
        cfg.enable_telemetry.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "log_level:                  {}",
        cfg.log_level().as_str()
    )
    .ok();

    out
}
