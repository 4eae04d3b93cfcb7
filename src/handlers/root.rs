//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that displays
//! a landing page with all available endpoints and the last pass summary.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    // Calculate actual uptime from service start time
    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    let uptime_str = format!("{}h {}m {}s", hours, minutes, seconds);

    let catalog_size = state.collector.catalog().len();
    let cycles = state.collector.cycles_total();
    let scheduler_state = format!("{:?}", state.scheduler.state());
    let last_pass = match state.collector.last_summary() {
        Some(s) => format!(
            "{} ok / {} failed in {:.0} ms at {}",
            s.succeeded,
            s.failed,
            s.duration_seconds * 1000.0,
            s.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "none yet".to_string(),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Saia PCD Exporter</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            padding: 20px;
            background: #f5f5f5;
            line-height: 1.6;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        h1 {{
            color: #333;
            border-bottom: 3px solid #2e7d32;
            padding-bottom: 15px;
        }}
        .info {{
            background: #e9ecef;
            padding: 15px;
            border-radius: 4px;
            margin: 20px 0;
            display: flex;
            justify-content: space-around;
            flex-wrap: wrap;
        }}
        .info-item {{ margin: 10px; }}
        .info-label {{ font-weight: 600; color: #555; display: block; font-size: 0.9em; }}
        .info-value {{ font-size: 1.2em; color: #2e7d32; }}
        .endpoint-list {{ list-style: none; padding: 0; }}
        .endpoint-list li {{
            margin: 20px 0;
            padding: 15px;
            background: #f8f9fa;
            border-left: 4px solid #2e7d32;
            border-radius: 4px;
        }}
        .endpoint-list a {{ color: #2e7d32; text-decoration: none; font-weight: 600; }}
        .endpoint-desc {{ color: #666; margin-top: 5px; }}
    </style>
</head>
<body>
<div class="container">
    <h1>Saia PCD Exporter</h1>

    <div class="info">
        <div class="info-item">
            <span class="info-label">Version</span>
            <span class="info-value">{version}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Uptime</span>
            <span class="info-value">{uptime}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Configured metrics</span>
            <span class="info-value">{catalog_size}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Scheduler</span>
            <span class="info-value">{scheduler_state}</span>
        </div>
        <div class="info-item">
            <span class="info-label">Collection passes</span>
            <span class="info-value">{cycles}</span>
        </div>
    </div>

    <p><strong>Last pass:</strong> {last_pass}</p>

    <h2>Available Endpoints</h2>
    <ul class="endpoint-list">
{endpoints}    </ul>
</div>
</body>
</html>"#,
        version = version,
        uptime = uptime_str,
        catalog_size = catalog_size,
        cycles = cycles,
        scheduler_state = scheduler_state,
        last_pass = last_pass,
        endpoints = endpoint_list(state.config.enable_health.unwrap_or(true)),
    );

    Html(html)
}

/// Renders one `<li>` per mounted route.
fn endpoint_list(health_enabled: bool) -> String {
    let mut endpoints = vec![("/metrics", "Prometheus-compatible metrics endpoint")];
    if health_enabled {
        endpoints.push(("/health", "Liveness probe"));
    }
    endpoints.push(("/info", "Configured registers as JSON"));
    endpoints.push(("/config", "Active runtime configuration (read-only)"));

    endpoints
        .into_iter()
        .map(|(path, desc)| {
            format!(
                "        <li>\n            <a href=\"{path}\">{path}</a>\n            <div class=\"endpoint-desc\">{desc}</div>\n        </li>\n"
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_link_follows_route() {
        let with_health = endpoint_list(true);
        assert!(with_health.contains("href=\"/health\""));
        assert!(with_health.contains("href=\"/metrics\""));

        let without_health = endpoint_list(false);
        assert!(!without_health.contains("/health"));
        assert!(without_health.contains("href=\"/info\""));
        assert!(without_health.contains("href=\"/config\""));
    }
}
