//! Catalog introspection endpoint handler.
//!
//! `/info` lists the configured metrics as JSON. It reflects the static
//! catalog only, never live values.

use axum::{extract::State, Json};
use saia_pcd_exporter::{MetricCatalog, MetricDefinition};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub metrics_count: usize,
    pub metrics: Vec<MetricInfo>,
}

#[derive(Debug, Serialize)]
pub struct MetricInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub register_kind: String,
    /// Rendered as a string to match the format scrapers already parse.
    pub address: String,
    pub description: String,
}

impl From<&MetricDefinition> for MetricInfo {
    fn from(d: &MetricDefinition) -> Self {
        Self {
            name: d.name.clone(),
            register_kind: d.register_kind.to_string(),
            address: d.address.to_string(),
            description: d.description.clone(),
        }
    }
}

impl From<&MetricCatalog> for InfoResponse {
    fn from(catalog: &MetricCatalog) -> Self {
        Self {
            metrics_count: catalog.len(),
            metrics: catalog.iter().map(MetricInfo::from).collect(),
        }
    }
}

/// Handler for the /info endpoint.
#[instrument(skip(state))]
pub async fn info_handler(State(state): State<SharedState>) -> Json<InfoResponse> {
    debug!("Processing /info request");
    Json(InfoResponse::from(state.collector.catalog()))
}
