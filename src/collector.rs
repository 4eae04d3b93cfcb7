//! One collection pass over the metric catalog.
//!
//! A pass shares a single deadline across all metrics. Each metric is read
//! once, in catalog order; failures are logged and counted but never stop the
//! pass, and never touch the value previously published for that metric.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::{Duration, Instant as StdInstant};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::{MetricCatalog, MetricDefinition};
use crate::client::RegisterClient;
use crate::registry::{MetricRegistry, RegistryError};
use crate::resolver::{resolve, ReadError};

/// Default upper bound for one whole pass.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one collection pass.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

impl CycleSummary {
    /// Share of reads that produced a published value.
    pub fn success_ratio(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }
}

/// Why a metric has no fresh value after a pass.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("publish failed: {0}")]
    Publish(RegistryError),
}

impl MetricError {
    /// Label value used for the read error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            MetricError::Read(e) => e.kind(),
            MetricError::Publish(_) => "publish",
        }
    }
}

/// Result of one catalog entry in one pass.
#[derive(Debug)]
pub struct MetricOutcome<'a> {
    pub definition: &'a MetricDefinition,
    pub result: Result<f64, MetricError>,
}

/// Runs collection passes against one register service.
pub struct Collector {
    catalog: MetricCatalog,
    client: Arc<dyn RegisterClient>,
    registry: Arc<MetricRegistry>,
    cycle_timeout: Duration,
    cycles_total: AtomicU64,
    last_summary: StdRwLock<Option<CycleSummary>>,
}

impl Collector {
    pub fn new(
        catalog: MetricCatalog,
        client: Arc<dyn RegisterClient>,
        registry: Arc<MetricRegistry>,
    ) -> Self {
        registry.set_catalog_size(catalog.len());
        Self {
            catalog,
            client,
            registry,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            cycles_total: AtomicU64::new(0),
            last_summary: StdRwLock::new(None),
        }
    }

    /// Overrides the per-pass timeout.
    pub fn with_cycle_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    pub fn cycle_timeout(&self) -> Duration {
        self.cycle_timeout
    }

    pub fn cycles_total(&self) -> u64 {
        self.cycles_total.load(Ordering::Relaxed)
    }

    pub fn last_summary(&self) -> Option<CycleSummary> {
        self.last_summary.read().ok().and_then(|s| s.clone())
    }

    /// Runs exactly one pass over the catalog.
    pub async fn run_cycle(&self) -> CycleSummary {
        self.run_cycle_with_outcomes().await.0
    }

    /// Runs one pass and also returns what happened to every entry, in
    /// catalog order.
    pub async fn run_cycle_with_outcomes(&self) -> (CycleSummary, Vec<MetricOutcome<'_>>) {
        let start = StdInstant::now();
        let deadline = Instant::now() + self.cycle_timeout;

        let mut outcomes = Vec::with_capacity(self.catalog.len());
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for definition in &self.catalog {
            let result = self.collect_one(definition, deadline).await;
            match &result {
                Ok(value) => {
                    debug!("{} = {}", definition.name, value);
                    succeeded += 1;
                }
                Err(e) => {
                    warn!(
                        metric = %definition.name,
                        kind = %definition.register_kind,
                        address = definition.address,
                        error = %e,
                        "Failed to collect metric"
                    );
                    self.registry.record_read_error(e.kind());
                    failed += 1;
                }
            }
            outcomes.push(MetricOutcome { definition, result });
        }

        let duration = start.elapsed();
        self.registry
            .observe_collection_duration(duration.as_secs_f64());

        let summary = CycleSummary {
            attempted: self.catalog.len(),
            succeeded,
            failed,
            duration_seconds: duration.as_secs_f64(),
            completed_at: Utc::now(),
        };
        self.registry.set_success_ratio(summary.success_ratio());
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_summary.write() {
            *last = Some(summary.clone());
        }

        info!(
            "Collection pass completed: {} ok, {} failed, {:.2}ms",
            succeeded,
            failed,
            duration.as_secs_f64() * 1000.0
        );

        (summary, outcomes)
    }

    async fn collect_one(
        &self,
        definition: &MetricDefinition,
        deadline: Instant,
    ) -> Result<f64, MetricError> {
        let value = resolve(self.client.as_ref(), definition, deadline).await?;
        self.registry
            .publish(definition, value)
            .map_err(MetricError::Publish)?;
        Ok(value)
    }
}
