//! Saia PCD Exporter Library
//!
//! Polls a Saia PCD controller through its gRPC gateway and republishes the
//! configured registers, flags, inputs and outputs as Prometheus gauges.
//!
//! # Components
//!
//! - **Metric Catalog**: ordered register list loaded once from CSV
//! - **Register Resolver**: maps a register kind to a remote read and a float
//! - **Collector**: one failure-isolated pass over the whole catalog
//! - **Scheduler**: runs passes on a fixed interval in the background
//! - **Metric Registry**: gauge store rendered by the `/metrics` endpoint
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use saia_pcd_exporter::{Collector, GrpcRegisterClient, MetricCatalog, MetricRegistry, Scheduler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = MetricCatalog::from_path("misc/prometheus_metrics.csv")?;
//! let client = GrpcRegisterClient::connect_lazy("http://192.168.85.41:50051", Duration::from_secs(5))?;
//! let registry = Arc::new(MetricRegistry::new(true)?);
//!
//! let collector = Arc::new(Collector::new(catalog, Arc::new(client), registry.clone()));
//! let scheduler = Scheduler::new(collector);
//! scheduler.start(Duration::from_secs(30)).await?;
//!
//! println!("{}", registry.encode()?);
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod collector;
pub mod registry;
pub mod resolver;
pub mod scheduler;

// Re-export main types for convenience
pub use catalog::{CatalogError, MetricCatalog, MetricDefinition, RegisterKind};
pub use client::{
    ClientError, GrpcRegisterClient, RegisterClient, RegisterValue, RegisterVariant,
};
pub use collector::{Collector, CycleSummary, MetricError, MetricOutcome, DEFAULT_CYCLE_TIMEOUT};
pub use registry::{MetricRegistry, RegistryError};
pub use resolver::{resolve, ReadError};
pub use scheduler::{Scheduler, SchedulerError, SchedulerState};
