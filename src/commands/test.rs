//! Test command implementation.
//!
//! Runs collection passes against the configured gateway using an isolated
//! registry and prints the results.

use anyhow::{Context, Result};
use saia_pcd_exporter::{Collector, GrpcRegisterClient, MetricCatalog, MetricRegistry};
use std::sync::Arc;

use crate::config::Config;

/// Tests metrics collection.
pub async fn command_test(iterations: usize, verbose: bool, config: &Config) -> Result<()> {
    println!("🧪 Saia PCD Exporter - Test Mode");
    println!("================================");

    let catalog = MetricCatalog::from_path(config.csv_file())
        .context("Failed to load metric catalog")?;
    println!("   📄 {} metrics in catalog", catalog.len());

    let client = GrpcRegisterClient::connect_lazy(config.server_addr(), config.connect_timeout())?;
    let registry = Arc::new(MetricRegistry::new(false)?);
    let collector = Collector::new(catalog, Arc::new(client), registry)
        .with_cycle_timeout(config.cycle_timeout());

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let (summary, outcomes) = collector.run_cycle_with_outcomes().await;

        if verbose {
            for outcome in &outcomes {
                let definition = outcome.definition;
                match &outcome.result {
                    Ok(value) => println!(
                        "   ├─ {} ({} @ {}) = {}",
                        definition.name, definition.register_kind, definition.address, value
                    ),
                    Err(e) => println!(
                        "   ├─ ❌ {} ({} @ {}) [{}] {}",
                        definition.name,
                        definition.register_kind,
                        definition.address,
                        e.kind(),
                        e
                    ),
                }
            }
        }

        println!(
            "   ⏱️  Pass duration: {:.2}ms",
            summary.duration_seconds * 1000.0
        );
        println!("   📊 Successful reads: {}", summary.succeeded);
        println!("   ❌ Failed reads: {}", summary.failed);
    }

    println!("\n✅ Test completed");
    Ok(())
}
