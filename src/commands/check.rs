//! Check command implementation.
//!
//! Validates the configuration and loads the metric catalog without
//! contacting the gateway.

use anyhow::Result;
use saia_pcd_exporter::{MetricCatalog, RegisterKind};
use std::collections::{BTreeMap, HashSet};

use crate::config::{validate_effective_config, Config};

/// Validates configuration and the metric catalog.
pub fn command_check(config: &Config) -> Result<()> {
    println!("🔍 Saia PCD Exporter - Configuration Check");
    println!("==========================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {:#}", e);
            all_ok = false;
        }
    }

    let csv_file = config.csv_file();
    println!("\n📄 Loading metric catalog from {}...", csv_file.display());
    match MetricCatalog::from_path(&csv_file) {
        Ok(catalog) => {
            println!("   ✅ {} metrics loaded", catalog.len());

            let mut per_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
            for definition in &catalog {
                *per_kind.entry(definition.register_kind.as_str()).or_default() += 1;
            }
            for kind in [
                RegisterKind::Register,
                RegisterKind::RegisterFloat,
                RegisterKind::Flag,
                RegisterKind::Input,
                RegisterKind::Output,
            ] {
                let count = per_kind.get(kind.as_str()).copied().unwrap_or(0);
                println!("      ├─ {:8} {}", kind.as_str(), count);
            }

            let mut seen = HashSet::new();
            for definition in &catalog {
                if !seen.insert(definition.name.as_str()) {
                    println!(
                        "   ⚠️  Duplicate metric name '{}' (address {})",
                        definition.name, definition.address
                    );
                }
            }
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
