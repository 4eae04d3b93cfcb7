//! Gauge store read by the `/metrics` endpoint.
//!
//! Register readings are published as gauges named after the catalog entry.
//! A name may carry an inline label set (`temperature{sensor="1"}`), which
//! becomes the gauge's constant labels. Gauges are created on first
//! successful read, so a metric that never succeeded is absent from the
//! exposition output. The registry is passed around explicitly; nothing here
//! is process-global.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::debug;

use crate::catalog::MetricDefinition;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Bucket bounds in seconds for the collection duration histogram.
const DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 7.5, 10.0, 15.0, 30.0];

pub const COLLECTION_DURATION_METRIC: &str = "saia_pcd_exporter_collection_duration_seconds";
pub const READ_ERRORS_METRIC: &str = "saia_pcd_exporter_read_errors_total";
pub const CATALOG_METRICS_METRIC: &str = "saia_pcd_exporter_catalog_metrics";
pub const SUCCESS_RATIO_METRIC: &str = "saia_pcd_exporter_last_cycle_success_ratio";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Prometheus(#[from] prometheus::Error),

    #[error("malformed label set in metric name {0:?}")]
    InvalidLabels(String),

    #[error("metrics output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Published register values plus the exporter's own telemetry.
pub struct MetricRegistry {
    registry: Registry,
    /// Keyed by the full catalog name, labels included.
    gauges: DashMap<String, Gauge>,
    /// Help text per metric family; every series of a family must share it.
    family_help: DashMap<String, String>,
    collection_duration: Histogram,
    read_errors: IntCounterVec,
    catalog_metrics: IntGauge,
    last_cycle_success_ratio: Gauge,
}

impl MetricRegistry {
    /// Creates an empty registry. The collection histogram is always exported,
    /// the remaining exporter metrics only when `telemetry` is set.
    pub fn new(telemetry: bool) -> Result<Self, RegistryError> {
        let registry = Registry::new();

        let collection_duration = Histogram::with_opts(
            HistogramOpts::new(
                COLLECTION_DURATION_METRIC,
                "Wall-clock duration of one pass over all configured registers",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        let read_errors = IntCounterVec::new(
            Opts::new(
                READ_ERRORS_METRIC,
                "Failed register reads by failure kind",
            ),
            &["kind"],
        )?;
        let catalog_metrics = IntGauge::new(
            CATALOG_METRICS_METRIC,
            "Number of register metrics configured in the catalog",
        )?;
        let last_cycle_success_ratio = Gauge::new(
            SUCCESS_RATIO_METRIC,
            "Share of register reads that succeeded in the last collection pass (0.0-1.0)",
        )?;

        registry.register(Box::new(collection_duration.clone()))?;
        if telemetry {
            registry.register(Box::new(read_errors.clone()))?;
            registry.register(Box::new(catalog_metrics.clone()))?;
            registry.register(Box::new(last_cycle_success_ratio.clone()))?;
        }

        debug!("Metric registry initialized (telemetry: {})", telemetry);

        Ok(Self {
            registry,
            gauges: DashMap::new(),
            family_help: DashMap::new(),
            collection_duration,
            read_errors,
            catalog_metrics,
            last_cycle_success_ratio,
        })
    }

    /// Sets the gauge for `definition`, creating and registering it on first use.
    pub fn publish(&self, definition: &MetricDefinition, value: f64) -> Result<(), RegistryError> {
        if let Some(gauge) = self.gauges.get(&definition.name) {
            gauge.set(value);
            return Ok(());
        }

        match self.gauges.entry(definition.name.clone()) {
            Entry::Occupied(entry) => entry.get().set(value),
            Entry::Vacant(entry) => {
                let (family, labels) = split_metric_name(&definition.name)?;
                let help = self
                    .family_help
                    .entry(family.to_string())
                    .or_insert_with(|| help_text(definition))
                    .clone();
                let gauge = Gauge::with_opts(Opts::new(family, help).const_labels(labels))?;
                self.registry.register(Box::new(gauge.clone()))?;
                gauge.set(value);
                entry.insert(gauge);
                debug!("Registered gauge {}", definition.name);
            }
        }
        Ok(())
    }

    /// Current value of a published gauge, `None` if it never succeeded.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(|g| g.get())
    }

    /// Number of gauges published so far.
    pub fn published_count(&self) -> usize {
        self.gauges.len()
    }

    pub fn observe_collection_duration(&self, seconds: f64) {
        self.collection_duration.observe(seconds);
    }

    /// Number of collection passes observed by the duration histogram.
    pub fn collection_count(&self) -> u64 {
        self.collection_duration.get_sample_count()
    }

    pub fn record_read_error(&self, kind: &str) {
        self.read_errors.with_label_values(&[kind]).inc();
    }

    pub fn read_errors(&self, kind: &str) -> u64 {
        self.read_errors.with_label_values(&[kind]).get()
    }

    pub fn set_catalog_size(&self, size: usize) {
        self.catalog_metrics.set(size as i64);
    }

    pub fn set_success_ratio(&self, ratio: f64) {
        self.last_cycle_success_ratio.set(ratio);
    }

    /// Renders everything in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, RegistryError> {
        let families = self.registry.gather();
        let mut buffer = Vec::with_capacity(BUFFER_CAP);
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Splits `name{key="value",...}` into the family name and its labels.
///
/// Label values may contain `\"`, `\\` and `\n` escapes. A name without
/// braces is returned unchanged with no labels.
fn split_metric_name(name: &str) -> Result<(&str, HashMap<String, String>), RegistryError> {
    let invalid = || RegistryError::InvalidLabels(name.to_string());

    let Some(open) = name.find('{') else {
        return Ok((name, HashMap::new()));
    };
    let family = &name[..open];
    let mut rest = name[open + 1..]
        .strip_suffix('}')
        .ok_or_else(invalid)?
        .trim_start();

    let mut labels = HashMap::new();
    while !rest.is_empty() {
        let (key, after) = rest.split_once('=').ok_or_else(invalid)?;
        let quoted = after.trim_start().strip_prefix('"').ok_or_else(invalid)?;

        let mut value = String::new();
        let mut end = None;
        let mut chars = quoted.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, escaped)) => value.push(escaped),
                    None => return Err(invalid()),
                },
                '"' => {
                    end = Some(i);
                    break;
                }
                other => value.push(other),
            }
        }
        let end = end.ok_or_else(invalid)?;

        if labels.insert(key.trim().to_string(), value).is_some() {
            return Err(invalid());
        }

        rest = quoted[end + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
        } else if !rest.is_empty() {
            return Err(invalid());
        }
    }

    Ok((family, labels))
}

fn help_text(definition: &MetricDefinition) -> String {
    if definition.description.trim().is_empty() {
        format!(
            "Saia PCD {} at address {}",
            definition.register_kind, definition.address
        )
    } else {
        definition.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RegisterKind;

    fn def(name: &str) -> MetricDefinition {
        MetricDefinition::new(name, RegisterKind::Register, 1, "")
    }

    #[test]
    fn test_publish_creates_then_overwrites() {
        let registry = MetricRegistry::new(true).unwrap();
        assert_eq!(registry.value("temp"), None);

        registry.publish(&def("temp"), 42.0).unwrap();
        assert_eq!(registry.value("temp"), Some(42.0));

        registry.publish(&def("temp"), 17.5).unwrap();
        assert_eq!(registry.value("temp"), Some(17.5));
        assert_eq!(registry.published_count(), 1);
    }

    #[test]
    fn test_invalid_metric_name_is_rejected() {
        let registry = MetricRegistry::new(true).unwrap();
        assert!(registry.publish(&def("bad name"), 1.0).is_err());
        assert_eq!(registry.value("bad name"), None);
    }

    #[test]
    fn test_name_clash_with_telemetry_is_rejected() {
        let registry = MetricRegistry::new(true).unwrap();
        assert!(registry.publish(&def(CATALOG_METRICS_METRIC), 1.0).is_err());
    }

    #[test]
    fn test_encode_contains_published_gauge() {
        let registry = MetricRegistry::new(true).unwrap();
        registry
            .publish(
                &MetricDefinition::new("flag1", RegisterKind::Flag, 3, "Pump running"),
                1.0,
            )
            .unwrap();
        registry.observe_collection_duration(0.2);

        let text = registry.encode().unwrap();
        assert!(text.contains("# HELP flag1 Pump running"));
        assert!(text.contains("flag1 1"));
        assert!(text.contains("saia_pcd_exporter_collection_duration_seconds_count 1"));
    }

    #[test]
    fn test_telemetry_disabled_hides_exporter_gauges() {
        let registry = MetricRegistry::new(false).unwrap();
        registry.set_catalog_size(3);
        registry.observe_collection_duration(0.1);

        let text = registry.encode().unwrap();
        assert!(!text.contains(CATALOG_METRICS_METRIC));
        assert!(text.contains(COLLECTION_DURATION_METRIC));
    }

    #[test]
    fn test_labelled_name_becomes_const_labels() {
        let registry = MetricRegistry::new(true).unwrap();
        let sensor1 = MetricDefinition::new(
            "temperature{sensor=\"1\"}",
            RegisterKind::Register,
            10,
            "Sensor 1",
        );
        let sensor2 = MetricDefinition::new(
            "temperature{sensor=\"2\"}",
            RegisterKind::Register,
            11,
            "Sensor 2",
        );

        registry.publish(&sensor1, 42.0).unwrap();
        registry.publish(&sensor2, 17.0).unwrap();
        registry.publish(&sensor1, 43.0).unwrap();

        assert_eq!(registry.value("temperature{sensor=\"1\"}"), Some(43.0));
        assert_eq!(registry.value("temperature{sensor=\"2\"}"), Some(17.0));
        assert_eq!(registry.published_count(), 2);

        let text = registry.encode().unwrap();
        assert!(text.contains("# HELP temperature Sensor 1"));
        assert!(text.contains("temperature{sensor=\"1\"} 43"));
        assert!(text.contains("temperature{sensor=\"2\"} 17"));
    }

    #[test]
    fn test_split_metric_name() {
        let (family, labels) = split_metric_name("plain").unwrap();
        assert_eq!(family, "plain");
        assert!(labels.is_empty());

        let (family, labels) =
            split_metric_name(r#"flow{line="a, b", unit="m\"3"}"#).unwrap();
        assert_eq!(family, "flow");
        assert_eq!(labels["line"], "a, b");
        assert_eq!(labels["unit"], "m\"3");

        let (family, labels) = split_metric_name("empty{}").unwrap();
        assert_eq!(family, "empty");
        assert!(labels.is_empty());
    }

    #[test]
    fn test_malformed_label_set_is_rejected() {
        let registry = MetricRegistry::new(true).unwrap();
        for name in [
            "temp{sensor=1}",
            "temp{sensor=\"1\"",
            "temp{sensor=\"1\" zone=\"2\"}",
            "temp{a=\"1\",a=\"2\"}",
        ] {
            let err = registry
                .publish(&MetricDefinition::new(name, RegisterKind::Register, 1, ""), 1.0)
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidLabels(_)), "{name}: {err}");
            assert_eq!(registry.value(name), None);
        }
    }

    #[test]
    fn test_help_falls_back_to_kind_and_address() {
        let text = help_text(&MetricDefinition::new("x", RegisterKind::RegisterFloat, 7, " "));
        assert_eq!(text, "Saia PCD R Float at address 7");
    }
}
