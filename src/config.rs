//! Configuration management for saia-pcd-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tonic::codegen::http::Uri;
use tracing::info;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SERVER_ADDR: &str = "http://192.168.85.41:50051";
pub const DEFAULT_CSV_FILE: &str = "misc/prometheus_metrics.csv";
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Exporter configuration. Unset fields fall back to the defaults above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Remote gateway
    #[serde(alias = "server-addr", alias = "addr")]
    pub server_addr: Option<String>,
    #[serde(alias = "connect-timeout-secs")]
    pub connect_timeout_secs: Option<u64>,

    // Collection
    #[serde(alias = "csv-file")]
    pub csv_file: Option<PathBuf>,
    #[serde(alias = "interval-secs")]
    pub interval_secs: Option<u64>,
    #[serde(alias = "cycle-timeout-secs")]
    pub cycle_timeout_secs: Option<u64>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            server_addr: Some(DEFAULT_SERVER_ADDR.to_string()),
            connect_timeout_secs: Some(DEFAULT_CONNECT_TIMEOUT_SECS),
            csv_file: Some(PathBuf::from(DEFAULT_CSV_FILE)),
            interval_secs: Some(DEFAULT_INTERVAL_SECS),
            cycle_timeout_secs: Some(DEFAULT_CYCLE_TIMEOUT_SECS),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some(DEFAULT_LOG_LEVEL.as_str().into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn server_addr(&self) -> &str {
        self.server_addr.as_deref().unwrap_or(DEFAULT_SERVER_ADDR)
    }

    pub fn csv_file(&self) -> PathBuf {
        self.csv_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_FILE))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs.unwrap_or(DEFAULT_CYCLE_TIMEOUT_SECS))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Effective log level. Unknown names fall back to the default;
    /// `validate_effective_config` rejects them before this is used.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(parse_log_level)
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn parse_log_level(name: &str) -> Option<LogLevel> {
    <LogLevel as clap::ValueEnum>::from_str(name.trim(), true).ok()
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    if let Some(level) = cfg.log_level.as_deref() {
        if parse_log_level(level).is_none() {
            bail!(
                "Invalid log_level '{}', expected one of: off, error, warn, info, debug, trace",
                level
            );
        }
    }

    if cfg.interval_secs == Some(0) {
        bail!("interval_secs must be greater than 0");
    }
    if cfg.cycle_timeout_secs == Some(0) {
        bail!("cycle_timeout_secs must be greater than 0");
    }
    if cfg.connect_timeout_secs == Some(0) {
        bail!("connect_timeout_secs must be greater than 0");
    }

    // Gateway address: plaintext HTTP/2 only
    let addr = cfg.server_addr();
    let uri: Uri = addr
        .parse()
        .with_context(|| format!("Invalid server_addr '{}'", addr))?;
    match uri.scheme_str() {
        Some("http") => {}
        Some(other) => bail!(
            "Invalid server_addr '{}': unsupported scheme '{}', expected 'http'",
            addr,
            other
        ),
        None => bail!("Invalid server_addr '{}': missing scheme, expected http://host:port", addr),
    }
    if uri.host().is_none() {
        bail!("Invalid server_addr '{}': missing host", addr);
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                bail!("TLS is enabled but neither tls_cert_path nor tls_key_path are set");
            }
            (Some(_), None) => {
                bail!("TLS is enabled but tls_key_path is not set");
            }
            (None, Some(_)) => {
                bail!("TLS is enabled but tls_cert_path is not set");
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

/// Checks that a TLS file exists, is readable and not empty.
fn check_pem_file(path: &str, what: &str) -> Result<()> {
    if !Path::new(path).exists() {
        bail!("TLS {} file not found: {}", what, path);
    }
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => bail!("TLS {} file is empty: {}", what, path),
        Err(e) => bail!("TLS {} file is not readable: {} ({})", what, path, e),
        Ok(_) => Ok(()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(addr) = &args.addr {
        config.server_addr = Some(addr.clone());
    }
    if let Some(csv_file) = &args.csv_file {
        config.csv_file = Some(csv_file.clone());
    }
    if let Some(interval) = args.interval {
        config.interval_secs = Some(interval);
    }
    if let Some(timeout) = args.cycle_timeout {
        config.cycle_timeout_secs = Some(timeout);
    }

    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads the config file, trying the default locations when no path is given.
///
/// Fields missing from the file keep their default values.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/saia-pcd-exporter/config.yaml",
                "/etc/saia-pcd-exporter/config.yml",
                "/etc/saia-pcd-exporter/config.json",
                "./saia-pcd-exporter.yaml",
                "./saia-pcd-exporter.yml",
                "./saia-pcd-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_defaults(loaded))
}

/// Fills every unset field of `loaded` with its default.
fn merge_defaults(loaded: Config) -> Config {
    let d = Config::default();
    Config {
        port: loaded.port.or(d.port),
        bind: loaded.bind.or(d.bind),
        server_addr: loaded.server_addr.or(d.server_addr),
        connect_timeout_secs: loaded.connect_timeout_secs.or(d.connect_timeout_secs),
        csv_file: loaded.csv_file.or(d.csv_file),
        interval_secs: loaded.interval_secs.or(d.interval_secs),
        cycle_timeout_secs: loaded.cycle_timeout_secs.or(d.cycle_timeout_secs),
        enable_health: loaded.enable_health.or(d.enable_health),
        enable_telemetry: loaded.enable_telemetry.or(d.enable_telemetry),
        log_level: loaded.log_level.or(d.log_level),
        enable_tls: loaded.enable_tls.or(d.enable_tls),
        tls_cert_path: loaded.tls_cert_path.or(d.tls_cert_path),
        tls_key_path: loaded.tls_key_path.or(d.tls_key_path),
    }
}

/// Renders the configuration in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cfg = Config {
            interval_secs: Some(0),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_https_gateway_rejected() {
        let cfg = Config {
            server_addr: Some("https://gateway:50051".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_gateway_without_scheme_rejected() {
        let cfg = Config {
            server_addr: Some("gateway:50051".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_yaml_file_merges_with_defaults() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "interval-secs: 5\nserver_addr: \"http://10.0.0.2:50051\"").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.interval_secs, Some(5));
        assert_eq!(cfg.server_addr(), "http://10.0.0.2:50051");
        assert_eq!(cfg.port, Some(DEFAULT_PORT));
        assert_eq!(cfg.cycle_timeout(), Duration::from_secs(DEFAULT_CYCLE_TIMEOUT_SECS));
    }

    #[test]
    fn test_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "port = 9100\ncsv_file = \"/etc/pcd/metrics.csv\"").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.port, Some(9100));
        assert_eq!(cfg.csv_file(), PathBuf::from("/etc/pcd/metrics.csv"));
    }

    #[test]
    fn test_log_level_from_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "log_level: \"off\"").unwrap();

        let args = Args::parse_from(["saia-pcd-exporter", "-c", file.path().to_str().unwrap()]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.log_level(), LogLevel::Off);
    }

    #[test]
    fn test_cli_log_level_overrides_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "log_level: \"off\"").unwrap();

        let args = Args::parse_from([
            "saia-pcd-exporter",
            "-c",
            file.path().to_str().unwrap(),
            "--log-level",
            "debug",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.log_level(), LogLevel::Debug);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_log_level_defaults_to_info() {
        let args = Args::parse_from(["saia-pcd-exporter", "--no-config"]);
        assert_eq!(resolve_config(&args).unwrap().log_level(), LogLevel::Info);
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let cfg = Config {
            log_level: Some("verbose".into()),
            ..Config::default()
        };
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid log_level 'verbose'"));

        let cfg = Config {
            log_level: Some("WARN".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_render_round_trips_through_yaml() {
        let rendered = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed.interval_secs, Some(DEFAULT_INTERVAL_SECS));
    }
}
