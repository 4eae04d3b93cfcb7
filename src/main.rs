//! saia-pcd-exporter - version 0.1.0
//!
//! Prometheus exporter for Saia PCD controllers with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use saia_pcd_exporter::{Collector, GrpcRegisterClient, MetricCatalog, MetricRegistry, Scheduler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use config::{resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT};
use state::AppState;

/// Initializes tracing logging subsystem with the resolved log level.
fn setup_logging(level: LogLevel) {
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {:#}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {:#}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(config.log_level());

        return match command {
            Commands::Check => command_check(&config),
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose, &config).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(config.log_level());

    info!("Starting saia-pcd-exporter");

    // Catalog errors are fatal: nothing to poll without a valid list
    let catalog = MetricCatalog::from_path(config.csv_file())
        .context("Failed to create exporter")?;

    let client = GrpcRegisterClient::connect_lazy(config.server_addr(), config.connect_timeout())
        .context("Failed to create gateway client")?;

    let registry = Arc::new(MetricRegistry::new(
        config.enable_telemetry.unwrap_or(true),
    )?);

    let collector = Arc::new(
        Collector::new(catalog, Arc::new(client), registry.clone())
            .with_cycle_timeout(config.cycle_timeout()),
    );
    let scheduler = Arc::new(Scheduler::new(collector.clone()));

    // Initial pass completes before the server starts listening
    scheduler.start(config.interval()).await?;

    let bind_ip_str = config.bind.clone().unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let state = Arc::new(AppState {
        registry,
        collector,
        scheduler: scheduler.clone(),
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", bind_ip_str, port))?;
    let app = handlers::router(state);

    let result = if config.enable_tls.unwrap_or(false) {
        // Paths are present and readable, validate_effective_config() checked them
        let cert_path = config.tls_cert_path.clone().unwrap_or_default();
        let key_path = config.tls_key_path.clone().unwrap_or_default();

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!("saia-pcd-exporter listening on https://{}:{}", bind_ip_str, port);

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => result.map_err(anyhow::Error::from),
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
                Ok(())
            }
        }
    } else {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("saia-pcd-exporter listening on http://{}:{}", bind_ip_str, port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(anyhow::Error::from)
    };

    // Let an in-flight pass finish before exiting
    scheduler.shutdown().await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("saia-pcd-exporter stopped gracefully");
    Ok(())
}
