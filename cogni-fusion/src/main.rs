//! CogniShield Safety Fusion (cogni-fusion) - Main entry point
//!
//! Listens for one vision producer, fuses its observations with the
//! physiological and vehicle channels, and reports committed safety tiers.
//! Exits when the producer session ends; reconnects are the supervisor's job.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use cogni_common::config::{load_config, LoggingConfig, CONFIG_ENV_VAR};
use cogni_common::events::EventBus;
use cogni_fusion::reporter::{run_json_sink, BusReporter, ReporterSet, TracingReporter};
use cogni_fusion::{ConfigOverrides, FusionConfig, FusionEngine, FusionServer};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for cogni-fusion
#[derive(Parser, Debug)]
#[command(name = "cogni-fusion")]
#[command(about = "CogniShield driver-monitoring safety fusion engine")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Address to listen on for the vision producer
    #[arg(long, env = "COGNI_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "COGNI_PORT")]
    port: Option<u16>,

    /// Minimum dwell time between committed tier changes (ms)
    #[arg(long, env = "COGNI_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// Receive timeout on the producer stream (ms, 0 disables)
    #[arg(long, env = "COGNI_RECEIVE_TIMEOUT_MS")]
    receive_timeout_ms: Option<u64>,

    /// Seed for the simulated sensors
    #[arg(long, env = "COGNI_SENSOR_SEED")]
    seed: Option<u64>,

    /// Write committed transitions to stdout as JSON lines
    #[arg(long, env = "COGNI_JSON_OUTPUT")]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, config_path) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&toml_config.logging)?;

    // Log build identification immediately after tracing init
    info!(
        "Starting CogniShield Safety Fusion (cogni-fusion) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No config file found, using built-in defaults"),
    }

    let overrides = ConfigOverrides {
        host: args.host,
        port: args.port,
        debounce_ms: args.debounce_ms,
        receive_timeout_ms: args.receive_timeout_ms,
        seed: args.seed,
        json_lines: args.json,
    };
    let config = FusionConfig::resolve(toml_config, overrides)?;
    info!(
        "Debounce interval: {:?}, receive timeout: {:?}, sensors: {:?}",
        config.debounce_interval, config.ingest.receive_timeout, config.sensors.mode
    );

    let event_bus = EventBus::new(config.event_bus_capacity);
    let sink = if config.json_lines {
        let rx = event_bus.subscribe();
        Some(tokio::spawn(run_json_sink(rx, tokio::io::stdout())))
    } else {
        None
    };

    let (physio, vehicle) = config.sensor_sources();
    let reporters = ReporterSet::new()
        .with(TracingReporter)
        .with(BusReporter::new(event_bus.clone()));
    let mut engine = FusionEngine::builder()
        .physio_boxed(physio)
        .vehicle_boxed(vehicle)
        .reporter(reporters)
        .event_bus(event_bus)
        .debounce_interval(config.debounce_interval)
        .build();

    let server = FusionServer::bind(&config.bind_addr, config.ingest)
        .await
        .context("Failed to start fusion server")?;

    let outcome = tokio::select! {
        result = server.serve_one(&mut engine) => Some(result),
        _ = shutdown_signal() => None,
    };

    let result = match outcome {
        Some(Ok(stats)) => {
            info!("Producer session complete ({} cycles)", stats.cycles);
            Ok(())
        }
        Some(Err(e)) => {
            error!("Producer session ended with error: {}", e);
            Err(anyhow::Error::from(e).context("Producer session failed"))
        }
        None => {
            engine.shutdown();
            Ok(())
        }
    };

    // Dropping the engine closes the bus so the sink drains and exits
    drop(engine);
    drop(server);
    if let Some(sink) = sink {
        match sink.await {
            Ok(Ok(written)) => info!("JSON sink wrote {} transitions", written),
            Ok(Err(e)) => warn!("JSON sink stopped: {}", e),
            Err(e) => warn!("JSON sink task failed: {}", e),
        }
    }

    info!("Fusion server shutdown complete");
    result
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to the configured file
/// or to stderr, keeping stdout free for JSON output.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
