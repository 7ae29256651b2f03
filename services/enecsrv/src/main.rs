//! Binary entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use enecsrv::{
    bind_listener, run_listener, serve_exporter, Config, Dispatcher, ExporterState, Metrics,
    MqttSink, Result,
};

#[derive(Parser, Debug)]
#[command(name = "enecsrv", about = "Enecsys micro-inverter telemetry ingest daemon")]
struct Args {
    /// Path to the YAML configuration file
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Load and report the configuration, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting enecsrv");
    let config = Config::load(args.config.as_deref());
    config.report();

    if args.validate {
        info!("Validation completed");
        return Ok(());
    }

    let metrics = Arc::new(Metrics::new());
    let sink = Arc::new(MqttSink::from_config(config.mqtt.as_ref()));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&metrics),
        Arc::clone(&sink),
        config.topic_namespace.clone(),
    ));

    let exporter_listener = tokio::net::TcpListener::bind(&config.metrics_address).await?;
    info!(address = %config.metrics_address, "Exporter ready");
    let state = ExporterState {
        metrics: Arc::clone(&metrics),
        sink: Arc::clone(&sink),
        started: Instant::now(),
    };
    tokio::spawn(serve_exporter(exporter_listener, state));

    let ingest_listener = bind_listener(&config.listen_address).await?;

    tokio::select! {
        () = run_listener(ingest_listener, dispatcher, metrics) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
