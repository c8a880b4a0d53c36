//! Zenoh bridge for MiSTer FPGA status.
//!
//! Watches the status files the MiSTer process maintains (`CORENAME`,
//! `ACTIVEGAME`, `RBFNAME`) and publishes every change to Zenoh, announcing
//! the node and its sensors with retained discovery records in the Home
//! Assistant convention.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use zenoh_bridge_mister::config::MisterBridgeConfig;
use zenoh_bridge_mister::{BusSession, FileWatcher, init_tracing, router};

/// Zenoh bridge for MiSTer FPGA status sensors.
#[derive(Parser, Debug)]
#[command(name = "zenoh-bridge-mister")]
#[command(about = "Bridge MiSTer FPGA status files to Zenoh", long_about = None)]
struct Args {
    /// Path to the configuration file (JSON5 format).
    #[arg(short, long, default_value = "mister.json5")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = MisterBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize tracing
    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    // Resolve the node identity
    let node_id = config
        .node_id()
        .context("Failed to resolve node identity")?;

    tracing::info!(
        config = ?args.config,
        node = %node_id,
        prefix = %config.mister.topic_prefix,
        status_dir = %config.mister.status_dir.display(),
        "Starting zenoh-bridge-mister"
    );

    // Connect to the bus and announce the sensors
    let bus = Arc::new(
        BusSession::connect(&config, node_id)
            .await
            .context("Failed to connect to the bus")?,
    );

    bus.publish_discovery()
        .await
        .context("Failed to publish discovery records")?;

    // Start the watcher; the initial snapshot flows through the router
    let (watcher, events) =
        FileWatcher::start(&config.mister).context("Failed to start the file watcher")?;

    let router_task = tokio::spawn(router::run(events, bus.clone()));

    tracing::info!("Bridge running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    signal::ctrl_c().await?;

    tracing::info!("Shutting down...");

    // Stop the watcher, drain the router, then announce offline
    watcher.stop().await;
    if let Err(e) = router_task.await {
        tracing::warn!(error = %e, "Router task ended abnormally");
    }

    bus.disconnect().await;

    tracing::info!("Goodbye!");

    Ok(())
}
