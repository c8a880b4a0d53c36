//! Zenoh bridge for MiSTer FPGA status sensors.
//!
//! The MiSTer process mirrors its state into small files under `/tmp`:
//! `CORENAME` (the loaded core), `ACTIVEGAME` (the running game), and
//! `RBFNAME` (the loaded bitstream). This bridge watches those files and
//! republishes every change to the bus, announcing the node and its sensors
//! with retained discovery records in the Home Assistant convention:
//!
//! - [`sensor`] - The fixed sensor registry
//! - [`topic`] - Topic construction
//! - [`discovery`] - Discovery records and availability payloads
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`session`] - Bus session, availability, and publishing
//! - [`watcher`] - Filesystem watch adapter
//! - [`router`] - Change event to publish routing
//! - [`error`] - Error types
//!
//! # Topics
//!
//! ```text
//! homeassistant/sensor/{node}/{sensor}/state    sensor values
//! homeassistant/sensor/{node}/{sensor}/config   retained discovery records
//! homeassistant/sensor/{node}/availability      retained "online"/"offline"
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod router;
pub mod sensor;
pub mod session;
pub mod topic;
pub mod watcher;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, MisterBridgeConfig, MisterConfig, ZenohConfig};
pub use discovery::{DeviceIdentity, DiscoveryRecord, PAYLOAD_OFFLINE, PAYLOAD_ONLINE};
pub use error::{BridgeError, Result};
pub use sensor::Sensor;
pub use session::{BusSession, SessionState};
pub use topic::Topics;
pub use watcher::{ChangeEvent, FileWatcher};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// The `RUST_LOG` environment variable, when set, overrides the configured
/// level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| BridgeError::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| BridgeError::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
