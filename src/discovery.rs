//! Discovery records in the Home Assistant convention.
//!
//! Each sensor is announced once, at startup, with a retained JSON record on
//! its discovery topic. Consumers that follow the convention (Home Assistant
//! through an MQTT gateway, or any bus subscriber) pick the record up and
//! register the sensor without manual configuration.

use serde::{Deserialize, Serialize};

use crate::sensor::Sensor;
use crate::topic::Topics;

/// Availability payload announcing the node is up.
pub const PAYLOAD_ONLINE: &str = "online";

/// Availability payload announcing the node is down.
pub const PAYLOAD_OFFLINE: &str = "offline";

/// Device identity shared by all of a node's discovery records.
///
/// The identity is what groups the three sensors under one device entry in
/// consuming dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Unique device identifiers; a single entry holding the node ID.
    pub identifiers: Vec<String>,
    /// Device display name.
    pub name: String,
    /// Device model.
    pub model: String,
    /// Device manufacturer.
    pub manufacturer: String,
    /// Reported software version.
    pub sw_version: String,
}

impl DeviceIdentity {
    /// Build the MiSTer device identity for a node.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            identifiers: vec![node_id.into()],
            name: "MiSTer FPGA".to_string(),
            model: "MiSTer".to_string(),
            manufacturer: "MiSTer Project".to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A retained discovery record describing one sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// Sensor display name, `{device name} {sensor name}`.
    pub name: String,
    /// Topic the sensor's values are published on.
    pub state_topic: String,
    /// Stable unique identifier, `{node_id}_{sensor_id}`.
    pub unique_id: String,
    /// The device this sensor belongs to.
    pub device: DeviceIdentity,
    /// Topic carrying the node's availability payloads.
    pub availability_topic: String,
    /// Payload meaning the node is available.
    pub payload_available: String,
    /// Payload meaning the node is unavailable.
    pub payload_not_available: String,
}

impl DiscoveryRecord {
    /// Build the discovery record for one sensor.
    pub fn new(sensor: Sensor, topics: &Topics, device: &DeviceIdentity) -> Self {
        Self {
            name: format!("{} {}", device.name, sensor.display_name()),
            state_topic: topics.state(sensor),
            unique_id: topics.unique_id(sensor),
            device: device.clone(),
            availability_topic: topics.availability(),
            payload_available: PAYLOAD_ONLINE.to_string(),
            payload_not_available: PAYLOAD_OFFLINE.to_string(),
        }
    }
}
