//! Bus session: connection lifecycle, availability, discovery, and state
//! publishing.
//!
//! Retained topics (availability and discovery) go through zenoh-ext advanced
//! publishers that cache the latest sample, so late-joining subscribers
//! recover the current value without waiting for the next change. Sensor
//! state values are plain puts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use zenoh::Session;
use zenoh_ext::{AdvancedPublisher, AdvancedPublisherBuilderExt, CacheConfig};

use crate::config::MisterBridgeConfig;
use crate::discovery::{DeviceIdentity, DiscoveryRecord, PAYLOAD_OFFLINE, PAYLOAD_ONLINE};
use crate::error::{BridgeError, Result};
use crate::sensor::Sensor;
use crate::topic::Topics;

/// Grace period between the offline announcement and transport teardown.
const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Connection lifecycle states.
///
/// `Disconnected` is both the initial and the terminal state. `Connected`
/// means the transport is up but availability has not been announced yet;
/// `Publishing` means the node has announced itself as online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live transport.
    Disconnected,
    /// Transport is up; availability not announced.
    Connected,
    /// Availability announced; the node is visible as online.
    Publishing,
}

/// Owns the bus connection and the bridge's publish surface.
pub struct BusSession {
    session: Arc<Session>,
    topics: Topics,
    device: DeviceIdentity,
    state: RwLock<SessionState>,
    /// Cached publishers for retained topics, created on first use and kept
    /// for the session lifetime (the cache lives with the publisher).
    retained: RwLock<HashMap<String, AdvancedPublisher<'static>>>,
}

impl std::fmt::Debug for BusSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusSession")
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

impl BusSession {
    /// Connect to the bus and announce availability.
    ///
    /// Connection failures are fatal. A failed availability announcement is
    /// not: the session stays [`SessionState::Connected`] and a warning is
    /// logged.
    pub async fn connect(config: &MisterBridgeConfig, node_id: impl Into<String>) -> Result<Self> {
        let node_id = node_id.into();
        let zenoh_config = build_zenoh_config(config)?;

        tracing::info!(
            mode = %config.zenoh.mode,
            connect = ?config.zenoh.connect,
            client_id = %config.mister.client_id,
            "Connecting to the bus"
        );

        let session = zenoh::open(zenoh_config)
            .await
            .map_err(|e| BridgeError::connection(e.to_string()))?;

        tracing::info!(zid = %session.zid(), node = %node_id, "Connected to the bus");

        let bus = Self {
            session: Arc::new(session),
            topics: Topics::new(config.mister.topic_prefix.clone(), node_id.clone()),
            device: DeviceIdentity::new(node_id),
            state: RwLock::new(SessionState::Connected),
            retained: RwLock::new(HashMap::new()),
        };

        let availability = bus.topics.availability();
        match bus.publish_retained(&availability, PAYLOAD_ONLINE.into()).await {
            Ok(()) => {
                *bus.state.write().await = SessionState::Publishing;
                tracing::info!(topic = %availability, "Announced availability");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to announce availability");
            }
        }

        Ok(bus)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// The topic set this session publishes under.
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Publish a retained discovery record for every sensor.
    ///
    /// Records are published in registry order; the first failure aborts the
    /// rest and is fatal to startup.
    pub async fn publish_discovery(&self) -> Result<()> {
        self.ensure_connected().await?;

        for sensor in Sensor::ALL {
            let record = DiscoveryRecord::new(sensor, &self.topics, &self.device);
            let payload = serde_json::to_vec(&record)
                .map_err(|e| BridgeError::discovery(sensor.id(), e.to_string()))?;

            self.publish_retained(&self.topics.discovery(sensor), payload)
                .await
                .map_err(|e| BridgeError::discovery(sensor.id(), e.to_string()))?;

            tracing::info!(sensor = %sensor, "Published discovery record");
        }

        Ok(())
    }

    /// Publish a sensor state value.
    pub async fn publish_state(&self, sensor: Sensor, value: &str) -> Result<()> {
        self.ensure_connected().await?;

        let topic = self.topics.state(sensor);
        self.session
            .put(&topic, value.as_bytes().to_vec())
            .await
            .map_err(|e| BridgeError::publish(&topic, e.to_string()))?;

        tracing::debug!(sensor = %sensor, value = %value, "Published state");

        Ok(())
    }

    /// Announce unavailability and tear down the transport.
    ///
    /// Idempotent; the second call returns immediately. The offline
    /// announcement is best-effort and followed by a short grace period so
    /// in-flight messages drain before the session closes.
    pub async fn disconnect(&self) {
        {
            let mut state = self.state.write().await;
            if *state == SessionState::Disconnected {
                return;
            }
            *state = SessionState::Disconnected;
        }

        let availability = self.topics.availability();
        if let Err(e) = self.publish_retained(&availability, PAYLOAD_OFFLINE.into()).await {
            tracing::warn!(error = %e, "Failed to announce offline availability");
        }

        tokio::time::sleep(DISCONNECT_GRACE).await;

        if let Err(e) = self.session.close().await {
            tracing::warn!(error = %e, "Error closing bus session");
        }

        tracing::info!("Disconnected from the bus");
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.state().await == SessionState::Disconnected {
            return Err(BridgeError::connection("bus session is disconnected"));
        }
        Ok(())
    }

    /// Publish a payload through the topic's cached publisher, creating the
    /// publisher on first use.
    async fn publish_retained(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.get_or_create_retained(topic).await?;

        let retained = self.retained.read().await;
        if let Some(publisher) = retained.get(topic) {
            publisher
                .put(payload)
                .await
                .map_err(|e| BridgeError::publish(topic, e.to_string()))?;
        }

        Ok(())
    }

    async fn get_or_create_retained(&self, topic: &str) -> Result<()> {
        {
            let retained = self.retained.read().await;
            if retained.contains_key(topic) {
                return Ok(());
            }
        }

        let publisher: AdvancedPublisher<'_> = self
            .session
            .declare_publisher(topic.to_string())
            .cache(CacheConfig::default().max_samples(1))
            .publisher_detection()
            .await
            .map_err(|e| {
                BridgeError::publish(topic, format!("Failed to create cached publisher: {}", e))
            })?;

        // Safety: We're using 'static lifetime because the publisher is stored
        // in the session struct and the underlying session is kept alive by Arc
        let publisher: AdvancedPublisher<'static> = unsafe { std::mem::transmute(publisher) };

        let mut retained = self.retained.write().await;
        retained.insert(topic.to_string(), publisher);

        tracing::debug!(topic = %topic, "Created cached publisher");

        Ok(())
    }
}

/// Translate the bridge configuration into a Zenoh session configuration.
fn build_zenoh_config(config: &MisterBridgeConfig) -> Result<zenoh::Config> {
    let mut zenoh_config = zenoh::Config::default();

    let mode_str = match config.zenoh.mode.as_str() {
        "client" | "peer" | "router" => format!("\"{}\"", config.zenoh.mode),
        other => {
            return Err(BridgeError::config(format!(
                "Invalid Zenoh mode: '{}'. Expected 'client', 'peer', or 'router'",
                other
            )));
        }
    };

    zenoh_config
        .insert_json5("mode", &mode_str)
        .map_err(|e| BridgeError::config(format!("Failed to set mode: {}", e)))?;

    if !config.zenoh.connect.is_empty() {
        let endpoints_json = serde_json::to_string(&config.zenoh.connect)
            .map_err(|e| BridgeError::config(format!("Failed to serialize endpoints: {}", e)))?;

        zenoh_config
            .insert_json5("connect/endpoints", &endpoints_json)
            .map_err(|e| BridgeError::config(format!("Failed to set connect endpoints: {}", e)))?;
    }

    if !config.zenoh.listen.is_empty() {
        let endpoints_json = serde_json::to_string(&config.zenoh.listen)
            .map_err(|e| BridgeError::config(format!("Failed to serialize endpoints: {}", e)))?;

        zenoh_config
            .insert_json5("listen/endpoints", &endpoints_json)
            .map_err(|e| BridgeError::config(format!("Failed to set listen endpoints: {}", e)))?;
    }

    if let (Some(username), Some(password)) = (&config.zenoh.username, &config.zenoh.password) {
        let user_json = serde_json::to_string(username)
            .map_err(|e| BridgeError::config(format!("Failed to serialize username: {}", e)))?;
        let password_json = serde_json::to_string(password)
            .map_err(|e| BridgeError::config(format!("Failed to serialize password: {}", e)))?;

        zenoh_config
            .insert_json5("transport/auth/usrpwd/user", &user_json)
            .map_err(|e| BridgeError::config(format!("Failed to set username: {}", e)))?;
        zenoh_config
            .insert_json5("transport/auth/usrpwd/password", &password_json)
            .map_err(|e| BridgeError::config(format!("Failed to set password: {}", e)))?;
    }

    // Session name shown in the bus admin space.
    let metadata = serde_json::json!({ "name": config.mister.client_id });
    zenoh_config
        .insert_json5("metadata", &metadata.to_string())
        .map_err(|e| BridgeError::config(format!("Failed to set metadata: {}", e)))?;

    Ok(zenoh_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Session tests need a live bus; the publish paths are covered by
    // integration tests. Config translation is testable offline.

    #[test]
    fn test_build_zenoh_config_defaults() {
        let config = MisterBridgeConfig::default();
        assert!(build_zenoh_config(&config).is_ok());
    }

    #[test]
    fn test_build_zenoh_config_client_with_auth() {
        let mut config = MisterBridgeConfig::default();
        config.zenoh.mode = "client".to_string();
        config.zenoh.connect = vec!["tcp/192.168.1.10:7447".to_string()];
        config.zenoh.username = Some("mister".to_string());
        config.zenoh.password = Some("secret\"quoted".to_string());
        assert!(build_zenoh_config(&config).is_ok());
    }

    #[test]
    fn test_build_zenoh_config_rejects_unknown_mode() {
        let mut config = MisterBridgeConfig::default();
        config.zenoh.mode = "gateway".to_string();
        assert!(matches!(
            build_zenoh_config(&config),
            Err(BridgeError::Config(_))
        ));
    }
}
