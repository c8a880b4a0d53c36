//! Topic construction for the Home Assistant sensor convention.
//!
//! All topics live under a configurable prefix (`homeassistant` by default)
//! and carry the node identifier, so several MiSTer devices can share one
//! bus without colliding:
//!
//! ```text
//! {prefix}/sensor/{node_id}/{sensor_id}/state    sensor values
//! {prefix}/sensor/{node_id}/{sensor_id}/config   retained discovery records
//! {prefix}/sensor/{node_id}/availability         retained "online"/"offline"
//! ```

use crate::sensor::Sensor;

/// The topic set for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
    node_id: String,
}

impl Topics {
    /// Create the topic set for a node under a prefix.
    pub fn new(prefix: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            node_id: node_id.into(),
        }
    }

    /// The node identifier these topics are scoped to.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// State topic for a sensor.
    pub fn state(&self, sensor: Sensor) -> String {
        format!(
            "{}/sensor/{}/{}/state",
            self.prefix,
            self.node_id,
            sensor.id()
        )
    }

    /// Discovery topic for a sensor.
    pub fn discovery(&self, sensor: Sensor) -> String {
        format!(
            "{}/sensor/{}/{}/config",
            self.prefix,
            self.node_id,
            sensor.id()
        )
    }

    /// Availability topic for the node.
    pub fn availability(&self) -> String {
        format!("{}/sensor/{}/availability", self.prefix, self.node_id)
    }

    /// Unique sensor identifier, `{node_id}_{sensor_id}`.
    pub fn unique_id(&self, sensor: Sensor) -> String {
        format!("{}_{}", self.node_id, sensor.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_topic() {
        let topics = Topics::new("homeassistant", "mister");
        assert_eq!(
            topics.state(Sensor::CoreName),
            "homeassistant/sensor/mister/corename/state"
        );
        assert_eq!(
            topics.state(Sensor::ActiveGame),
            "homeassistant/sensor/mister/activegame/state"
        );
        assert_eq!(
            topics.state(Sensor::RbfName),
            "homeassistant/sensor/mister/rbfname/state"
        );
    }

    #[test]
    fn test_discovery_topic() {
        let topics = Topics::new("homeassistant", "mister");
        assert_eq!(
            topics.discovery(Sensor::CoreName),
            "homeassistant/sensor/mister/corename/config"
        );
    }

    #[test]
    fn test_availability_topic() {
        let topics = Topics::new("homeassistant", "mister");
        assert_eq!(topics.availability(), "homeassistant/sensor/mister/availability");
    }

    #[test]
    fn test_unique_id() {
        let topics = Topics::new("homeassistant", "livingroom");
        assert_eq!(topics.unique_id(Sensor::RbfName), "livingroom_rbfname");
    }

    #[test]
    fn test_custom_prefix() {
        let topics = Topics::new("ha/dev", "mister");
        assert_eq!(
            topics.state(Sensor::CoreName),
            "ha/dev/sensor/mister/corename/state"
        );
    }
}
