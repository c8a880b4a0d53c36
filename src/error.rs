//! Error types for the bridge.

use thiserror::Error;

/// Result type alias using [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in the bridge.
///
/// Configuration, node identity, connection, and discovery errors are fatal
/// at startup. Publish errors are per-publish: callers log them and carry on.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// The node identifier could not be established.
    #[error("Node identity error: {0}")]
    NodeIdentity(String),

    /// Bus connection error.
    #[error("Bus connection error: {0}")]
    Connection(String),

    /// Discovery record publish error.
    #[error("Failed to publish discovery for {sensor}: {message}")]
    Discovery { sensor: String, message: String },

    /// State or availability publish error.
    #[error("Failed to publish to {topic}: {message}")]
    Publish { topic: String, message: String },

    /// Filesystem watch setup error.
    #[error("Watch setup error: {0}")]
    WatchSetup(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create a node identity error.
    pub fn node_identity(msg: impl Into<String>) -> Self {
        Self::NodeIdentity(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a discovery error for a sensor.
    pub fn discovery(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Create a publish error for a topic.
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<json5::Error> for BridgeError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}
