//! Configuration for the MiSTer bridge.
//!
//! Configuration is loaded from a JSON5 file. Every field has a default, so
//! an empty file (`{}`) yields a working peer-mode bridge watching `/tmp`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Well-known file holding the node's configured name.
pub const HOSTNAME_FILE: &str = "/etc/hostname";

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisterBridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,
    /// Bridge settings.
    #[serde(default)]
    pub mister: MisterConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Zenoh connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenohConfig {
    /// Session mode: "client", "peer", or "router".
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Endpoints to connect to, e.g. `["tcp/192.168.1.10:7447"]`.
    #[serde(default)]
    pub connect: Vec<String>,

    /// Endpoints to listen on.
    #[serde(default)]
    pub listen: Vec<String>,

    /// Username for user/password transport authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for user/password transport authentication.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for ZenohConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            connect: Vec::new(),
            listen: Vec::new(),
            username: None,
            password: None,
        }
    }
}

/// Bridge-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisterConfig {
    /// Topic prefix all published topics live under.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Session name reported to the bus admin space.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Node identifier; `"auto"` derives it from [`HOSTNAME_FILE`].
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Directory holding the watched status files.
    #[serde(default = "default_status_dir")]
    pub status_dir: PathBuf,
}

impl Default for MisterConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            client_id: default_client_id(),
            node_id: default_node_id(),
            status_dir: default_status_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", or "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

fn default_mode() -> String {
    "peer".to_string()
}

fn default_topic_prefix() -> String {
    "homeassistant".to_string()
}

fn default_client_id() -> String {
    "zenoh-bridge-mister".to_string()
}

fn default_node_id() -> String {
    "auto".to_string()
}

fn default_status_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MisterBridgeConfig {
    fn default() -> Self {
        Self {
            zenoh: ZenohConfig::default(),
            mister: MisterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MisterBridgeConfig {
    /// Load and validate configuration from a JSON5 file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: Self = json5::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.mister.topic_prefix;
        if prefix.is_empty() {
            return Err(BridgeError::validation("topic_prefix must not be empty"));
        }
        if prefix.split('/').any(|chunk| chunk.is_empty()) {
            return Err(BridgeError::validation(
                "topic_prefix must not contain empty segments",
            ));
        }
        if prefix.contains(['*', '$', '?', '#']) {
            return Err(BridgeError::validation(
                "topic_prefix must not contain wildcard characters",
            ));
        }

        if self.mister.client_id.is_empty() {
            return Err(BridgeError::validation("client_id must not be empty"));
        }

        if self.mister.node_id.is_empty() {
            return Err(BridgeError::validation(
                "node_id must not be empty; use \"auto\" to derive it from the hostname",
            ));
        }

        if self.mister.status_dir.as_os_str().is_empty() {
            return Err(BridgeError::validation("status_dir must not be empty"));
        }

        if self.zenoh.username.is_some() != self.zenoh.password.is_some() {
            return Err(BridgeError::validation(
                "username and password must be configured together",
            ));
        }

        Ok(())
    }

    /// Resolve the effective node identifier.
    ///
    /// `"auto"` reads it from [`HOSTNAME_FILE`]; anything else is used
    /// verbatim.
    pub fn node_id(&self) -> Result<String> {
        if self.mister.node_id == "auto" {
            read_node_id(Path::new(HOSTNAME_FILE))
        } else {
            Ok(self.mister.node_id.clone())
        }
    }
}

/// Read and trim the node identifier from a hostname file.
///
/// Fails if the file is unreadable or holds only whitespace; the bridge
/// cannot construct its topics without a node identity.
pub fn read_node_id(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::node_identity(format!("failed to read {}: {}", path.display(), e))
    })?;

    let node_id = content.trim();
    if node_id.is_empty() {
        return Err(BridgeError::node_identity(format!(
            "{} is empty",
            path.display()
        )));
    }

    Ok(node_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MisterBridgeConfig::default();
        assert_eq!(config.zenoh.mode, "peer");
        assert_eq!(config.mister.topic_prefix, "homeassistant");
        assert_eq!(config.mister.client_id, "zenoh-bridge-mister");
        assert_eq!(config.mister.node_id, "auto");
        assert_eq!(config.mister.status_dir, PathBuf::from("/tmp"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_object() {
        let config: MisterBridgeConfig = json5::from_str("{}").unwrap();
        assert_eq!(config.mister.topic_prefix, "homeassistant");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config: MisterBridgeConfig = json5::from_str(
            r#"{
                zenoh: {
                    mode: "client",
                    connect: ["tcp/192.168.1.10:7447"],
                    username: "mister",
                    password: "secret",
                },
                mister: {
                    topic_prefix: "ha",
                    client_id: "bridge-livingroom",
                    node_id: "livingroom",
                    status_dir: "/var/run/mister",
                },
                logging: {
                    level: "debug",
                    format: "json",
                },
            }"#,
        )
        .unwrap();

        assert_eq!(config.zenoh.mode, "client");
        assert_eq!(config.zenoh.connect, vec!["tcp/192.168.1.10:7447"]);
        assert_eq!(config.zenoh.username.as_deref(), Some("mister"));
        assert_eq!(config.mister.topic_prefix, "ha");
        assert_eq!(config.mister.node_id, "livingroom");
        assert_eq!(config.mister.status_dir, PathBuf::from("/var/run/mister"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let mut config = MisterBridgeConfig::default();
        config.mister.topic_prefix = String::new();
        assert!(matches!(
            config.validate(),
            Err(BridgeError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_prefix_segments() {
        let mut config = MisterBridgeConfig::default();
        config.mister.topic_prefix = "ha//dev".to_string();
        assert!(config.validate().is_err());

        config.mister.topic_prefix = "/ha".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wildcards() {
        let mut config = MisterBridgeConfig::default();
        config.mister.topic_prefix = "homeassistant/*".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_lone_credentials() {
        let mut config = MisterBridgeConfig::default();
        config.zenoh.username = Some("mister".to_string());
        assert!(config.validate().is_err());

        config.zenoh.password = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_node_id_skips_hostname() {
        let mut config = MisterBridgeConfig::default();
        config.mister.node_id = "livingroom".to_string();
        assert_eq!(config.node_id().unwrap(), "livingroom");
    }

    #[test]
    fn test_load_missing_file() {
        let err = MisterBridgeConfig::load("/nonexistent/mister.json5").unwrap_err();
        assert!(matches!(err, BridgeError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mister.json5");
        std::fs::write(&path, "{ zenoh: ").unwrap();
        assert!(matches!(
            MisterBridgeConfig::load(&path),
            Err(BridgeError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_read_node_id_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostname");
        std::fs::write(&path, "  mister\n").unwrap();
        assert_eq!(read_node_id(&path).unwrap(), "mister");
    }

    #[test]
    fn test_read_node_id_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostname");
        std::fs::write(&path, "\n").unwrap();
        assert!(matches!(
            read_node_id(&path),
            Err(BridgeError::NodeIdentity(_))
        ));
    }

    #[test]
    fn test_read_node_id_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostname");
        assert!(matches!(
            read_node_id(&path),
            Err(BridgeError::NodeIdentity(_))
        ));
    }
}
