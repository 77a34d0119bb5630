use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Log levels understood by the node binary.
const NODE_LOG_LEVELS: &[&str] = &["OFF", "FATAL", "ERROR", "WARN", "INFO", "TRACE", "DEBUG", "VERBO"];

/// Defaults baked into every generated node config and service entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Node binary invoked by the service entrypoint, relative to the image workdir
    pub binary: String,

    /// Container path the node directory is mounted at; also the node's data dir
    pub data_dir: String,

    /// Interface the HTTP API binds to inside the container
    pub http_host: String,

    /// Network ID written to every node config
    pub network_id: u64,

    /// Level for the node's log files
    pub log_level: String,

    /// Level for the node's console output
    pub log_display_level: String,

    /// Enable the indexer API
    pub index_enabled: bool,

    /// Enable the admin API
    pub api_admin_enabled: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            binary: "./camino-node".to_string(),
            data_dir: "/mnt/node".to_string(),
            http_host: "0.0.0.0".to_string(),
            network_id: 54321,
            log_level: "DEBUG".to_string(),
            log_display_level: "INFO".to_string(),
            index_enabled: true,
            api_admin_enabled: true,
        }
    }
}

impl NodeSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.binary.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Node binary cannot be empty".to_string(),
            ));
        }

        if !self.data_dir.starts_with('/') || self.data_dir.len() < 2 {
            return Err(ConfigError::ValidationFailed(format!(
                "Data dir '{}' must be an absolute container path below /",
                self.data_dir
            )));
        }

        if self.http_host.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "HTTP host cannot be empty".to_string(),
            ));
        }

        for (name, level) in [
            ("log_level", &self.log_level),
            ("log_display_level", &self.log_display_level),
        ] {
            if !NODE_LOG_LEVELS.contains(&level.to_uppercase().as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid {}: {}",
                    name, level
                )));
            }
        }

        Ok(())
    }
}

/// Port layout. Container ports are fixed; host ports are allocated from
/// `host_base` upwards, two per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    /// First host port handed out; node `i` gets `host_base + 2i` and `host_base + 2i + 1`
    pub host_base: u16,

    /// HTTP API port inside the container
    pub http_port: u16,

    /// Staking (peer-to-peer) port inside the container
    pub staking_port: u16,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            host_base: 9650,
            http_port: 9650,
            staking_port: 9651,
        }
    }
}

impl PortSettings {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host_base == 0 || self.host_base == u16::MAX {
            return Err(ConfigError::ValidationFailed(format!(
                "Host base port must be between 1 and {}",
                u16::MAX - 1
            )));
        }

        if self.http_port == 0 || self.staking_port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Container ports cannot be 0".to_string(),
            ));
        }

        if self.http_port == self.staking_port {
            return Err(ConfigError::ValidationFailed(
                "HTTP and staking ports cannot be the same".to_string(),
            ));
        }

        Ok(())
    }
}
