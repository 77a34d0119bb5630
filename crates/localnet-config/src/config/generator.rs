use crate::error::{ConfigError, ConfigResult};
use crate::subnet::Subnet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ChainSettings, NodeSettings, PortSettings};

/// What to do when writing one participant's files fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the whole run on the first failure
    #[default]
    Strict,
    /// Record the failure, leave the participant out of the manifest, carry on
    Lenient,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Strict => write!(f, "strict"),
            FailurePolicy::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "lenient" => Ok(FailurePolicy::Lenient),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

/// The virtual network every service is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualNetworkSettings {
    /// Network name used as the key in the manifest
    pub name: String,

    /// Network driver
    pub driver: String,

    /// Subnet the node addresses are allocated from
    pub subnet: Subnet,
}

impl Default for VirtualNetworkSettings {
    fn default() -> Self {
        Self {
            name: "camino-local".to_string(),
            driver: "bridge".to_string(),
            subnet: Subnet::default(),
        }
    }
}

/// Main configuration for one generator run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Root directory that receives one subdirectory per node and the manifest
    pub output_dir: PathBuf,

    /// Delete and regenerate an existing output directory
    pub allow_override: bool,

    /// Container image every service runs
    pub image: String,

    /// Number of archive-only nodes appended after the validators
    pub archive_nodes: usize,

    /// Handling of per-participant write failures
    pub failure_policy: FailurePolicy,

    /// Virtual network settings
    pub network: VirtualNetworkSettings,

    /// Node config defaults
    pub node: NodeSettings,

    /// Host and container ports
    pub ports: PortSettings,

    /// Sub-chain config preset
    pub chain: ChainSettings,

    /// Environment variables set on every service
    pub service_environment: BTreeMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./local/docker-compose"),
            allow_override: false,
            image: "c4tplatform/camino-node:chain4travel".to_string(),
            archive_nodes: 0,
            failure_policy: FailurePolicy::default(),
            network: VirtualNetworkSettings::default(),
            node: NodeSettings::default(),
            ports: PortSettings::default(),
            chain: ChainSettings::default(),
            service_environment: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// File name of the manifest inside `output_dir`
    pub const MANIFEST_FILE: &'static str = "docker-compose.yml";

    /// Path of the manifest this configuration produces
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(Self::MANIFEST_FILE)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> ConfigResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Output directory cannot be empty".to_string(),
            ));
        }

        if self.image.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Image reference cannot be empty".to_string(),
            ));
        }

        if self.network.name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Network name cannot be empty".to_string(),
            ));
        }

        if self.network.driver.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Network driver cannot be empty".to_string(),
            ));
        }

        // The bootstrap validator needs an address too.
        if self.archive_nodes >= self.network.subnet.host_capacity() {
            return Err(ConfigError::ValidationFailed(format!(
                "{} archive nodes leave no room for validators in {} ({} hosts)",
                self.archive_nodes,
                self.network.subnet,
                self.network.subnet.host_capacity()
            )));
        }

        self.node.validate()?;
        self.ports.validate()?;
        self.chain.validate(&self.node.data_dir)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.failure_policy, FailurePolicy::Strict);
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("./local/docker-compose/docker-compose.yml")
        );
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("strict".parse::<FailurePolicy>().unwrap(), FailurePolicy::Strict);
        assert_eq!("LENIENT".parse::<FailurePolicy>().unwrap(), FailurePolicy::Lenient);
        assert!("sometimes".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::Lenient.to_string(), "lenient");
    }

    #[test]
    fn test_archive_nodes_bounded_by_subnet() {
        let mut config = GeneratorConfig::default();
        config.network.subnet = "10.0.7.0/30".parse().unwrap();
        config.archive_nodes = 1;
        assert!(config.validate().is_err());

        config.archive_nodes = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_data_dir_moves_offline_pruning() {
        let mut config = GeneratorConfig::default();
        config.node.data_dir = "/var/lib/node".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.chain.offline_pruning_dir(&config.node.data_dir),
            "/var/lib/node/offline-pruning"
        );

        config.chain.offline_pruning_data_directory = Some("/mnt/node/offline-pruning".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut config = GeneratorConfig::default();
        config.image = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
