use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Settings for the per-node sub-chain configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Write a chain config file for every node
    pub enabled: bool,

    /// Chain alias; the file lands in `configs/chains/<alias>/config.json`
    pub alias: String,

    /// Offline-pruning scratch directory, as seen from inside the container.
    /// Defaults to `<data_dir>/offline-pruning`; must sit under the data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_pruning_data_directory: Option<String>,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            alias: "C".to_string(),
            offline_pruning_data_directory: None,
        }
    }
}

impl ChainSettings {
    pub const OFFLINE_PRUNING_DIR: &'static str = "offline-pruning";

    /// Offline-pruning directory for a node whose data dir is `data_dir`
    pub fn offline_pruning_dir(&self, data_dir: &str) -> String {
        match &self.offline_pruning_data_directory {
            Some(dir) => dir.clone(),
            None => format!(
                "{}/{}",
                data_dir.trim_end_matches('/'),
                Self::OFFLINE_PRUNING_DIR
            ),
        }
    }

    /// `data_dir` is the container mount point every node file lives under.
    pub fn validate(&self, data_dir: &str) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let single_component = !self.alias.is_empty()
            && !self.alias.contains(['/', '\\'])
            && self.alias != "."
            && self.alias != "..";
        if !single_component {
            return Err(ConfigError::ValidationFailed(format!(
                "Chain alias '{}' must be a single path component",
                self.alias
            )));
        }

        let dir = self.offline_pruning_dir(data_dir);
        let mount = format!("{}/", data_dir.trim_end_matches('/'));
        let inside_mount = dir.strip_prefix(&mount).map_or(false, |rest| {
            !rest.is_empty() && rest.split('/').all(|part| part != "..")
        });
        if !inside_mount {
            return Err(ConfigError::ValidationFailed(format!(
                "Offline pruning directory '{}' must be inside the data dir {}",
                dir, data_dir
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_pruning_follows_data_dir() {
        let settings = ChainSettings::default();
        assert_eq!(settings.offline_pruning_dir("/mnt/node"), "/mnt/node/offline-pruning");
        assert_eq!(settings.offline_pruning_dir("/data/"), "/data/offline-pruning");
        assert!(settings.validate("/data").is_ok());
    }

    #[test]
    fn test_offline_pruning_outside_data_dir_rejected() {
        let mut settings = ChainSettings::default();

        settings.offline_pruning_data_directory = Some("/mnt/node/scratch".to_string());
        assert!(settings.validate("/mnt/node").is_ok());

        for dir in ["/data/offline-pruning", "/mnt/nodeX/p", "/mnt/node/../p", "/mnt/node/"] {
            settings.offline_pruning_data_directory = Some(dir.to_string());
            assert!(settings.validate("/mnt/node").is_err(), "{} accepted", dir);
        }
    }

    #[test]
    fn test_alias_must_be_single_component() {
        let mut settings = ChainSettings::default();
        for alias in ["", ".", "..", "a/b"] {
            settings.alias = alias.to_string();
            assert!(settings.validate("/mnt/node").is_err(), "{:?} accepted", alias);
        }
    }
}
