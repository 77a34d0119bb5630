use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult, GeneratorConfig};

/// Environment variable-based configuration overrides
pub struct EnvLoader;

impl EnvLoader {
    pub const PREFIX: &'static str = "LOCALNET_";

    /// Apply `LOCALNET_*` variables from the process environment
    pub fn apply_overrides(config: &mut GeneratorConfig) -> ConfigResult<()> {
        Self::apply_overrides_from(config, |key| env::var(key).ok())
    }

    /// Apply overrides using `lookup` to resolve variable names
    pub fn apply_overrides_from<F>(config: &mut GeneratorConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", Self::PREFIX, suffix));

        if let Some(dir) = var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(image) = var("IMAGE") {
            config.image = image;
        }

        if let Some(flag) = var("OVERRIDE") {
            config.allow_override = parse(&flag, "LOCALNET_OVERRIDE")?;
        }

        if let Some(count) = var("ARCHIVE_NODES") {
            config.archive_nodes = parse(&count, "LOCALNET_ARCHIVE_NODES")?;
        }

        if let Some(policy) = var("FAILURE_POLICY") {
            config.failure_policy = parse(&policy, "LOCALNET_FAILURE_POLICY")?;
        }

        if let Some(name) = var("NETWORK_NAME") {
            config.network.name = name;
        }

        if let Some(subnet) = var("SUBNET") {
            config.network.subnet = parse(&subnet, "LOCALNET_SUBNET")?;
        }

        if let Some(id) = var("NETWORK_ID") {
            config.node.network_id = parse(&id, "LOCALNET_NETWORK_ID")?;
        }

        if let Some(port) = var("HOST_BASE_PORT") {
            config.ports.host_base = parse(&port, "LOCALNET_HOST_BASE_PORT")?;
        }

        if let Some(level) = var("NODE_LOG_LEVEL") {
            config.node.log_level = level;
        }

        if let Some(alias) = var("CHAIN_ALIAS") {
            config.chain.alias = alias;
        }

        Ok(())
    }
}

fn parse<T: FromStr>(value: &str, name: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvironmentError(format!("Invalid {}: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailurePolicy;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = GeneratorConfig::default();
        EnvLoader::apply_overrides_from(
            &mut config,
            lookup(&[
                ("LOCALNET_IMAGE", "example/node:dev"),
                ("LOCALNET_ARCHIVE_NODES", "2"),
                ("LOCALNET_SUBNET", "10.1.0.0/24"),
                ("LOCALNET_FAILURE_POLICY", "lenient"),
                ("LOCALNET_OVERRIDE", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.image, "example/node:dev");
        assert_eq!(config.archive_nodes, 2);
        assert_eq!(config.network.subnet.to_string(), "10.1.0.0/24");
        assert_eq!(config.failure_policy, FailurePolicy::Lenient);
        assert!(config.allow_override);
    }

    #[test]
    fn test_no_vars_keeps_defaults() {
        let mut config = GeneratorConfig::default();
        EnvLoader::apply_overrides_from(&mut config, lookup(&[])).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_bad_value_is_environment_error() {
        let mut config = GeneratorConfig::default();
        let err = EnvLoader::apply_overrides_from(
            &mut config,
            lookup(&[("LOCALNET_HOST_BASE_PORT", "ninety")]),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::EnvironmentError(_)));
    }
}
