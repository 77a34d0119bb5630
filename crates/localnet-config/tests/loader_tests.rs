use localnet_config::{ConfigError, ConfigLoader, FailurePolicy, FileLoader, GeneratorConfig};
use std::fs;
use tempfile::tempdir;

/// A partial TOML file only overrides what it names
#[test]
fn test_load_partial_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("localnet.toml");

    let config_content = r#"
output_dir = "./out"
image = "example/node:latest"
archive_nodes = 2
failure_policy = "lenient"

[network]
subnet = "10.0.9.0/24"

[ports]
host_base = 19650
"#;
    fs::write(&config_path, config_content).unwrap();

    let config = FileLoader::load_auto(&config_path).unwrap();

    assert_eq!(config.output_dir.to_str(), Some("./out"));
    assert_eq!(config.image, "example/node:latest");
    assert_eq!(config.archive_nodes, 2);
    assert_eq!(config.failure_policy, FailurePolicy::Lenient);
    assert_eq!(config.network.subnet.to_string(), "10.0.9.0/24");
    assert_eq!(config.network.name, "camino-local");
    assert_eq!(config.ports.host_base, 19650);
    assert_eq!(config.ports.staking_port, 9651);
    assert_eq!(config.node.network_id, 54321);
}

/// Saving and loading through both formats preserves the configuration
#[test]
fn test_save_and_reload() {
    let temp_dir = tempdir().unwrap();
    let mut config = GeneratorConfig::default();
    config.archive_nodes = 3;
    config.chain.alias = "X".to_string();

    for name in ["config.toml", "config.json"] {
        let path = temp_dir.path().join(name);
        FileLoader::save_auto(&config, &path).unwrap();
        let loaded = FileLoader::load_auto(&path).unwrap();
        assert_eq!(loaded, config, "mismatch for {}", name);
    }
}

#[test]
fn test_missing_file() {
    let temp_dir = tempdir().unwrap();
    let err = FileLoader::load_auto(temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.ini");
    fs::write(&path, "image = x").unwrap();

    let err = FileLoader::load_auto(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidFormat(_)));
}

/// Files that parse but fail validation are rejected at load time
#[test]
fn test_invalid_file_rejected() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[ports]\nhttp_port = 9651\nstaking_port = 9651\n").unwrap();

    let err = FileLoader::load_auto(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed(_)));
}

#[test]
fn test_bad_subnet_in_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[network]\nsubnet = \"10.0.7.1/24\"\n").unwrap();

    assert!(FileLoader::load_auto(&path).is_err());
}

#[test]
fn test_loader_without_file_uses_defaults() {
    let config = ConfigLoader::new().load(None::<&str>).unwrap();
    assert!(config.validate().is_ok());
}

/// Overrides are applied before validation, so a file that is only valid
/// with them still loads
#[test]
fn test_env_override_completes_invalid_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("localnet.toml");
    fs::write(&path, "archive_nodes = 300\n").unwrap();

    assert!(FileLoader::load_auto(&path).is_err());

    let lookup = |key: &str| (key == "LOCALNET_SUBNET").then(|| "10.1.0.0/16".to_string());
    let config = ConfigLoader::new().layers_from(Some(&path), lookup).unwrap();

    assert_eq!(config.archive_nodes, 300);
    assert_eq!(config.network.subnet.to_string(), "10.1.0.0/16");
    assert!(config.validate().is_ok());
}

/// Layering alone never validates; the caller does once every layer is in
#[test]
fn test_layers_do_not_validate() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("localnet.json");
    fs::write(&path, r#"{ "archive_nodes": 300 }"#).unwrap();

    let config = ConfigLoader::new().layers_from(Some(&path), |_| None).unwrap();

    assert_eq!(config.archive_nodes, 300);
    assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
}
