use crate::{ConfigError, ConfigResult, GeneratorConfig};
use std::fs;
use std::path::Path;

/// File-based configuration loader
pub struct FileLoader;

impl FileLoader {
    /// Load and validate configuration from a TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let config = Self::read_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let config = Self::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format, load and validate configuration
    pub fn load_auto<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let config = Self::read_auto(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it.
    ///
    /// Used when further layers are applied before validation.
    pub fn read_toml<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse a JSON file without validating it.
    pub fn read_json<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Parse a TOML or JSON file, picked by extension, without validating it.
    pub fn read_auto<P: AsRef<Path>>(path: P) -> ConfigResult<GeneratorConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::read_toml(path),
            Some("json") => Self::read_json(path),
            Some(ext) => Err(ConfigError::InvalidFormat(format!(
                "Unsupported file extension: {}",
                ext
            ))),
            None => match Self::read_toml(path) {
                Ok(config) => Ok(config),
                Err(_) => Self::read_json(path),
            },
        }
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(config: &GeneratorConfig, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_json<P: AsRef<Path>>(config: &GeneratorConfig, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Save in the format implied by the extension; TOML when there is none
    pub fn save_auto<P: AsRef<Path>>(config: &GeneratorConfig, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::save_json(config, path),
            Some("toml") | None => Self::save_toml(config, path),
            Some(ext) => Err(ConfigError::InvalidFormat(format!(
                "Unsupported file extension: {}",
                ext
            ))),
        }
    }
}
