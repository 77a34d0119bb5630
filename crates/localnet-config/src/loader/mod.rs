//! Configuration loading and environment handling

pub mod env;
pub mod file;

pub use env::EnvLoader;
pub use file::FileLoader;

use crate::{ConfigResult, GeneratorConfig};
use std::path::Path;
use tracing::debug;

/// Main configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load with precedence: env vars > config file > defaults, then validate.
    pub fn load<P: AsRef<Path>>(&self, config_path: Option<P>) -> ConfigResult<GeneratorConfig> {
        let config = self.layers(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// File (or defaults) with `LOCALNET_*` overrides applied, not yet
    /// validated.
    ///
    /// Callers that add their own layer on top (command-line flags) validate
    /// once after it.
    pub fn layers<P: AsRef<Path>>(&self, config_path: Option<P>) -> ConfigResult<GeneratorConfig> {
        self.layers_from(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`ConfigLoader::layers`], resolving variables through `lookup`.
    pub fn layers_from<P, F>(
        &self,
        config_path: Option<P>,
        lookup: F,
    ) -> ConfigResult<GeneratorConfig>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => {
                debug!(path = %path.as_ref().display(), "loading generator config");
                FileLoader::read_auto(path)?
            }
            None => GeneratorConfig::default(),
        };

        EnvLoader::apply_overrides_from(&mut config, lookup)?;
        Ok(config)
    }
}
