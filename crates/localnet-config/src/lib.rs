//! Localnet generator configuration
//!
//! This crate owns the settings that shape a generated local deployment:
//! where the node trees go, which image the services run, the virtual
//! network's subnet, port bases, node defaults and the chain preset. It also
//! provides file and environment loaders and validation.

pub mod config;
pub mod error;
pub mod loader;
pub mod subnet;

// Re-exports for convenience
pub use config::*;
pub use loader::{ConfigLoader, EnvLoader, FileLoader};
pub use subnet::Subnet;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
