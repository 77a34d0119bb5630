//! Configuration structures and types
pub mod chain;
pub mod generator;
pub mod node;

// Re-export main config types
pub use chain::ChainSettings;
pub use generator::{FailurePolicy, GeneratorConfig, VirtualNetworkSettings};
pub use node::{NodeSettings, PortSettings};
