//! Localnet shared utilities
//!
//! Small helpers shared by the configuration, generator and CLI crates:
//! subscriber setup for `tracing` and the filesystem primitives used when
//! node trees are materialized.

pub mod fs;
pub mod logging;

pub use logging::{init_logging, init_logging_with_level};
