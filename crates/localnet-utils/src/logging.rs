// localnet-utils/src/logging.rs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize logging with default configuration
pub fn init_logging() {
    init_logging_with_level(DEFAULT_LEVEL);
}

/// Initialize logging with a custom level.
///
/// `RUST_LOG` wins over `level` when it is set and parses. Installing a
/// second global subscriber is a no-op, so calling this more than once (for
/// example from several tests) is harmless.
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_logging_with_level("debug");
        init_logging();
        tracing::info!("logging initialised twice");
    }
}
