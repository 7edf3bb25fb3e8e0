//! Subscriber setup for binaries and tests
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `default_directive` (for example `"info"` or
/// `"topic_grid=debug"`). Returns `false` if a global subscriber was already
/// installed, which makes repeated calls harmless.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init("warn");
        assert!(!init("debug"));
    }
}
