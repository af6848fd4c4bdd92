//! Logging setup
//!
//! `tracing` events go to stderr through a `tracing-subscriber` fmt layer so
//! stdout only ever carries the result message or JSON envelope. `RUST_LOG`
//! wins over the verbosity flag when set.

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "aedemo=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "aedemo=debug");
        assert!(default_directive(true).parse::<EnvFilter>().is_ok());
    }
}
