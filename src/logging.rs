//! Tracing setup for the `chfs` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job so tests and embedding callers stay quiet.

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "chfs_debt=info";

/// Install a stderr subscriber. `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("chfs_debt=debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    // A second init (e.g. from an embedding host) is not an error for us.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
