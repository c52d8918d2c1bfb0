//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for command output.
//! `RUST_LOG` wins over the verbosity flags when set.

use anyhow::{Result, anyhow};
use std::io;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `verbose` raises the level (1 = debug, 2+ = trace); `quiet` limits output
/// to errors. `json` switches to one JSON object per event.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "migration_parity=debug,info",
            _ => "migration_parity=trace,debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(io::stderr);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|err| anyhow!("failed to install JSON subscriber: {err}"))
    } else {
        builder
            .try_init()
            .map_err(|err| anyhow!("failed to install subscriber: {err}"))
    }
}

/// Subscriber for tests: captured by the test harness, tolerant of
/// repeated installation.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
