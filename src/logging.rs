//! Diagnostic logging setup for the `pwvault` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is
//! the binary's job.  Events go to stderr so they never mix with command
//! output, and never carry secrets.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `pwvault=debug`).
pub const LOG_ENV: &str = "PWVAULT_LOG";

/// Install the global subscriber.  Defaults to `warn` when `PWVAULT_LOG`
/// is unset or invalid.  Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
