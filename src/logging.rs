//! Subscriber setup for the binary. Library code only emits `tracing` events.

use anyhow::{Result, anyhow};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt};

/// Build the filter: `RUST_LOG` verbatim when set, otherwise `repcycle` at
/// info (debug when `verbose`) with HTTP and pool internals at warn.
pub fn filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directive) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::new(directive);
    }

    let level = if verbose { "debug" } else { "info" };
    ["hyper=warn", "reqwest=warn", "sqlx=warn"]
        .into_iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(EnvFilter::new(format!("repcycle={level}")), EnvFilter::add_directive)
}

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays clean.
pub fn init(verbose: bool) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    fmt()
        .with_env_filter(filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
