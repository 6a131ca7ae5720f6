//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing` so they never mix with command
//! output. Filter priority (highest to lowest):
//! 1. `SOLVEBIO_LOG` environment variable
//! 2. `--verbose` (debug) or `--log-level`
//! 3. `warn`

use crate::config::LOG_ENV_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive from the environment or the CLI.
pub fn filter_directive(env_value: Option<String>, verbose: bool, level: Option<&str>) -> String {
    if let Some(directive) = env_value.filter(|v| !v.trim().is_empty()) {
        return directive;
    }
    if verbose {
        return "debug".to_string();
    }
    level.unwrap_or(DEFAULT_LEVEL).to_string()
}

/// Install the global subscriber. Safe to call once per process; later calls
/// are ignored.
pub fn init(verbose: bool, level: Option<&str>) {
    let directive = filter_directive(std::env::var(LOG_ENV_VAR).ok(), verbose, level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
