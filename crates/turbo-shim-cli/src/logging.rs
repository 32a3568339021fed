//! Logging setup for the launcher.

use tracing_subscriber::EnvFilter;

use crate::config::LauncherConfig;

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// Logs go to stderr so turbo's own stdout stays clean for piping. An
/// invalid `TURBO_SHIM_LOG` falls back to the default filter.
pub fn init(config: &LauncherConfig) {
    let env_filter = config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok(); // Ignore error if already initialized
}
