//! Launcher configuration, read from the environment exactly once.
//!
//! Everything downstream takes a [`LauncherConfig`] rather than reading the
//! process environment, so tests can build one without touching global state.

use std::ffi::OsString;
use std::path::PathBuf;

/// Absolute path to a turbo binary that replaces resolution entirely.
pub const BINARY_OVERRIDE_VAR: &str = "TURBO_BINARY_PATH";
/// `tracing` filter directives for the launcher's own logs.
pub const LOG_FILTER_VAR: &str = "TURBO_SHIM_LOG";
/// Extra module lookup roots, as understood by node.
pub const NODE_PATH_VAR: &str = "NODE_PATH";

/// Snapshot of the environment inputs the launcher cares about.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfig {
    pub binary_override: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub node_path: Option<OsString>,
    /// The full environment, handed to the installer subprocess.
    pub env: Vec<(OsString, OsString)>,
}

impl LauncherConfig {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    /// Build from explicit `(key, value)` pairs. Empty values count as unset.
    pub fn from_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let env: Vec<(OsString, OsString)> = vars.into_iter().collect();
        let lookup = |name: &str| {
            env.iter()
                .find(|(key, value)| key == name && !value.is_empty())
                .map(|(_, value)| value.clone())
        };

        Self {
            binary_override: lookup(BINARY_OVERRIDE_VAR).map(PathBuf::from),
            log_filter: lookup(LOG_FILTER_VAR).map(|value| value.to_string_lossy().into_owned()),
            node_path: lookup(NODE_PATH_VAR),
            env,
        }
    }
}
