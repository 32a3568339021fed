//! Error types for the runtime adapters.

use std::path::PathBuf;
use thiserror::Error;

/// The resolved binary could not be started.
///
/// Distinct from the binary exiting non-zero, which is simply forwarded.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The launcher's own `package.json` could not be used.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
