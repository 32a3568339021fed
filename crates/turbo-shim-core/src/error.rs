//! Error types for binary resolution.
//!
//! Only misconfiguration is an error here. Misses along the fallback chain are
//! recorded as [`crate::resolution::AttemptFailure`] values instead, since they
//! are expected outcomes that feed the diagnosis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop resolution before any candidate is tried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// `TURBO_BINARY_PATH` points at nothing.
    #[error(
        "TURBO_BINARY_PATH is set to {path}, but no file exists there.\n\nThis variable is meant for pointing at a locally built turbo during development. Unset it or correct the path."
    )]
    OverrideNotFound { path: PathBuf },
}

/// Errors from installing a platform package on demand.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The package manager could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The package manager ran and reported failure.
    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Result type alias for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
