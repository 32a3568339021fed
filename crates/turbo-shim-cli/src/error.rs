//! Errors that end a launch before turbo runs.

use thiserror::Error;
use turbo_shim_core::{Diagnosis, ResolveError};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Override(#[from] ResolveError),

    /// No binary anywhere along the chain. The diagnosis is the message.
    #[error("{0}")]
    Unresolved(Box<Diagnosis>),
}
