//! Port definitions for the filesystem and package-manager collaborators.
//!
//! The resolution chain and the diagnostics only see these traits. Concrete
//! implementations (node-style module lookup, `npm` subprocess) live in
//! `turbo-shim-runtime`.

use std::path::PathBuf;

use crate::candidate::CandidatePackageName;
use crate::error::InstallError;

/// Result of looking a candidate up on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    /// Absolute path of the binary, if one was found.
    pub found: Option<PathBuf>,
    /// Every location that was checked, in order.
    pub searched: Vec<PathBuf>,
}

impl Lookup {
    pub const fn is_found(&self) -> bool {
        self.found.is_some()
    }
}

/// Finds a candidate package's binary using module-resolution rules.
#[cfg_attr(test, mockall::automock)]
pub trait PackageLocator {
    fn locate(&self, candidate: &CandidatePackageName) -> Lookup;
}

/// Installs a missing platform package next to the launcher.
///
/// Implementations block until the install has finished.
#[cfg_attr(test, mockall::automock)]
pub trait PackageInstaller {
    fn install(&self, candidate: &CandidatePackageName) -> Result<(), InstallError>;
}
