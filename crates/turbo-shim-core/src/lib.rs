//! Core of the turbo launcher: which native binary to run, and why none
//! could be found.
//!
//! This crate is pure resolution logic. Filesystem lookups and the package
//! manager are reached through the [`ports`] traits, implemented in
//! `turbo-shim-runtime`.

#![deny(unused_crate_dependencies)]

pub mod candidate;
pub mod diagnostics;
pub mod error;
pub mod lockfile;
pub mod platform;
pub mod ports;
pub mod resolution;

// Re-export commonly used types for convenience
pub use candidate::{CandidatePackageName, TOOL_NAME, known_candidates};
pub use diagnostics::{Diagnosis, Finding, LockfileFinding, MissingBinary};
pub use error::{InstallError, ResolveError, ResolveResult};
pub use lockfile::{DependencySection, LockfileError, LockfileSnapshot, find_lockfile};
pub use platform::{Arch, Platform, PlatformArch};
pub use ports::{Lookup, PackageInstaller, PackageLocator};
pub use resolution::{Attempt, AttemptFailure, Resolution, Resolved, Resolver, Stage};
