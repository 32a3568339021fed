//! OS-level adapters for the turbo launcher: finding packages on disk,
//! installing them with npm, and running the resolved binary.

#![deny(unsafe_code)]

pub mod error;
pub mod exec;
pub mod manifest;
pub mod node_modules;
pub mod npm;

pub use error::{ExecError, ManifestError};
pub use exec::{exit_code, run_binary};
pub use manifest::LauncherManifest;
pub use node_modules::NodeModulesLocator;
pub use npm::{GLOBAL_INSTALL_VAR, NpmInstaller, install_environment};
