//! Ties resolution to execution for one launcher invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;
use turbo_shim_core::{Diagnosis, PlatformArch, Resolution, Resolved, Resolver};
use turbo_shim_runtime::{ExecError, NodeModulesLocator, NpmInstaller, run_binary};

use crate::config::LauncherConfig;
use crate::error::LaunchError;

/// Exit code for any failure to find or start turbo.
pub const LAUNCH_FAILURE_CODE: i32 = 1;

/// The launcher package directory for an executable at `<root>/bin/turbo`.
pub fn launcher_root(exe: &Path) -> Option<PathBuf> {
    exe.parent()?.parent().map(Path::to_path_buf)
}

pub struct Launcher {
    config: LauncherConfig,
    root: PathBuf,
    target: PlatformArch,
}

impl Launcher {
    pub const fn new(config: LauncherConfig, root: PathBuf, target: PlatformArch) -> Self {
        Self {
            config,
            root,
            target,
        }
    }

    /// Run the fallback chain, or explain why it came up empty.
    pub fn locate_binary(&self) -> Result<Resolved, LaunchError> {
        let locator = NodeModulesLocator::new(&self.root)
            .with_node_path(self.config.node_path.as_deref());
        let installer = NpmInstaller::new(&self.root, self.config.env.iter().cloned());

        debug!(platform = %self.target, root = %self.root.display(), "resolving turbo");
        let resolution = Resolver::new(&locator, &installer)
            .with_override(self.config.binary_override.clone())
            .resolve(&self.target)?;

        match resolution {
            Resolution::Found(resolved) => Ok(resolved),
            Resolution::Exhausted { attempts } => Err(LaunchError::Unresolved(Box::new(
                Diagnosis::build(&self.target, attempts, &locator, &self.root),
            ))),
        }
    }

    /// Resolve and run turbo with `args`, returning the code to exit with.
    ///
    /// Resolution failures are reported on stderr and become exit code 1.
    /// Only a binary that was found but could not be started is an `Err`.
    pub fn run(&self, args: Vec<OsString>) -> Result<i32, ExecError> {
        let resolved = match self.locate_binary() {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!(error = %err, "turbo could not be resolved");
                eprintln!("{err}");
                return Ok(LAUNCH_FAILURE_CODE);
            }
        };

        for warning in resolved.warnings() {
            eprintln!("turbo: warning: {warning}");
        }
        debug!(path = %resolved.path.display(), via = ?resolved.via, "executing turbo");
        run_binary(&resolved.path, args)
    }
}
