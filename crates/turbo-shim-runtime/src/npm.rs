//! On-demand install of a missing platform package with `npm`.
//!
//! The install runs with the launcher's installation root as working
//! directory so the package lands next to the launcher, never globally.
//! When the launcher itself was started from `npm install -g`, npm exports
//! `npm_config_global=true` into the environment; a nested install that
//! inherited it would go global and block on the outer install's lock. The
//! child therefore gets a copy of the environment with that key removed.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};
use turbo_shim_core::{CandidatePackageName, InstallError, PackageInstaller};

use crate::manifest::LauncherManifest;

/// Environment key that turns `npm install` into a global install.
pub const GLOBAL_INSTALL_VAR: &str = "npm_config_global";

/// Flags that keep the nested install quiet and fast.
const QUIET_FLAGS: [&str; 4] = [
    "--loglevel=error",
    "--prefer-offline",
    "--no-audit",
    "--progress=false",
];

/// Installs platform packages by shelling out to `npm install`.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    root: PathBuf,
    /// Found on `PATH` at install time when not set explicitly.
    program: Option<OsString>,
    manifest: Option<LauncherManifest>,
    env: Vec<(OsString, OsString)>,
}

impl NpmInstaller {
    /// Create an installer scoped to `root` with the parent's environment `env`.
    pub fn new(root: impl Into<PathBuf>, env: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self {
            root: root.into(),
            program: None,
            manifest: None,
            env: install_environment(env),
        }
    }

    /// Pin installs to the versions declared by the launcher package.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Option<LauncherManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Use a specific package-manager executable instead of `npm` from `PATH`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// `turbo-linux-64@2.3.1`, or the bare name without a manifest.
    ///
    /// Without an explicit manifest, the launcher's `package.json` is read
    /// from the installation root at this point and not before.
    pub fn package_spec(&self, candidate: &CandidatePackageName) -> String {
        let loaded;
        let manifest = match &self.manifest {
            Some(manifest) => Some(manifest),
            None => {
                loaded = LauncherManifest::load(&self.root)
                    .inspect_err(|err| debug!(error = %err, "installing without a version pin"))
                    .ok();
                loaded.as_ref()
            }
        };
        match manifest {
            Some(manifest) => format!("{candidate}@{}", manifest.pinned_version(candidate)),
            None => candidate.to_string(),
        }
    }

    /// The fully configured install command for `candidate`.
    pub fn command(&self, candidate: &CandidatePackageName) -> Command {
        self.command_for_spec(&self.program(), &self.package_spec(candidate))
    }

    fn program(&self) -> OsString {
        self.program.clone().unwrap_or_else(default_program)
    }

    fn command_for_spec(&self, program: &OsStr, spec: &str) -> Command {
        let mut command = Command::new(program);
        command
            .arg("install")
            .args(QUIET_FLAGS)
            .arg(spec)
            .current_dir(&self.root)
            .env_clear()
            .envs(self.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null());
        command
    }

    fn display_command(program: &OsStr, spec: &str) -> String {
        format!(
            "{} install {} {spec}",
            program.to_string_lossy(),
            QUIET_FLAGS.join(" "),
        )
    }
}

impl PackageInstaller for NpmInstaller {
    fn install(&self, candidate: &CandidatePackageName) -> Result<(), InstallError> {
        let program = self.program();
        let spec = self.package_spec(candidate);
        info!(package = %spec, cwd = %self.root.display(), "installing platform package");
        let output = self
            .command_for_spec(&program, &spec)
            .output()
            .map_err(|source| InstallError::Spawn {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        if output.status.success() {
            debug!(package = %candidate, "install finished");
            Ok(())
        } else {
            Err(InstallError::Failed {
                command: Self::display_command(&program, &spec),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Copy of `env` without the global-install marker.
///
/// Matched case-insensitively since Windows environment keys are.
pub fn install_environment(
    env: impl IntoIterator<Item = (OsString, OsString)>,
) -> Vec<(OsString, OsString)> {
    env.into_iter()
        .filter(|(key, _)| !is_global_install_key(key))
        .collect()
}

fn is_global_install_key(key: &OsStr) -> bool {
    key.to_str()
        .is_some_and(|key| key.eq_ignore_ascii_case(GLOBAL_INSTALL_VAR))
}

/// `npm` as found on `PATH`. On Windows that is `npm.cmd`, which
/// `Command::new("npm")` would not find on its own.
fn default_program() -> OsString {
    which::which("npm").map_or_else(|_| OsString::from("npm"), PathBuf::into_os_string)
}
