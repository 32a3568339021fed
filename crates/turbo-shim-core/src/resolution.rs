//! The ordered fallback chain that turns a [`PlatformArch`] into a binary path.
//!
//! Order: explicit override, primary candidate, on-demand install of the
//! primary candidate, x64 emulation candidate. The first stage that yields a
//! path wins. Every miss is recorded as an [`Attempt`] so the diagnostics can
//! explain exactly what was tried.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::candidate::CandidatePackageName;
use crate::error::{ResolveError, ResolveResult};
use crate::platform::{Arch, PlatformArch};
use crate::ports::{PackageInstaller, PackageLocator};

/// A step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `TURBO_BINARY_PATH` was set and used verbatim.
    Override,
    /// The package matching the host platform.
    Primary,
    /// The primary package after installing it on demand.
    JitInstall,
    /// The x64 package, run under the OS emulation layer.
    Emulation,
}

/// Why a stage did not produce a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    UnsupportedPlatform,
    UnsupportedArch,
    /// Package absent, not hoisted, or pruned as an optional dependency.
    NotFound,
    /// The package manager failed; carries its error message.
    InstallFailed(String),
    /// The install reported success but the binary still did not resolve.
    StillMissingAfterInstall,
    /// The host has no emulation layer for x64 binaries.
    EmulationUnsupported,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPlatform => f.write_str("platform not supported"),
            Self::UnsupportedArch => f.write_str("architecture not supported"),
            Self::NotFound => f.write_str("not found"),
            Self::InstallFailed(reason) => write!(f, "install failed ({reason})"),
            Self::StillMissingAfterInstall => f.write_str("still not found after install"),
            Self::EmulationUnsupported => f.write_str("emulation not available"),
        }
    }
}

/// One failed stage of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub stage: Stage,
    pub candidate: Option<CandidatePackageName>,
    pub searched: Vec<PathBuf>,
    pub failure: AttemptFailure,
}

/// A successfully resolved binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub via: Stage,
    /// Stages that failed before `via` succeeded.
    pub attempts: Vec<Attempt>,
}

impl Resolved {
    /// Warnings the user should see even though resolution succeeded.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .attempts
            .iter()
            .filter_map(|attempt| match (&attempt.failure, &attempt.candidate) {
                (AttemptFailure::InstallFailed(reason), Some(candidate)) => Some(format!(
                    "failed to install {candidate} on demand: {reason}"
                )),
                _ => None,
            })
            .collect();

        if self.via == Stage::Emulation {
            warnings.push(format!(
                "no native binary found, running the x64 build at {} under emulation. \
                 Performance will be degraded; install the arm64 package to fix this.",
                self.path.display()
            ));
        }
        warnings
    }
}

/// Outcome of running the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Resolved),
    /// Every stage missed; the attempts feed the diagnosis.
    Exhausted { attempts: Vec<Attempt> },
}

enum Step {
    Found(PathBuf),
    Failed(Attempt),
    Skipped,
}

/// Runs the fallback chain against a locator and an installer.
pub struct Resolver<'a> {
    locator: &'a dyn PackageLocator,
    installer: &'a dyn PackageInstaller,
    binary_override: Option<PathBuf>,
}

impl<'a> Resolver<'a> {
    pub fn new(locator: &'a dyn PackageLocator, installer: &'a dyn PackageInstaller) -> Self {
        Self {
            locator,
            installer,
            binary_override: None,
        }
    }

    /// Use this path verbatim instead of searching, after an existence check.
    #[must_use]
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.binary_override = path;
        self
    }

    /// Resolve the binary for `target`.
    ///
    /// Returns `Err` only for a misconfigured override. A total miss is
    /// `Ok(Resolution::Exhausted)`.
    pub fn resolve(&self, target: &PlatformArch) -> ResolveResult<Resolution> {
        if let Some(path) = &self.binary_override {
            if !path.exists() {
                return Err(ResolveError::OverrideNotFound { path: path.clone() });
            }
            debug!(path = %path.display(), "using TURBO_BINARY_PATH override");
            return Ok(Resolution::Found(Resolved {
                path: path.clone(),
                via: Stage::Override,
                attempts: Vec::new(),
            }));
        }

        // Tried in order when no override is configured
        let chain: [(Stage, fn(&Self, &PlatformArch) -> Step); 3] = [
            (Stage::Primary, Self::primary),
            (Stage::JitInstall, Self::jit_install),
            (Stage::Emulation, Self::emulation),
        ];

        let mut attempts = Vec::new();
        for (stage, run) in chain {
            match run(self, target) {
                Step::Found(path) => {
                    debug!(?stage, path = %path.display(), "resolved turbo binary");
                    return Ok(Resolution::Found(Resolved {
                        path,
                        via: stage,
                        attempts,
                    }));
                }
                Step::Failed(attempt) => {
                    debug!(?stage, failure = %attempt.failure, "resolution stage missed");
                    attempts.push(attempt);
                }
                Step::Skipped => {}
            }
        }
        Ok(Resolution::Exhausted { attempts })
    }

    fn primary(&self, target: &PlatformArch) -> Step {
        let Some(candidate) = target.candidate() else {
            let failure = if target.platform().is_supported() {
                AttemptFailure::UnsupportedArch
            } else {
                AttemptFailure::UnsupportedPlatform
            };
            return Step::Failed(Attempt {
                stage: Stage::Primary,
                candidate: None,
                searched: Vec::new(),
                failure,
            });
        };
        self.lookup(Stage::Primary, candidate, AttemptFailure::NotFound)
    }

    fn jit_install(&self, target: &PlatformArch) -> Step {
        let Some(candidate) = target.candidate() else {
            return Step::Skipped;
        };

        debug!(package = %candidate, "installing missing platform package");
        if let Err(err) = self.installer.install(&candidate) {
            return Step::Failed(Attempt {
                stage: Stage::JitInstall,
                candidate: Some(candidate),
                searched: Vec::new(),
                failure: AttemptFailure::InstallFailed(err.to_string()),
            });
        }
        self.lookup(
            Stage::JitInstall,
            candidate,
            AttemptFailure::StillMissingAfterInstall,
        )
    }

    fn emulation(&self, target: &PlatformArch) -> Step {
        if !target.platform().is_supported() || target.arch() != &Arch::Arm64 {
            return Step::Skipped;
        }
        let Some(alternate) = target.emulation_alternate() else {
            return Step::Failed(Attempt {
                stage: Stage::Emulation,
                candidate: None,
                searched: Vec::new(),
                failure: AttemptFailure::EmulationUnsupported,
            });
        };
        self.lookup(Stage::Emulation, alternate, AttemptFailure::NotFound)
    }

    fn lookup(&self, stage: Stage, candidate: CandidatePackageName, miss: AttemptFailure) -> Step {
        let lookup = self.locator.locate(&candidate);
        match lookup.found {
            Some(path) => Step::Found(path),
            None => Step::Failed(Attempt {
                stage,
                candidate: Some(candidate),
                searched: lookup.searched,
                failure: miss,
            }),
        }
    }
}
