//! Explaining why no binary could be resolved.
//!
//! A [`Diagnosis`] is plain data built after the fallback chain is exhausted.
//! Building it never fails: every probe it runs (other platform packages,
//! the ancestor lockfile) is best-effort. Its `Display` impl is the report
//! printed to stderr.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::candidate::{CandidatePackageName, TOOL_NAME, known_candidates};
use crate::lockfile::{LockfileSnapshot, find_lockfile};
use crate::platform::{Arch, Platform, PlatformArch};
use crate::ports::PackageLocator;
use crate::resolution::{Attempt, AttemptFailure, Stage};

const NPM_OPTIONAL_DEPS_ISSUE: &str = "https://github.com/npm/cli/issues/4828";

/// Why resolution failed, and what to do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    target: PlatformArch,
    finding: Finding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    UnsupportedPlatform,
    UnsupportedArch,
    Missing(MissingBinary),
}

/// Details for a supported target whose package could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBinary {
    pub attempts: Vec<Attempt>,
    /// Packages for other targets that did resolve.
    pub foreign_binaries: Vec<(CandidatePackageName, PathBuf)>,
    pub lockfile: LockfileFinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockfileFinding {
    /// No readable lockfile within the search depth.
    NotFound,
    /// The nearest lockfile belongs to a project that does not depend on the tool.
    WrongLockfile { path: PathBuf },
    /// The lockfile lists every platform package.
    Complete { path: PathBuf },
    /// The lockfile lists the tool but drops some platform packages.
    ///
    /// `remediation` is `None` when no `package.json` covered by the lockfile
    /// declares the tool, so the section to re-add it under is unknown.
    Incomplete {
        path: PathBuf,
        missing: Vec<CandidatePackageName>,
        remediation: Option<String>,
    },
}

impl Diagnosis {
    /// Diagnose an exhausted resolution.
    ///
    /// `search_start` is where the upward lockfile search begins, normally the
    /// launcher's installation root.
    pub fn build(
        target: &PlatformArch,
        attempts: Vec<Attempt>,
        locator: &dyn PackageLocator,
        search_start: &Path,
    ) -> Self {
        let finding = if !target.platform().is_supported() {
            Finding::UnsupportedPlatform
        } else if !target.arch().is_supported() {
            Finding::UnsupportedArch
        } else {
            let foreign_binaries = scan_foreign_binaries(&attempts, locator);
            Finding::Missing(MissingBinary {
                attempts,
                foreign_binaries,
                lockfile: inspect_lockfile(find_lockfile(search_start)),
            })
        };
        Self {
            target: target.clone(),
            finding,
        }
    }

    pub const fn finding(&self) -> &Finding {
        &self.finding
    }

    /// The command that repairs an incomplete lockfile, when that is the problem.
    pub fn remediation(&self) -> Option<&str> {
        match &self.finding {
            Finding::Missing(MissingBinary {
                lockfile: LockfileFinding::Incomplete { remediation, .. },
                ..
            }) => remediation.as_deref(),
            _ => None,
        }
    }
}

/// Resolve every known package that was not already attempted.
fn scan_foreign_binaries(
    attempts: &[Attempt],
    locator: &dyn PackageLocator,
) -> Vec<(CandidatePackageName, PathBuf)> {
    known_candidates()
        .into_iter()
        .filter(|candidate| {
            !attempts
                .iter()
                .any(|attempt| attempt.candidate.as_ref() == Some(candidate))
        })
        .filter_map(|candidate| {
            let found = locator.locate(&candidate).found?;
            Some((candidate, found))
        })
        .collect()
}

fn inspect_lockfile(snapshot: Option<LockfileSnapshot>) -> LockfileFinding {
    let Some(snapshot) = snapshot else {
        return LockfileFinding::NotFound;
    };
    let path = snapshot.path().to_path_buf();

    if !snapshot.contains(TOOL_NAME) {
        return LockfileFinding::WrongLockfile { path };
    }

    let missing: Vec<CandidatePackageName> = known_candidates()
        .into_iter()
        .filter(|candidate| !snapshot.contains(candidate.as_str()))
        .collect();
    if missing.is_empty() {
        return LockfileFinding::Complete { path };
    }

    // Without a flag npm would save under `dependencies`, moving the tool
    let remediation = snapshot.declared_section(TOOL_NAME).map(|section| {
        format!(
            "npm install {TOOL_NAME} --package-lock-only {} && npm install",
            section.save_flag()
        )
    });
    LockfileFinding::Incomplete {
        path,
        missing,
        remediation,
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Override | Stage::Primary => "",
        Stage::JitInstall => " (after on-demand install)",
        Stage::Emulation => " (x64 under emulation)",
    }
}

fn join_supported<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform = self.target.platform();
        let arch = self.target.arch();

        writeln!(f, "{TOOL_NAME} failed to start.")?;
        writeln!(f)?;
        writeln!(f, "Detected platform: {platform}")?;
        writeln!(f, "Detected architecture: {arch}")?;
        writeln!(f)?;

        match &self.finding {
            Finding::UnsupportedPlatform => writeln!(
                f,
                "The \"{platform}\" platform is not supported. {TOOL_NAME} publishes binaries for: {}.",
                join_supported(&Platform::SUPPORTED)
            ),
            Finding::UnsupportedArch => writeln!(
                f,
                "The \"{arch}\" architecture is not supported for this platform. {TOOL_NAME} publishes {platform} binaries for: {}.",
                join_supported(&Arch::SUPPORTED)
            ),
            Finding::Missing(missing) => write!(f, "{missing}"),
        }
    }
}

impl fmt::Display for MissingBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{TOOL_NAME} looked for its native binary here:")?;
        for attempt in &self.attempts {
            match &attempt.candidate {
                Some(candidate) => writeln!(
                    f,
                    "  {candidate}{}: {}",
                    stage_label(attempt.stage),
                    attempt.failure
                )?,
                None if attempt.failure == AttemptFailure::EmulationUnsupported => {
                    writeln!(f, "  x64 emulation: not available on this platform")?;
                }
                None => writeln!(f, "  {}", attempt.failure)?,
            }
            for searched in &attempt.searched {
                writeln!(f, "    - {}", searched.display())?;
            }
        }
        writeln!(f)?;

        if self.foreign_binaries.is_empty() {
            writeln!(
                f,
                "No {TOOL_NAME} binaries were found for any platform. Optional dependencies may \
                 have been skipped during install (for example with --no-optional or \
                 --omit=optional). Reinstall without that flag."
            )?;
        } else {
            writeln!(f, "Found binaries for other platforms:")?;
            for (candidate, path) in &self.foreign_binaries {
                writeln!(f, "  {candidate} at {}", path.display())?;
            }
            writeln!(
                f,
                "This usually means node_modules was installed on one platform and copied to \
                 another, which is common with Docker images. Run the install on the platform \
                 that runs {TOOL_NAME} instead of copying node_modules."
            )?;
        }

        match &self.lockfile {
            LockfileFinding::NotFound | LockfileFinding::Complete { .. } => Ok(()),
            LockfileFinding::WrongLockfile { path } => {
                writeln!(f)?;
                writeln!(
                    f,
                    "The nearest lockfile ({}) does not list {TOOL_NAME}.",
                    path.display()
                )
            }
            LockfileFinding::Incomplete {
                path,
                missing,
                remediation,
            } => {
                writeln!(f)?;
                writeln!(
                    f,
                    "The lockfile at {} is missing entries for: {}.",
                    path.display(),
                    join_supported(missing)
                )?;
                writeln!(
                    f,
                    "This is a known npm bug where the lockfile does not enumerate every \
                     optional platform package ({NPM_OPTIONAL_DEPS_ISSUE}). To fix it, run:"
                )?;
                writeln!(f)?;
                match remediation {
                    Some(remediation) => writeln!(f, "    {remediation}"),
                    None => writeln!(
                        f,
                        "    npm install {TOOL_NAME} --package-lock-only --save-<section> && npm install\n\n\
                         No package.json next to the lockfile or in its workspaces declares \
                         {TOOL_NAME}, so replace --save-<section> with --save-prod, --save-dev \
                         or --save-optional to match where {TOOL_NAME} belongs."
                    ),
                }
            }
        }
    }
}
