//! Resolution against real install trees on disk.
//!
//! Each test lays out a throwaway `node_modules` tree the way a package
//! manager would and runs the full fallback chain over it.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use turbo_shim_core::{
    CandidatePackageName, Diagnosis, InstallError, PackageInstaller, PlatformArch, Resolution,
    Resolver, Stage,
};
use turbo_shim_runtime::NodeModulesLocator;

/// A project with the launcher installed at `<project>/node_modules/turbo`.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(project.launcher_root()).unwrap();
        project
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn launcher_root(&self) -> PathBuf {
        self.path().join("node_modules").join("turbo")
    }

    fn install(&self, package: &str) -> PathBuf {
        install_into(&self.path().join("node_modules"), package)
    }
}

fn install_into(modules: &Path, package: &str) -> PathBuf {
    let binary = modules.join(package).join("bin").join("turbo");
    fs::create_dir_all(binary.parent().unwrap()).unwrap();
    fs::write(&binary, b"").unwrap();
    binary.canonicalize().unwrap()
}

/// Installer that writes the package into a `node_modules` directory and
/// counts how often it was asked to.
struct FakeInstaller {
    modules: Option<PathBuf>,
    calls: Cell<usize>,
}

impl FakeInstaller {
    fn succeeding(modules: PathBuf) -> Self {
        Self {
            modules: Some(modules),
            calls: Cell::new(0),
        }
    }

    fn offline() -> Self {
        Self {
            modules: None,
            calls: Cell::new(0),
        }
    }
}

impl PackageInstaller for FakeInstaller {
    fn install(&self, candidate: &CandidatePackageName) -> Result<(), InstallError> {
        self.calls.set(self.calls.get() + 1);
        match &self.modules {
            Some(modules) => {
                install_into(modules, candidate.as_str());
                Ok(())
            }
            None => Err(InstallError::Failed {
                command: format!("npm install {candidate}"),
                status: "exit status: 1".into(),
                stderr: "npm ERR! network request failed".into(),
            }),
        }
    }
}

fn linux_x64() -> PlatformArch {
    PlatformArch::from_runtime_ids("linux", "x64")
}

#[test]
fn test_hoisted_monorepo_install_resolves_without_installing() {
    let project = Project::new();
    let binary = project.install("turbo-linux-64");

    // Launcher nested inside a workspace package, platform package hoisted to the root
    let workspace_root = project.path().join("apps").join("web").join("node_modules").join("turbo");
    fs::create_dir_all(&workspace_root).unwrap();

    let locator = NodeModulesLocator::new(&workspace_root);
    let installer = FakeInstaller::offline();
    let resolution = Resolver::new(&locator, &installer)
        .resolve(&linux_x64())
        .unwrap();

    let Resolution::Found(resolved) = resolution else {
        panic!("hoisted package should resolve");
    };
    assert_eq!(resolved.path, binary);
    assert_eq!(resolved.via, Stage::Primary);
    assert_eq!(installer.calls.get(), 0);
}

#[test]
fn test_pruned_optional_dependency_is_installed_next_to_launcher() {
    let project = Project::new();
    let nested_modules = project.launcher_root().join("node_modules");

    let locator = NodeModulesLocator::new(project.launcher_root());
    let installer = FakeInstaller::succeeding(nested_modules.clone());
    let resolution = Resolver::new(&locator, &installer)
        .resolve(&linux_x64())
        .unwrap();

    let Resolution::Found(resolved) = resolution else {
        panic!("installed package should resolve");
    };
    assert_eq!(resolved.via, Stage::JitInstall);
    assert!(resolved.path.starts_with(nested_modules.canonicalize().unwrap()));
    assert_eq!(installer.calls.get(), 1);
}

#[test]
fn test_docker_copy_from_macos_is_diagnosed() {
    let project = Project::new();
    project.install("turbo-darwin-arm64");
    fs::write(
        project.path().join("package-lock.json"),
        r#"{
            "lockfileVersion": 3,
            "packages": {
                "": { "devDependencies": { "turbo": "^2.3.1" } },
                "node_modules/turbo": { "version": "2.3.1" },
                "node_modules/turbo-darwin-arm64": { "version": "2.3.1", "optional": true }
            }
        }"#,
    )
    .unwrap();

    let locator = NodeModulesLocator::new(project.launcher_root());
    let installer = FakeInstaller::offline();
    let resolution = Resolver::new(&locator, &installer)
        .resolve(&linux_x64())
        .unwrap();
    let Resolution::Exhausted { attempts } = resolution else {
        panic!("no linux binary is present");
    };
    assert_eq!(installer.calls.get(), 1);

    let diagnosis = Diagnosis::build(&linux_x64(), attempts, &locator, &project.launcher_root());
    let report = diagnosis.to_string();
    assert!(report.contains("Detected platform: linux"));
    assert!(report.contains("turbo-linux-64: not found"));
    assert!(report.contains("turbo-linux-64 (after on-demand install): install failed"));
    assert!(report.contains("turbo-darwin-arm64 at"));
    assert!(report.contains("Docker"));
    assert_eq!(
        diagnosis.remediation(),
        Some("npm install turbo --package-lock-only --save-dev && npm install")
    );
}

#[test]
fn test_rosetta_fallback_on_apple_silicon() {
    let project = Project::new();
    let x64 = project.install("turbo-darwin-64");

    let locator = NodeModulesLocator::new(project.launcher_root());
    let installer = FakeInstaller::offline();
    let resolution = Resolver::new(&locator, &installer)
        .resolve(&PlatformArch::from_runtime_ids("darwin", "arm64"))
        .unwrap();

    let Resolution::Found(resolved) = resolution else {
        panic!("x64 build should run under emulation");
    };
    assert_eq!(resolved.path, x64);
    assert_eq!(resolved.via, Stage::Emulation);
    assert!(resolved.warnings().iter().any(|w| w.contains("emulation")));
}

#[test]
fn test_repeated_resolution_is_stable() {
    let project = Project::new();
    project.install("turbo-linux-64");

    let locator = NodeModulesLocator::new(project.launcher_root());
    let installer = FakeInstaller::offline();
    let resolver = Resolver::new(&locator, &installer);

    assert_eq!(resolver.resolve(&linux_x64()), resolver.resolve(&linux_x64()));
}
