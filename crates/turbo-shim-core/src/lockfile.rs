//! Best-effort reading of `package-lock.json` for failure diagnostics.
//!
//! Nothing here is needed for a successful launch. A missing, unreadable or
//! malformed lockfile is a normal outcome and yields `None`.
//!
//! Two schema generations are understood:
//! - `lockfileVersion` 1: a nested `dependencies` mapping keyed by package name
//! - `lockfileVersion` 2 and 3: a flat `packages` mapping keyed by install path
//!   (`node_modules/turbo`), with the root project under the empty key

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// How many directories above the start directory are searched.
pub const MAX_SEARCH_DEPTH: usize = 10;

/// Checked in this order per directory; npm prefers a shrinkwrap when both exist.
const LOCKFILE_NAMES: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];
const MANIFEST_NAME: &str = "package.json";

/// Errors reading a single lockfile. Callers searching for a lockfile
/// swallow these and move on.
#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Section of `package.json` a dependency was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySection {
    Prod,
    Dev,
    Optional,
}

impl DependencySection {
    /// `npm install` flag that writes to this section.
    pub const fn save_flag(self) -> &'static str {
        match self {
            Self::Prod => "--save-prod",
            Self::Dev => "--save-dev",
            Self::Optional => "--save-optional",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLockfile {
    packages: Option<BTreeMap<String, RawEntry>>,
    dependencies: Option<BTreeMap<String, RawEntry>>,
}

/// Shared shape of `packages` entries, v1 `dependencies` entries and `package.json`.
///
/// `dependencies` is a name-to-version map in `package.json` and `packages[""]`
/// but a name-to-entry map inside v1 `dependencies`, so it stays untyped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    dependencies: Option<BTreeMap<String, Value>>,
    dev_dependencies: Option<BTreeMap<String, Value>>,
    optional_dependencies: Option<BTreeMap<String, Value>>,
}

impl RawEntry {
    fn declared_section(&self, name: &str) -> Option<DependencySection> {
        let declares = |section: &Option<BTreeMap<String, Value>>| {
            section.as_ref().is_some_and(|deps| deps.contains_key(name))
        };
        if declares(&self.dependencies) {
            Some(DependencySection::Prod)
        } else if declares(&self.dev_dependencies) {
            Some(DependencySection::Dev)
        } else if declares(&self.optional_dependencies) {
            Some(DependencySection::Optional)
        } else {
            None
        }
    }
}

/// A parsed lockfile: which packages it enumerates, and how the root project
/// and its workspaces declare their direct dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockfileSnapshot {
    path: PathBuf,
    packages: BTreeSet<String>,
    root_sections: BTreeMap<String, DependencySection>,
    /// Merged over every workspace entry, first declaration wins.
    workspace_sections: BTreeMap<String, DependencySection>,
}

impl LockfileSnapshot {
    /// Read and parse the lockfile at `path`.
    pub fn load(path: &Path) -> Result<Self, LockfileError> {
        let contents = fs::read_to_string(path).map_err(|source| LockfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut snapshot = Self::parse(path, &contents)?;

        // v1 lockfiles carry no root entry, and a stale root entry may lack
        // names the sibling package.json declares
        if let Some(manifest) = path.parent().and_then(read_manifest) {
            for (name, section) in declared_sections(&manifest) {
                snapshot.root_sections.entry(name).or_insert(section);
            }
        }
        Ok(snapshot)
    }

    /// Parse lockfile contents. `path` is only recorded for reporting.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, LockfileError> {
        let raw: RawLockfile =
            serde_json::from_str(contents).map_err(|source| LockfileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut packages = BTreeSet::new();
        let mut root_sections = BTreeMap::new();
        let mut workspace_sections = BTreeMap::new();

        if let Some(entries) = &raw.packages {
            for (key, entry) in entries {
                if key.is_empty() {
                    root_sections = declared_sections(entry);
                } else if let Some(name) = package_name_from_install_path(key) {
                    packages.insert(name.to_string());
                } else {
                    // `apps/web`: a workspace's own package.json
                    for (name, section) in declared_sections(entry) {
                        workspace_sections.entry(name).or_insert(section);
                    }
                }
            }
        }
        if let Some(entries) = &raw.dependencies {
            collect_v1_dependencies(entries, &mut packages);
        }

        Ok(Self {
            path: path.to_path_buf(),
            packages,
            root_sections,
            workspace_sections,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the lockfile enumerates `name` anywhere in the tree.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    /// Section `name` is declared under: by the root project if it declares
    /// it, otherwise by the first workspace that does.
    pub fn declared_section(&self, name: &str) -> Option<DependencySection> {
        self.root_sections
            .get(name)
            .or_else(|| self.workspace_sections.get(name))
            .copied()
    }
}

/// Search `start` and its ancestors for a lockfile.
///
/// Directories whose lockfile cannot be read or parsed are skipped. The first
/// lockfile that parses is returned whether or not it mentions the tool;
/// deciding that it is the wrong one is the caller's job.
pub fn find_lockfile(start: &Path) -> Option<LockfileSnapshot> {
    start
        .ancestors()
        .take(MAX_SEARCH_DEPTH + 1)
        .flat_map(|dir| LOCKFILE_NAMES.map(|name| dir.join(name)))
        .filter(|candidate| candidate.is_file())
        .find_map(|candidate| match LockfileSnapshot::load(&candidate) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                debug!(error = %err, "skipping unusable lockfile");
                None
            }
        })
}

/// `node_modules/a/node_modules/@scope/b` -> `@scope/b`
fn package_name_from_install_path(key: &str) -> Option<&str> {
    key.rsplit_once("node_modules/")
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
}

fn collect_v1_dependencies(entries: &BTreeMap<String, RawEntry>, packages: &mut BTreeSet<String>) {
    for (name, entry) in entries {
        packages.insert(name.clone());
        if let Some(nested) = &entry.dependencies {
            let nested: BTreeMap<String, RawEntry> = nested
                .iter()
                .filter_map(|(name, value)| {
                    RawEntry::deserialize(value)
                        .ok()
                        .map(|entry| (name.clone(), entry))
                })
                .collect();
            collect_v1_dependencies(&nested, packages);
        }
    }
}

fn declared_sections(root: &RawEntry) -> BTreeMap<String, DependencySection> {
    let names: BTreeSet<&String> = [
        &root.dependencies,
        &root.dev_dependencies,
        &root.optional_dependencies,
    ]
    .into_iter()
    .flatten()
    .flat_map(BTreeMap::keys)
    .collect();

    names
        .into_iter()
        .filter_map(|name| {
            root.declared_section(name)
                .map(|section| (name.clone(), section))
        })
        .collect()
}

fn read_manifest(dir: &Path) -> Option<RawEntry> {
    let contents = fs::read_to_string(dir.join(MANIFEST_NAME)).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PACKAGE_LOCK: &str = "package-lock.json";

    const V3_LOCKFILE: &str = r#"{
        "name": "monorepo",
        "lockfileVersion": 3,
        "packages": {
            "": {
                "name": "monorepo",
                "devDependencies": { "turbo": "^2.3.1" }
            },
            "node_modules/turbo": { "version": "2.3.1" },
            "node_modules/turbo-linux-64": { "version": "2.3.1", "optional": true },
            "apps/web/node_modules/@scope/tool": { "version": "1.0.0" }
        }
    }"#;

    const V1_LOCKFILE: &str = r#"{
        "name": "legacy",
        "lockfileVersion": 1,
        "dependencies": {
            "turbo": {
                "version": "1.13.0",
                "requires": { "turbo-linux-64": "1.13.0" },
                "dependencies": {
                    "turbo-darwin-64": { "version": "1.13.0", "optional": true }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_packages_schema() {
        let snapshot = LockfileSnapshot::parse(Path::new("package-lock.json"), V3_LOCKFILE).unwrap();
        assert!(snapshot.contains("turbo"));
        assert!(snapshot.contains("turbo-linux-64"));
        assert!(snapshot.contains("@scope/tool"));
        assert!(!snapshot.contains("turbo-darwin-arm64"));
        assert_eq!(snapshot.declared_section("turbo"), Some(DependencySection::Dev));
    }

    #[test]
    fn test_parse_dependencies_schema_walks_nested_entries() {
        let snapshot = LockfileSnapshot::parse(Path::new("package-lock.json"), V1_LOCKFILE).unwrap();
        assert!(snapshot.contains("turbo"));
        assert!(snapshot.contains("turbo-darwin-64"));
        // `requires` lists names, it does not enumerate them
        assert!(!snapshot.contains("turbo-linux-64"));
        assert_eq!(snapshot.declared_section("turbo"), None);
    }

    #[test]
    fn test_malformed_lockfile_is_an_error() {
        let err = LockfileSnapshot::parse(Path::new("package-lock.json"), "{ not json").unwrap_err();
        assert!(matches!(err, LockfileError::Parse { .. }));
    }

    #[test]
    fn test_v1_root_sections_come_from_sibling_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_LOCK), V1_LOCKFILE).unwrap();
        fs::write(
            dir.path().join(MANIFEST_NAME),
            r#"{ "name": "legacy", "optionalDependencies": { "turbo": "1.13.0" } }"#,
        )
        .unwrap();

        let snapshot = LockfileSnapshot::load(&dir.path().join(PACKAGE_LOCK)).unwrap();
        assert_eq!(
            snapshot.declared_section("turbo"),
            Some(DependencySection::Optional)
        );
    }

    #[test]
    fn test_prod_section_wins_over_dev() {
        let root: RawEntry = serde_json::from_str(
            r#"{ "dependencies": { "turbo": "2" }, "devDependencies": { "turbo": "2" } }"#,
        )
        .unwrap();
        assert_eq!(root.declared_section("turbo"), Some(DependencySection::Prod));
    }

    #[test]
    fn test_workspace_declaration_is_used_when_root_has_none() {
        let snapshot = LockfileSnapshot::parse(
            Path::new("package-lock.json"),
            r#"{
                "lockfileVersion": 3,
                "packages": {
                    "": { "name": "monorepo", "dependencies": { "react": "^18.0.0" } },
                    "apps/docs": { "name": "docs", "optionalDependencies": { "turbo": "^2.3.1" } },
                    "apps/web": { "name": "web", "devDependencies": { "turbo": "^2.3.1" } },
                    "node_modules/turbo": { "version": "2.3.1" }
                }
            }"#,
        )
        .unwrap();
        // BTreeMap order: apps/docs is seen first
        assert_eq!(
            snapshot.declared_section("turbo"),
            Some(DependencySection::Optional)
        );
        assert_eq!(snapshot.declared_section("react"), Some(DependencySection::Prod));
        assert!(!snapshot.contains("docs"));
    }

    #[test]
    fn test_root_declaration_wins_over_workspace() {
        let snapshot = LockfileSnapshot::parse(
            Path::new("package-lock.json"),
            r#"{
                "lockfileVersion": 3,
                "packages": {
                    "": { "devDependencies": { "turbo": "^2.3.1" } },
                    "apps/web": { "dependencies": { "turbo": "^2.3.1" } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.declared_section("turbo"), Some(DependencySection::Dev));
    }

    #[test]
    fn test_find_lockfile_walks_up_and_skips_malformed() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("project");
        let nested = project.join("packages").join("app").join("node_modules").join("turbo");
        fs::create_dir_all(&nested).unwrap();
        fs::write(project.join(PACKAGE_LOCK), V3_LOCKFILE).unwrap();
        fs::write(project.join("packages").join(PACKAGE_LOCK), "garbage").unwrap();

        let snapshot = find_lockfile(&nested).unwrap();
        assert_eq!(snapshot.path(), project.join(PACKAGE_LOCK));
    }

    #[test]
    fn test_shrinkwrap_takes_precedence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_LOCK), V1_LOCKFILE).unwrap();
        fs::write(dir.path().join("npm-shrinkwrap.json"), V3_LOCKFILE).unwrap();

        let snapshot = find_lockfile(dir.path()).unwrap();
        assert_eq!(snapshot.path(), dir.path().join("npm-shrinkwrap.json"));
    }

    #[test]
    fn test_find_lockfile_respects_depth_limit() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_LOCK), V3_LOCKFILE).unwrap();

        let mut deep = dir.path().to_path_buf();
        for level in 0..=MAX_SEARCH_DEPTH {
            deep = deep.join(format!("d{level}"));
        }
        fs::create_dir_all(&deep).unwrap();

        assert!(find_lockfile(&deep).is_none());
        assert!(find_lockfile(deep.parent().unwrap()).is_some());
    }

    #[test]
    fn test_install_path_names() {
        assert_eq!(package_name_from_install_path("node_modules/turbo"), Some("turbo"));
        assert_eq!(
            package_name_from_install_path("node_modules/a/node_modules/@s/b"),
            Some("@s/b")
        );
        assert_eq!(package_name_from_install_path("packages/web"), None);
    }
}
