//! The launcher package's own `package.json`.
//!
//! Only read to pin the version of a platform package installed on demand,
//! so that it matches the launcher exactly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use turbo_shim_core::CandidatePackageName;

use crate::error::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherManifest {
    pub version: String,
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl LauncherManifest {
    /// Read `package.json` from the launcher's installation root.
    pub fn load(root: &Path) -> Result<Self, ManifestError> {
        let path = root.join("package.json");
        let contents = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ManifestError::Parse { path, source })
    }

    /// Version to install for `candidate`: its `optionalDependencies` pin,
    /// else the launcher's own version.
    pub fn pinned_version(&self, candidate: &CandidatePackageName) -> &str {
        self.optional_dependencies
            .get(candidate.as_str())
            .map_or(self.version.as_str(), String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use turbo_shim_core::PlatformArch;

    #[test]
    fn test_pinned_version_prefers_optional_dependency() {
        let manifest: LauncherManifest = serde_json::from_str(
            r#"{
                "name": "turbo",
                "version": "2.3.1",
                "optionalDependencies": { "turbo-linux-64": "2.3.0" }
            }"#,
        )
        .unwrap();

        let linux = PlatformArch::from_runtime_ids("linux", "x64").candidate().unwrap();
        let mac = PlatformArch::from_runtime_ids("darwin", "arm64").candidate().unwrap();
        assert_eq!(manifest.pinned_version(&linux), "2.3.0");
        assert_eq!(manifest.pinned_version(&mac), "2.3.1");
    }

    #[test]
    fn test_load_reports_missing_and_malformed_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            LauncherManifest::load(dir.path()),
            Err(ManifestError::Read { .. })
        ));

        fs::write(dir.path().join("package.json"), "{ \"version\": 1 }").unwrap();
        assert!(matches!(
            LauncherManifest::load(dir.path()),
            Err(ManifestError::Parse { .. })
        ));
    }
}
