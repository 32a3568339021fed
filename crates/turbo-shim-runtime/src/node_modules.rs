//! Node-style module lookup for platform packages.
//!
//! Mirrors how the runtime resolves `require("<pkg>/bin/turbo")` from inside
//! the launcher package: try `node_modules` in the launcher's own directory
//! and then in every ancestor, skipping directories that are themselves
//! called `node_modules`, then every `NODE_PATH` entry. This is what makes
//! hoisted monorepo installs work without special cases.

use std::ffi::OsStr;
use std::path::PathBuf;

use tracing::debug;
use turbo_shim_core::{CandidatePackageName, Lookup, PackageLocator};

const NODE_MODULES: &str = "node_modules";

/// Finds platform packages by walking up from the launcher's installation root.
#[derive(Debug, Clone)]
pub struct NodeModulesLocator {
    root: PathBuf,
    node_path: Vec<PathBuf>,
}

impl NodeModulesLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            node_path: Vec::new(),
        }
    }

    /// Extra lookup roots, searched after the ancestor walk.
    #[must_use]
    pub fn with_node_path(mut self, value: Option<&OsStr>) -> Self {
        self.node_path = value
            .map(|paths| {
                std::env::split_paths(paths)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        self
    }

    /// Every location checked for `candidate`, in lookup order.
    pub fn search_paths(&self, candidate: &CandidatePackageName) -> Vec<PathBuf> {
        let subpath = candidate.binary_subpath();
        self.root
            .ancestors()
            .filter(|dir| dir.file_name() != Some(OsStr::new(NODE_MODULES)))
            .map(|dir| dir.join(NODE_MODULES))
            .chain(self.node_path.iter().cloned())
            .map(|modules| modules.join(&subpath))
            .collect()
    }
}

impl PackageLocator for NodeModulesLocator {
    fn locate(&self, candidate: &CandidatePackageName) -> Lookup {
        let searched = self.search_paths(candidate);
        let found = searched.iter().find(|path| path.is_file()).map(|path| {
            // Resolve symlinks the way the runtime's realpath does; keep the
            // unresolved path if that fails
            path.canonicalize().unwrap_or_else(|_| path.clone())
        });

        match &found {
            Some(path) => debug!(package = %candidate, path = %path.display(), "found platform package"),
            None => debug!(package = %candidate, tried = searched.len(), "platform package not found"),
        }
        Lookup { found, searched }
    }
}
