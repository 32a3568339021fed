//! Platform package names and the binary paths inside them.

use std::fmt;
use std::path::PathBuf;

use crate::platform::{Arch, Platform};

/// Name of the wrapped tool, used both as package prefix and binary name.
pub const TOOL_NAME: &str = "turbo";

/// A `<tool>-<platform>-<arch>` package expected to contain the native binary.
///
/// Only constructible from a supported platform and architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePackageName {
    name: String,
    exe_suffix: &'static str,
}

impl CandidatePackageName {
    pub fn new(platform: &Platform, arch: &Arch) -> Option<Self> {
        if !platform.is_supported() || !arch.is_supported() {
            return None;
        }
        Some(Self {
            name: format!("{TOOL_NAME}-{platform}-{arch}"),
            exe_suffix: platform.exe_suffix(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// File name of the binary inside the package (`turbo` or `turbo.exe`).
    pub fn binary_name(&self) -> String {
        format!("{TOOL_NAME}{}", self.exe_suffix)
    }

    /// Path of the binary relative to a `node_modules` directory.
    pub fn binary_subpath(&self) -> PathBuf {
        PathBuf::from(&self.name)
            .join("bin")
            .join(self.binary_name())
    }
}

impl fmt::Display for CandidatePackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Every platform package published for the tool, in a fixed order.
pub fn known_candidates() -> Vec<CandidatePackageName> {
    Platform::SUPPORTED
        .iter()
        .flat_map(|platform| {
            Arch::SUPPORTED
                .iter()
                .filter_map(move |arch| CandidatePackageName::new(platform, arch))
        })
        .collect()
}
