//! Host platform and architecture identification.
//!
//! Rust reports its compile target through [`std::env::consts`] using its own
//! vocabulary (`macos`, `x86_64`, ...). The platform packages are named after
//! the JavaScript runtime's identifiers instead, so detection happens in two
//! steps: translate Rust's names to runtime identifiers, then normalize those
//! into the package naming scheme (`win32` becomes `windows`, `x64` becomes `64`).

use std::fmt;

use crate::candidate::CandidatePackageName;

/// Operating system component of a platform package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Darwin,
    Linux,
    Windows,
    /// Anything we do not ship binaries for, with the identifier as reported.
    Unsupported(String),
}

impl Platform {
    /// Every platform that has published binaries.
    pub const SUPPORTED: [Self; 3] = [Self::Darwin, Self::Linux, Self::Windows];

    /// Normalize a runtime operating-system identifier (`darwin`, `linux`, `win32`, ...).
    pub fn from_runtime_id(id: &str) -> Self {
        match id {
            "darwin" => Self::Darwin,
            "linux" => Self::Linux,
            "win32" => Self::Windows,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Unsupported(raw) => raw,
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Suffix appended to the binary's file name on this platform.
    pub const fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }

    /// Whether the OS can run x64 binaries on an arm64 host.
    ///
    /// Rosetta 2 on macOS and the x64 emulation layer on Windows 11 qualify.
    /// Linux has no such layer in scope.
    pub const fn runs_x64_under_emulation(&self) -> bool {
        matches!(self, Self::Darwin | Self::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor architecture component of a platform package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x86-64, spelled `64` in package names.
    X64,
    Arm64,
    /// Anything else, with the identifier as reported.
    Unsupported(String),
}

impl Arch {
    /// Every architecture that has published binaries.
    pub const SUPPORTED: [Self; 2] = [Self::X64, Self::Arm64];

    /// Normalize a runtime CPU identifier (`x64`, `arm64`, `ia32`, ...).
    ///
    /// Unknown identifiers are kept verbatim but flagged as unsupported so
    /// they can never be spliced into a package name by accident.
    pub fn from_runtime_id(id: &str) -> Self {
        match id {
            "x64" => Self::X64,
            "arm64" => Self::Arm64,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::X64 => "64",
            Self::Arm64 => "arm64",
            Self::Unsupported(raw) => raw,
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The host's (platform, arch) pair, computed once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformArch {
    platform: Platform,
    arch: Arch,
}

impl PlatformArch {
    pub const fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// Build from runtime identifiers such as `("win32", "x64")`.
    pub fn from_runtime_ids(os: &str, cpu: &str) -> Self {
        Self::new(Platform::from_runtime_id(os), Arch::from_runtime_id(cpu))
    }

    /// Detect the platform this launcher was compiled for.
    pub fn detect() -> Self {
        Self::from_runtime_ids(
            runtime_os_id(std::env::consts::OS),
            runtime_cpu_id(std::env::consts::ARCH),
        )
    }

    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    pub const fn arch(&self) -> &Arch {
        &self.arch
    }

    pub const fn is_supported(&self) -> bool {
        self.platform.is_supported() && self.arch.is_supported()
    }

    /// The package that should hold the native binary for this host.
    ///
    /// `None` when either half is unsupported: no package name is built from
    /// an unrecognized identifier.
    pub fn candidate(&self) -> Option<CandidatePackageName> {
        CandidatePackageName::new(&self.platform, &self.arch)
    }

    /// The x64 package an arm64 host can run under emulation, if any.
    pub fn emulation_alternate(&self) -> Option<CandidatePackageName> {
        if self.arch == Arch::Arm64 && self.platform.runs_x64_under_emulation() {
            CandidatePackageName::new(&self.platform, &Arch::X64)
        } else {
            None
        }
    }
}

impl fmt::Display for PlatformArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.platform, self.arch)
    }
}

/// Translate a Rust `target_os` value into the runtime's platform identifier.
fn runtime_os_id(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Translate a Rust `target_arch` value into the runtime's CPU identifier.
fn runtime_cpu_id(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc64" => "ppc64",
        other => other,
    }
}
