//! The `turbo` launcher: configuration, logging and the launch sequence.

#![deny(unused_crate_dependencies)]

// Only the binary target reports through anyhow.
use anyhow as _;

#[cfg(test)]
use tempfile as _;

pub mod config;
pub mod error;
pub mod launch;
pub mod logging;

pub use config::LauncherConfig;
pub use error::LaunchError;
pub use launch::{LAUNCH_FAILURE_CODE, Launcher, launcher_root};
