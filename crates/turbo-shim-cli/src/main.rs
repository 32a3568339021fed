//! Entry point for the `turbo` launcher installed by the npm package.

use std::path::PathBuf;

use anyhow::{Context, Result};
use turbo_shim_cli::{Launcher, LauncherConfig, launcher_root, logging};
use turbo_shim_core::PlatformArch;

fn main() -> Result<()> {
    let config = LauncherConfig::from_env();
    logging::init(&config);

    let args = std::env::args_os().skip(1).collect();
    let root = resolve_root()?;

    let code = Launcher::new(config, root, PlatformArch::detect()).run(args)?;
    std::process::exit(code);
}

/// Package root of the launcher, with symlinks from `node_modules/.bin` resolved.
fn resolve_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate the launcher executable")?;
    let exe = exe
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", exe.display()))?;
    launcher_root(&exe).with_context(|| format!("{} is not inside a package", exe.display()))
}
