//! Running the resolved binary.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::ExecError;

/// Run `binary` with `args`, inheriting stdin, stdout and stderr, and wait
/// for it. Returns the exit code the launcher should exit with.
///
/// Arguments are passed through as-is, without a shell.
pub fn run_binary<I, S>(binary: &Path, args: I) -> Result<i32, ExecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!(binary = %binary.display(), "executing turbo");
    let status = Command::new(binary)
        .args(args)
        .status()
        .map_err(|source| ExecError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;
    Ok(exit_code(status))
}

/// Map a child's exit status to our own exit code.
///
/// Signal deaths follow the shell convention of `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
