//! Child process execution.

use anyhow::{Context, Result};
use log::warn;
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_program_impl(
        &self,
        program: &Path,
        args: &[OsString],
    ) -> Result<ExitStatus> {
        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to launch {}", program.display()))
    }
}

/// Exit code to report for a finished child.
///
/// A child terminated by a signal has no code; it maps to `128 + signal`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            match nix::sys::signal::Signal::try_from(signal) {
                Ok(sig) => warn!("Child terminated by {}", sig.as_str()),
                Err(_) => warn!("Child terminated by signal {}", signal),
            }
            return 128 + signal;
        }
    }

    1
}
