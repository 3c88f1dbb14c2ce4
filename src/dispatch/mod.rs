//! Release dispatcher
//!
//! Turns "the platform I am running on" into one action:
//!
//! - [`dispatch_run`] executes the matching artifact as a transparent
//!   pass-through (arguments, stdio and exit code are forwarded untouched)
//! - [`dispatch_stage`] copies the matching artifact to its canonical name,
//!   or leaves a fallback stub that fails when run
//!
//! Per-platform artifacts live in a dist directory under their platform key,
//! e.g. `dist/linux-x64` or `dist/win32-x64.exe`.

mod fallback;
mod run;
mod stage;

use std::path::{Path, PathBuf};

use crate::platform::PlatformKey;

pub use fallback::{FALLBACK_MARKER, fallback_filename, fallback_script, is_fallback};
pub use run::dispatch_run;
pub use stage::{StageOutcome, dispatch_stage};

/// Location of the artifact for `key` inside a dist directory.
pub fn artifact_path(dist_dir: &Path, key: &PlatformKey) -> PathBuf {
    dist_dir.join(key.to_string())
}
