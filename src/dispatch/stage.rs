use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use super::artifact_path;
use super::fallback::{fallback_filename, fallback_script, is_fallback};
use crate::error::DispatchError;
use crate::manifest::ArtifactManifest;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

const EXECUTABLE_MODE: u32 = 0o755;

/// What [`dispatch_stage`] left in the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The artifact was copied to its canonical name
    Staged {
        source: PathBuf,
        dest: PathBuf,
        bytes: u64,
    },
    /// The manifest lists the platform but the artifact is absent;
    /// the destination was left as it was
    Missing { source: PathBuf },
    /// No artifact exists for the platform; a failing stub was written
    Fallback { dest: PathBuf, key: PlatformKey },
}

impl std::fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageOutcome::Staged { source, dest, .. } => {
                write!(f, "staged {} to {}", source.display(), dest.display())
            }
            StageOutcome::Missing { source } => {
                write!(f, "skipped, {} not found", source.display())
            }
            StageOutcome::Fallback { dest, key } => {
                write!(f, "no build for {}, left fallback {}", key, dest.display())
            }
        }
    }
}

/// Place the artifact for `key` from `source_dir` into `dest_dir` under its
/// canonical name.
///
/// Re-running with the same inputs leaves byte-identical content.
#[tracing::instrument(skip(runtime, manifest))]
pub fn dispatch_stage<R: Runtime>(
    runtime: &R,
    manifest: &ArtifactManifest,
    key: &PlatformKey,
    source_dir: &Path,
    dest_dir: &Path,
) -> Result<StageOutcome> {
    runtime.create_dir_all(dest_dir)?;

    let Some(filename) = manifest.lookup(key) else {
        let dest = dest_dir.join(fallback_filename(manifest.name()));
        let script = fallback_script(manifest.name(), key);
        replace_file(runtime, &dest, |tmp| {
            runtime.write(tmp, script.as_bytes())?;
            Ok(script.len() as u64)
        })?;
        info!("No {} build for {}, wrote fallback {}", manifest.name(), key, dest.display());
        return Ok(StageOutcome::Fallback {
            dest,
            key: key.clone(),
        });
    };

    let source = artifact_path(source_dir, key);
    if !runtime.is_file(&source) {
        let err = DispatchError::MissingArtifact {
            program: manifest.name().to_string(),
            path: source.clone(),
        };
        warn!("{}", err);
        return Ok(StageOutcome::Missing { source });
    }

    let dest = dest_dir.join(filename);
    let bytes = replace_file(runtime, &dest, |tmp| runtime.copy(&source, tmp))?;

    // On Windows the stub and the binary have different names
    let fallback = dest_dir.join(fallback_filename(manifest.name()));
    if fallback != dest && is_fallback(runtime, &fallback) {
        debug!("Removing fallback {}", fallback.display());
        runtime.remove_file(&fallback)?;
    }

    info!("Staged {} to {}", source.display(), dest.display());
    Ok(StageOutcome::Staged {
        source,
        dest,
        bytes,
    })
}

/// Hidden sibling that content is written to before being renamed into place.
fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.reldist-tmp", name))
}

/// Write `dest` through a temporary sibling so a half-written executable is
/// never visible under the final name.
fn replace_file<R, F>(runtime: &R, dest: &Path, write: F) -> Result<u64>
where
    R: Runtime,
    F: FnOnce(&Path) -> Result<u64>,
{
    let tmp = staging_path(dest);
    if runtime.exists(&tmp) {
        runtime.remove_file(&tmp)?;
    }

    let written = write(&tmp).and_then(|bytes| {
        runtime.set_permissions(&tmp, EXECUTABLE_MODE)?;
        runtime.rename(&tmp, dest)?;
        Ok(bytes)
    });

    if written.is_err() && runtime.exists(&tmp) {
        let _ = runtime.remove_file(&tmp);
    }
    written
}
