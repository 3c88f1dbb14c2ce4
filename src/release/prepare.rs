use anyhow::{Context, Result, bail};
use futures_util::future::try_join_all;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::{load_descriptor, select_binaries};
use crate::dispatch::artifact_path;
use crate::manifest::ArtifactManifest;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// A binary copied into the dist layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedArtifact {
    pub key: PlatformKey,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub bytes: u64,
}

/// Copy every binary listed in the goreleaser `descriptor` into `out_dir`,
/// named by platform key.
///
/// `out_dir` is emptied first, unless it holds the descriptor or one of the
/// binaries to copy. Copies run concurrently since each writes its own file. Fails if any platform the manifest lists did not receive an
/// artifact.
#[tracing::instrument(skip(runtime, manifest))]
pub async fn prepare_release<R: Runtime + 'static>(
    runtime: Arc<R>,
    manifest: &ArtifactManifest,
    descriptor: &Path,
    out_dir: &Path,
    filters: &[String],
) -> Result<Vec<PreparedArtifact>> {
    let artifacts = load_descriptor(runtime.as_ref(), descriptor)?;
    let selected = select_binaries(&artifacts, filters)?;
    debug!("Selected {} binaries from {}", selected.len(), descriptor.display());

    if runtime.exists(out_dir) {
        ensure_no_inputs_inside(
            runtime.as_ref(),
            out_dir,
            std::iter::once(descriptor).chain(selected.values().map(PathBuf::as_path)),
        )?;
        info!("Cleaning {}", out_dir.display());
        runtime.remove_dir_all(out_dir)?;
    }
    runtime.create_dir_all(out_dir)?;

    let copies = selected.into_iter().map(|(key, source)| {
        let runtime = Arc::clone(&runtime);
        let dest = artifact_path(out_dir, &key);
        tokio::task::spawn_blocking(move || -> Result<PreparedArtifact> {
            // copy files even if the manifest does not list them
            let bytes = runtime.copy(&source, &dest)?;
            runtime.set_permissions(&dest, 0o755)?;
            debug!("Copied {} to {}", source.display(), dest.display());
            Ok(PreparedArtifact {
                key,
                source,
                dest,
                bytes,
            })
        })
    });

    let mut prepared = try_join_all(copies)
        .await
        .context("Copy task failed to complete")?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    prepared.sort_by(|a, b| a.key.cmp(&b.key));

    check_manifest_coverage(manifest, &prepared)?;
    Ok(prepared)
}

/// Fail if any of `inputs` lives inside `out_dir`, comparing resolved paths.
/// Inputs that do not exist cannot be lost and are skipped.
fn ensure_no_inputs_inside<'a, R: Runtime>(
    runtime: &R,
    out_dir: &Path,
    inputs: impl IntoIterator<Item = &'a Path>,
) -> Result<()> {
    let out = runtime.canonicalize(out_dir)?;
    for input in inputs {
        let Ok(resolved) = runtime.canonicalize(input) else {
            continue;
        };
        if resolved.starts_with(&out) {
            bail!(
                "Refusing to clean {}: it contains {}",
                out_dir.display(),
                input.display()
            );
        }
    }
    Ok(())
}

/// Every manifest entry must have an artifact; extra artifacts are allowed.
fn check_manifest_coverage(manifest: &ArtifactManifest, prepared: &[PreparedArtifact]) -> Result<()> {
    let produced: Vec<String> = prepared.iter().map(|p| p.key.to_string()).collect();

    for name in &produced {
        if !manifest.entries().any(|(key, _)| key == name) {
            debug!("{} is not listed in the manifest", name);
        }
    }

    let missing: Vec<&str> = manifest
        .entries()
        .map(|(key, _)| key)
        .filter(|key| !produced.iter().any(|p| p == key))
        .collect();

    if !missing.is_empty() {
        bail!(
            "Release is missing {} artifacts listed in the manifest: {}",
            manifest.name(),
            missing.join(", ")
        );
    }
    Ok(())
}
