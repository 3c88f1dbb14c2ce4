use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::manifest::ArtifactManifest;
use crate::platform::{PlatformKey, resolve_platform_key};
use crate::runtime::Runtime;

pub const MANIFEST_ENV: &str = "RELDIST_MANIFEST";
pub const PLATFORM_ENV: &str = "RELDIST_PLATFORM";
pub const DIST_ENV: &str = "RELDIST_DIST";

/// Directory next to the executable holding per-platform artifacts
pub const DEFAULT_DIST_DIR: &str = "dist";

/// Settings shared by every command, with defaults filled in.
#[derive(Debug, Clone)]
pub struct Config {
    pub manifest: ArtifactManifest,
    pub platform: PlatformKey,
    pub dist_dir: PathBuf,
}

impl Config {
    /// Resolve settings from command line values (which already include the
    /// `RELDIST_*` environment fallbacks).
    ///
    /// - manifest: loaded from `manifest_path`, else the built-in one
    /// - platform: parsed from `platform`, else detected
    /// - dist dir: `dist_dir`, else `dist/` next to the running executable
    #[tracing::instrument(skip(runtime))]
    pub fn new<R: Runtime>(
        runtime: &R,
        manifest_path: Option<PathBuf>,
        platform: Option<String>,
        dist_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let manifest = match manifest_path {
            Some(path) => ArtifactManifest::load(runtime, &path)?,
            None => ArtifactManifest::builtin(),
        };

        let platform = match platform {
            Some(key) => key.parse::<PlatformKey>()?,
            None => resolve_platform_key(),
        };
        debug!("Using platform {}", platform);

        let dist_dir = match dist_dir {
            Some(dir) => dir,
            None => default_dist_dir(runtime)?,
        };
        debug!("Using dist directory {}", dist_dir.display());

        Ok(Self {
            manifest,
            platform,
            dist_dir,
        })
    }
}

#[tracing::instrument(skip(runtime))]
pub fn default_dist_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let exe = runtime.current_exe()?;
    let dir = exe
        .parent()
        .with_context(|| format!("{} has no parent directory", exe.display()))?;
    Ok(dir.join(DEFAULT_DIST_DIR))
}
