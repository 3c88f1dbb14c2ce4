//! Command handlers behind the CLI. Each resolves its inputs from [`Config`],
//! calls into the library and prints the result.

use anyhow::{Result, bail};
use log::debug;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{StageOutcome, dispatch_run, dispatch_stage};
use crate::release::{VerifyReport, prepare_release, verify_dist};
use crate::runtime::Runtime;

/// Print the platform key in effect
pub fn key(config: &Config) -> Result<()> {
    println!("{}", config.platform);
    Ok(())
}

/// Print the manifest in effect as JSON
pub fn manifest(config: &Config) -> Result<()> {
    println!("{}", config.manifest.to_json()?);
    Ok(())
}

/// Run the platform's artifact; returns the exit code to exit with
#[tracing::instrument(skip(runtime, config))]
pub async fn run<R: Runtime>(runtime: &R, config: &Config, args: &[OsString]) -> Result<i32> {
    dispatch_run(
        runtime,
        &config.manifest,
        &config.platform,
        &config.dist_dir,
        args,
    )
    .await
}

/// Stage the platform's artifact from `source` (default: the dist dir) into `dest`
#[tracing::instrument(skip(runtime, config))]
pub fn stage<R: Runtime>(
    runtime: &R,
    config: &Config,
    source: Option<&Path>,
    dest: &Path,
) -> Result<StageOutcome> {
    let source = source.unwrap_or(config.dist_dir.as_path());
    let outcome = dispatch_stage(runtime, &config.manifest, &config.platform, source, dest)?;
    println!("   {}", outcome);
    Ok(outcome)
}

/// Copy the release binaries listed in `artifacts` into `out_dir`
#[tracing::instrument(skip(runtime, config))]
pub async fn prepare<R: Runtime + 'static>(
    runtime: Arc<R>,
    config: &Config,
    artifacts: &Path,
    out_dir: &Path,
    filters: &[String],
) -> Result<()> {
    let prepared = prepare_release(runtime, &config.manifest, artifacts, out_dir, filters).await?;
    debug!("Prepared {} artifacts", prepared.len());
    for artifact in &prepared {
        println!(
            "copied {} to {}",
            artifact.source.display(),
            artifact.dest.display()
        );
    }
    println!(
        "   prepared {} {} artifacts in {}",
        prepared.len(),
        config.manifest.name(),
        out_dir.display()
    );
    Ok(())
}

/// Check the dist dir against the manifest; fails if any entry is wrong
#[tracing::instrument(skip(runtime, config))]
pub fn verify<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let report = verify_dist(runtime, &config.manifest, &config.dist_dir)?;
    for line in format_report(&report) {
        println!("{}", line);
    }

    let failed = report.failures().count();
    if failed > 0 {
        bail!(
            "{} of {} {} artifacts failed verification in {}",
            failed,
            report.entries.len(),
            config.manifest.name(),
            config.dist_dir.display()
        );
    }
    Ok(())
}

fn format_report(report: &VerifyReport) -> Vec<String> {
    let width = report
        .entries
        .iter()
        .map(|e| e.key.len())
        .max()
        .unwrap_or(0);
    report
        .entries
        .iter()
        .map(|e| format!("   {:<width$}  {}", e.key, e.status, width = width))
        .collect()
}
