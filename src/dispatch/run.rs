use anyhow::Result;
use log::debug;
use std::ffi::OsString;
use std::path::Path;

use super::artifact_path;
use crate::error::DispatchError;
use crate::manifest::ArtifactManifest;
use crate::platform::PlatformKey;
use crate::runtime::{Runtime, exit_code};

/// Run the artifact for `key` from `dist_dir` with `args`, and return the
/// exit code the caller should exit with.
///
/// The child shares this process's stdio and is awaited to completion.
/// Fails with [`DispatchError::UnsupportedPlatform`] before touching the
/// filesystem when the manifest has no entry, and with
/// [`DispatchError::MissingArtifact`] before spawning anything when the
/// artifact is not a regular file.
#[tracing::instrument(skip(runtime, manifest, args))]
pub async fn dispatch_run<R: Runtime>(
    runtime: &R,
    manifest: &ArtifactManifest,
    key: &PlatformKey,
    dist_dir: &Path,
    args: &[OsString],
) -> Result<i32> {
    if manifest.lookup(key).is_none() {
        return Err(DispatchError::UnsupportedPlatform {
            program: manifest.name().to_string(),
            key: key.to_string(),
        }
        .into());
    }

    let executable = artifact_path(dist_dir, key);
    if !runtime.is_file(&executable) {
        return Err(DispatchError::MissingArtifact {
            program: manifest.name().to_string(),
            path: executable,
        }
        .into());
    }

    debug!(
        "Running {} with {} argument(s)",
        executable.display(),
        args.len()
    );
    let status = runtime.run_program(&executable, args).await?;
    let code = exit_code(&status);
    debug!("{} exited with {}", executable.display(), code);
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::path::PathBuf;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn manifest() -> ArtifactManifest {
        ArtifactManifest::new("changie", [("linux-x64", "changie")]).unwrap()
    }

    fn dist() -> PathBuf {
        PathBuf::from("/pkg/dist")
    }

    #[tokio::test]
    async fn test_unsupported_platform_touches_nothing() {
        // No expectations: any runtime call panics
        let runtime = MockRuntime::new();

        let err = dispatch_run(
            &runtime,
            &manifest(),
            &PlatformKey::new("darwin", "arm64"),
            &dist(),
            &[],
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::UnsupportedPlatform {
                program: "changie".into(),
                key: "darwin-arm64".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_missing_artifact_spawns_nothing() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_file()
            .withf(|p| p == dist().join("linux-x64"))
            .times(1)
            .returning(|_| false);
        runtime.expect_run_program().never();

        let err = dispatch_run(
            &runtime,
            &manifest(),
            &PlatformKey::new("linux", "x64"),
            &dist(),
            &os_args(&["--version"]),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::MissingArtifact {
                program: "changie".into(),
                path: dist().join("linux-x64"),
            })
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forwards_args_and_exit_code() {
        use std::os::unix::process::ExitStatusExt;

        let mut runtime = MockRuntime::new();
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_run_program()
            .withf(|program, args| {
                program == dist().join("linux-x64")
                    && args == os_args(&["new", "--kind", "Added", "-b", "some body"]).as_slice()
            })
            .times(1)
            .returning(|_, _| Ok(std::process::ExitStatus::from_raw(42 << 8)));

        let args = os_args(&["new", "--kind", "Added", "-b", "some body"]);
        let code = dispatch_run(
            &runtime,
            &manifest(),
            &PlatformKey::new("linux", "x64"),
            &dist(),
            &args,
        )
        .await
        .unwrap();

        assert_eq!(code, 42);
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_run_program()
            .returning(|_, _| Err(anyhow::anyhow!("Permission denied")));

        let err = dispatch_run(
            &runtime,
            &manifest(),
            &PlatformKey::new("linux", "x64"),
            &dist(),
            &[],
        )
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<DispatchError>().is_none());
        assert!(err.to_string().contains("Permission denied"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_real_child_exit_code_and_output() {
        use crate::runtime::{RealRuntime, Runtime};
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let exe = dir.path().join("linux-x64");
        runtime
            .write(
                &exe,
                format!(
                    "#!/bin/sh\nfor a in \"$@\"; do printf '%s\\n' \"$a\"; done > '{}'\nexit 3\n",
                    out.display()
                )
                .as_bytes(),
            )
            .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let args = os_args(&["a b", "--flag", ""]);
        let code = dispatch_run(
            &runtime,
            &manifest(),
            &PlatformKey::new("linux", "x64"),
            dir.path(),
            &args,
        )
        .await
        .unwrap();

        assert_eq!(code, 3);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a b\n--flag\n\n");
    }
}
