use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// goreleaser artifact type for compiled binaries
pub const BINARY_KIND: &str = "Binary";

/// One entry of goreleaser's `artifacts.json`. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReleaseArtifact {
    #[serde(default)]
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub goos: Option<String>,
    #[serde(default)]
    pub goarch: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub extra: ArtifactExtra,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArtifactExtra {
    #[serde(rename = "Ext", default)]
    pub ext: String,
}

impl ReleaseArtifact {
    /// Platform key for a binary artifact, if its target has an npm name.
    pub fn platform_key(&self) -> Option<PlatformKey> {
        let goos = self.goos.as_deref()?;
        let goarch = self.goarch.as_deref()?;
        PlatformKey::from_goreleaser(goos, goarch)
    }
}

#[tracing::instrument(skip(runtime))]
pub fn load_descriptor<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<ReleaseArtifact>> {
    let content = runtime.read_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse release descriptor {}", path.display()))
}

/// Binary artifacts keyed by platform, restricted to keys matching any of
/// `filters` (glob patterns; empty means all).
pub fn select_binaries(
    artifacts: &[ReleaseArtifact],
    filters: &[String],
) -> Result<BTreeMap<PlatformKey, PathBuf>> {
    let patterns = filters
        .iter()
        .map(|f| glob::Pattern::new(f).with_context(|| format!("Invalid filter '{}'", f)))
        .collect::<Result<Vec<_>>>()?;

    let mut selected: BTreeMap<PlatformKey, PathBuf> = BTreeMap::new();
    for artifact in artifacts.iter().filter(|a| a.kind == BINARY_KIND) {
        let Some(key) = artifact.platform_key() else {
            warn!(
                "Skipping {}: no platform name for {}/{}",
                artifact.path.display(),
                artifact.goos.as_deref().unwrap_or("?"),
                artifact.goarch.as_deref().unwrap_or("?")
            );
            continue;
        };

        if artifact.extra.ext != key.ext() {
            warn!(
                "Skipping {}: extension '{}' does not match {}",
                artifact.path.display(),
                artifact.extra.ext,
                key
            );
            continue;
        }

        let key_name = key.to_string();
        if !patterns.is_empty() && !patterns.iter().any(|p| p.matches(&key_name)) {
            debug!("Filtered out {}", key_name);
            continue;
        }

        if let Some(first) = selected.get(&key) {
            warn!(
                "Skipping {}: {} already provided by {}",
                artifact.path.display(),
                key,
                first.display()
            );
            continue;
        }
        selected.insert(key, artifact.path.clone());
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    const DESCRIPTOR: &str = r#"[
        {"name": "changie", "path": "dist/changie_linux_amd64_v1/changie", "goos": "linux", "goarch": "amd64", "goamd64": "v1", "internal_type": 4, "type": "Binary", "extra": {"Binary": "changie", "Ext": "", "ID": "changie"}},
        {"name": "changie.exe", "path": "dist/changie_windows_amd64_v1/changie.exe", "goos": "windows", "goarch": "amd64", "type": "Binary", "extra": {"Binary": "changie", "Ext": ".exe"}},
        {"name": "changie", "path": "dist/changie_darwin_arm64/changie", "goos": "darwin", "goarch": "arm64", "type": "Binary", "extra": {"Ext": ""}},
        {"name": "changie_1.10.0_linux_amd64.tar.gz", "path": "dist/changie_1.10.0_linux_amd64.tar.gz", "goos": "linux", "goarch": "amd64", "type": "Archive", "extra": {}},
        {"name": "checksums.txt", "path": "dist/checksums.txt", "type": "Checksum"},
        {"name": "changie", "path": "dist/changie_plan9_amd64/changie", "goos": "plan9", "goarch": "amd64", "type": "Binary", "extra": {"Ext": ""}}
    ]"#;

    fn artifacts() -> Vec<ReleaseArtifact> {
        serde_json::from_str(DESCRIPTOR).unwrap()
    }

    #[test]
    fn test_parse_goreleaser_descriptor() {
        let artifacts = artifacts();
        assert_eq!(artifacts.len(), 6);
        assert_eq!(artifacts[1].extra.ext, ".exe");
        assert_eq!(artifacts[4].goos, None);
        assert_eq!(artifacts[4].extra, ArtifactExtra::default());
    }

    #[test]
    fn test_select_binaries_maps_and_skips() {
        let selected = select_binaries(&artifacts(), &[]).unwrap();
        let keys: Vec<String> = selected.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["darwin-arm64", "linux-x64", "win32-x64.exe"]);
        assert_eq!(
            selected[&PlatformKey::new("linux", "x64")],
            PathBuf::from("dist/changie_linux_amd64_v1/changie")
        );
    }

    #[test]
    fn test_select_binaries_with_filters() {
        let filters = vec!["linux-*".to_string(), "*.exe".to_string()];
        let selected = select_binaries(&artifacts(), &filters).unwrap();
        let keys: Vec<String> = selected.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["linux-x64", "win32-x64.exe"]);
    }

    #[test]
    fn test_select_binaries_rejects_invalid_filter() {
        let err = select_binaries(&artifacts(), &["[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid filter '['"));
    }

    #[test]
    fn test_select_binaries_keeps_first_duplicate() {
        let artifacts: Vec<ReleaseArtifact> = serde_json::from_str(
            r#"[
                {"path": "dist/arm_6/changie", "goos": "linux", "goarch": "arm", "type": "Binary"},
                {"path": "dist/arm_7/changie", "goos": "linux", "goarch": "arm", "type": "Binary"}
            ]"#,
        )
        .unwrap();
        let selected = select_binaries(&artifacts, &[]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(
            selected[&PlatformKey::new("linux", "arm")],
            PathBuf::from("dist/arm_6/changie")
        );
    }

    #[test]
    fn test_select_binaries_rejects_mismatched_ext() {
        let artifacts: Vec<ReleaseArtifact> = serde_json::from_str(
            r#"[{"path": "dist/w/changie", "goos": "windows", "goarch": "arm64", "type": "Binary", "extra": {"Ext": ""}}]"#,
        )
        .unwrap();
        assert!(select_binaries(&artifacts, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_load_descriptor_error_names_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{\"not\": \"a list\"}".to_string()));

        let err = load_descriptor(&runtime, Path::new("dist/artifacts.json")).unwrap_err();
        assert!(err.to_string().contains("dist/artifacts.json"));
    }
}
