//! Artifact manifest: which platform keys ship an artifact, and the
//! canonical filename each one is installed under.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// Program name used when a manifest file does not set one.
pub const DEFAULT_PROGRAM: &str = "changie";

/// Platforms distributed through npm. Mirrors the `files` list in `package.json`.
const BUILTIN_EXECUTABLES: &[(&str, &str)] = &[
    ("darwin-arm64", "changie"),
    ("darwin-x64", "changie"),
    ("linux-arm64", "changie"),
    ("linux-x64", "changie"),
    ("win32-ia32.exe", "changie.exe"),
    ("win32-x64.exe", "changie.exe"),
];

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

/// Manifest as written on disk, before key normalization.
#[derive(Deserialize)]
struct RawManifest {
    #[serde(default = "default_program")]
    name: String,
    executables: BTreeMap<String, String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArtifactManifest {
    name: String,
    /// Canonical platform key -> installed filename
    executables: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Build a manifest, normalizing keys (`win32-x64` becomes `win32-x64.exe`)
    /// and rejecting anything that would make a lookup silently miss.
    pub fn new<I, K, V>(name: impl Into<String>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let name = name.into();
        validate_filename(&name).context("Invalid program name in manifest")?;

        let mut executables = BTreeMap::new();
        for (raw_key, filename) in entries {
            let raw_key = raw_key.as_ref();
            let key: PlatformKey = raw_key
                .parse()
                .with_context(|| format!("Invalid manifest key '{}'", raw_key))?;
            let filename = filename.into();
            validate_filename(&filename)
                .with_context(|| format!("Invalid filename for manifest key '{}'", raw_key))?;

            let canonical = key.to_string();
            if executables.insert(canonical.clone(), filename).is_some() {
                bail!(
                    "Manifest key '{}' appears more than once (as '{}')",
                    canonical,
                    raw_key
                );
            }
        }

        if executables.is_empty() {
            bail!("Manifest for {} lists no executables", name);
        }

        Ok(Self { name, executables })
    }

    /// The manifest compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            name: DEFAULT_PROGRAM.to_string(),
            executables: BUILTIN_EXECUTABLES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(content).context("Failed to parse manifest")?;
        Self::new(raw.name, raw.executables)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to load manifest {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Name of the program the artifacts belong to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installed filename for `key`, if the platform ships an artifact
    pub fn lookup(&self, key: &PlatformKey) -> Option<&str> {
        self.executables.get(&key.to_string()).map(String::as_str)
    }

    /// All (key, filename) entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.executables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.executables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }
}

/// Filenames are placed directly inside a directory, so they must be a single
/// plain path component.
fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("filename cannot be empty");
    }
    if name == "." || name == ".." {
        bail!("'{}' is not a valid filename", name);
    }
    if name.contains(['/', '\\']) {
        bail!("'{}' must not contain a path separator", name);
    }
    Ok(())
}
