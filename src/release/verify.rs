use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::dispatch::artifact_path;
use crate::manifest::ArtifactManifest;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// Bytes `goblin::peek_bytes` needs to tell formats apart
const HEADER_LEN: usize = 16;

/// Executable container format, as far as a dist check cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    Elf,
    MachO,
    Pe,
    Unknown,
}

impl fmt::Display for BinaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryFormat::Elf => "ELF",
            BinaryFormat::MachO => "Mach-O",
            BinaryFormat::Pe => "PE",
            BinaryFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl BinaryFormat {
    /// Detect the format from the leading bytes of a file.
    pub fn detect(bytes: &[u8]) -> Self {
        let Some(head) = bytes
            .get(..HEADER_LEN)
            .and_then(|h| <&[u8; HEADER_LEN]>::try_from(h).ok())
        else {
            return BinaryFormat::Unknown;
        };
        match goblin::peek_bytes(head) {
            Ok(goblin::Hint::Elf(_)) => BinaryFormat::Elf,
            Ok(goblin::Hint::Mach(_)) | Ok(goblin::Hint::MachFat(_)) => BinaryFormat::MachO,
            Ok(goblin::Hint::PE) => BinaryFormat::Pe,
            _ => BinaryFormat::Unknown,
        }
    }

    /// Format a binary built for `key` should have, when known.
    pub fn expected_for(key: &PlatformKey) -> Option<Self> {
        match key.os() {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "android" | "sunos" => {
                Some(BinaryFormat::Elf)
            }
            "darwin" => Some(BinaryFormat::MachO),
            "win32" => Some(BinaryFormat::Pe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Ok(BinaryFormat),
    Missing,
    WrongFormat {
        expected: BinaryFormat,
        found: BinaryFormat,
    },
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Ok(format) => write!(f, "ok ({})", format),
            EntryStatus::Missing => f.write_str("missing"),
            EntryStatus::WrongFormat { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyEntry {
    pub key: String,
    pub path: PathBuf,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.status, EntryStatus::Ok(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerifyEntry> {
        self.entries
            .iter()
            .filter(|e| !matches!(e.status, EntryStatus::Ok(_)))
    }
}

/// Check that every manifest entry has an artifact in `dist_dir` built for
/// the right operating system.
#[tracing::instrument(skip(runtime, manifest))]
pub fn verify_dist<R: Runtime>(
    runtime: &R,
    manifest: &ArtifactManifest,
    dist_dir: &Path,
) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for (name, _) in manifest.entries() {
        let key: PlatformKey = name.parse()?;
        let path = artifact_path(dist_dir, &key);

        let status = if !runtime.is_file(&path) {
            EntryStatus::Missing
        } else {
            let found = BinaryFormat::detect(&read_header(runtime, &path)?);
            debug!("{} looks like {}", path.display(), found);
            match BinaryFormat::expected_for(&key) {
                Some(expected) if expected != found => EntryStatus::WrongFormat { expected, found },
                _ => EntryStatus::Ok(found),
            }
        };

        report.entries.push(VerifyEntry {
            key: name.to_string(),
            path,
            status,
        });
    }

    Ok(report)
}

fn read_header<R: Runtime>(runtime: &R, path: &Path) -> Result<Vec<u8>> {
    let mut head = Vec::with_capacity(HEADER_LEN);
    runtime
        .open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(head)
}
