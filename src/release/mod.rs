//! Release packaging
//!
//! Runs on the release machine, after the upstream build has produced one
//! binary per platform and a goreleaser `artifacts.json` describing them:
//!
//! - `prepare` copies every binary into the dist layout (named by platform key)
//! - `verify` checks a dist directory against the manifest

mod descriptor;
mod prepare;
mod verify;

pub use descriptor::{ArtifactExtra, ReleaseArtifact, load_descriptor, select_binaries};
pub use prepare::{PreparedArtifact, prepare_release};
pub use verify::{BinaryFormat, EntryStatus, VerifyEntry, VerifyReport, verify_dist};
