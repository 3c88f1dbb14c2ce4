//! Dispatch errors that callers may want to recognize.
//!
//! Both kinds travel inside `anyhow::Error`; use `downcast_ref::<DispatchError>()`
//! to tell them apart from operating-system failures.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No manifest entry for the platform key
    UnsupportedPlatform { program: String, key: String },
    /// The manifest names an artifact that is not a regular file on disk
    MissingArtifact { program: String, path: PathBuf },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::UnsupportedPlatform { program, key } => {
                write!(f, "Unsupported platform for {}: {}", program, key)
            }
            DispatchError::MissingArtifact { program, path } => {
                write!(f, "Unable to find {} {}", program, path.display())
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_names_key() {
        let err = DispatchError::UnsupportedPlatform {
            program: "changie".into(),
            key: "darwin-ppc64".into(),
        };
        assert_eq!(err.to_string(), "Unsupported platform for changie: darwin-ppc64");
    }

    #[test]
    fn test_missing_artifact_names_path() {
        let err = DispatchError::MissingArtifact {
            program: "changie".into(),
            path: PathBuf::from("dist/linux-x64"),
        };
        assert_eq!(err.to_string(), "Unable to find changie dist/linux-x64");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = DispatchError::UnsupportedPlatform {
            program: "changie".into(),
            key: "sunos-x64".into(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::UnsupportedPlatform { .. })
        ));
    }
}
