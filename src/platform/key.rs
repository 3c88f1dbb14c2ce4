use anyhow::{Result, anyhow, bail};
use std::fmt;
use std::str::FromStr;

/// OS name of the Windows family.
pub const WINDOWS_OS: &str = "win32";

/// Executable suffix appended for the Windows family.
pub const WINDOWS_EXT: &str = ".exe";

/// Identifies one platform-specific artifact.
/// Format: "os-arch" or "win32-arch.exe"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformKey {
    os: String,
    arch: String,
}

impl PlatformKey {
    /// Build a key from already-normalized names.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Map goreleaser's `goos`/`goarch` pair to a key.
    /// Returns `None` for targets the npm layout has no name for.
    pub fn from_goreleaser(goos: &str, goarch: &str) -> Option<Self> {
        let os = match goos {
            "darwin" => "darwin",
            "linux" => "linux",
            "windows" => WINDOWS_OS,
            "freebsd" => "freebsd",
            "openbsd" => "openbsd",
            _ => return None,
        };
        let arch = match goarch {
            "386" => "ia32",
            "amd64" => "x64",
            "arm64" => "arm64",
            "arm" => "arm",
            _ => return None,
        };
        Some(Self::new(os, arch))
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn is_windows(&self) -> bool {
        self.os == WINDOWS_OS
    }

    /// Executable extension: `.exe` for the Windows family, empty otherwise.
    pub fn ext(&self) -> &'static str {
        if self.is_windows() { WINDOWS_EXT } else { "" }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.os, self.arch, self.ext())
    }
}

fn validate_part(part: &str, what: &str, input: &str) -> Result<()> {
    if part.is_empty() {
        bail!("Invalid platform '{}': {} cannot be empty", input, what);
    }
    if !part
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        bail!(
            "Invalid platform '{}': {} '{}' may only contain letters, digits and '_'",
            input,
            what,
            part
        );
    }
    Ok(())
}

impl FromStr for PlatformKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, has_ext) = match s.strip_suffix(WINDOWS_EXT) {
            Some(body) => (body, true),
            None => (s, false),
        };

        let (os, arch) = body.split_once('-').ok_or_else(|| {
            anyhow!(
                "Invalid platform '{}'. Expected 'os-arch', e.g. 'linux-x64' or 'win32-x64.exe'.",
                s
            )
        })?;
        validate_part(os, "os", s)?;
        validate_part(arch, "arch", s)?;

        let key = PlatformKey::new(os, arch);
        if has_ext && !key.is_windows() {
            bail!(
                "Invalid platform '{}': the {} suffix is only used for {}",
                s,
                WINDOWS_EXT,
                WINDOWS_OS
            );
        }
        Ok(key)
    }
}
