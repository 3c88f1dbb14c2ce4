use std::env::consts;

use super::PlatformKey;

/// Translate a Rust `target_os` name into the npm platform name.
/// Unknown names pass through unchanged.
pub fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        "solaris" | "illumos" => "sunos",
        other => other,
    }
}

/// Translate a Rust `target_arch` name into the npm architecture name.
/// Unknown names pass through unchanged.
pub fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Key for the platform this process is running on. Always succeeds; whether
/// a manifest knows the key is decided later.
pub fn resolve_platform_key() -> PlatformKey {
    PlatformKey::new(normalize_os(consts::OS), normalize_arch(consts::ARCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_platform_key() {
        let key = resolve_platform_key();

        assert!(!key.os().is_empty());
        assert!(!key.arch().is_empty());

        #[cfg(target_os = "macos")]
        assert_eq!(key.os(), "darwin");

        #[cfg(target_os = "linux")]
        assert_eq!(key.os(), "linux");

        #[cfg(target_os = "windows")]
        assert_eq!(key.os(), "win32");

        #[cfg(target_arch = "x86_64")]
        assert_eq!(key.arch(), "x64");

        #[cfg(target_arch = "aarch64")]
        assert_eq!(key.arch(), "arm64");
    }

    #[test]
    fn test_resolved_key_ext_follows_os() {
        let key = resolve_platform_key();
        assert_eq!(key.to_string().ends_with(".exe"), cfg!(windows));
    }

    #[test]
    fn test_resolved_key_round_trips() {
        let key = resolve_platform_key();
        let parsed: PlatformKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_normalize_names() {
        assert_eq!(normalize_os("macos"), "darwin");
        assert_eq!(normalize_os("linux"), "linux");
        assert_eq!(normalize_os("freebsd"), "freebsd");
        assert_eq!(normalize_arch("x86"), "ia32");
        assert_eq!(normalize_arch("arm"), "arm");
        assert_eq!(normalize_arch("riscv64"), "riscv64");
    }
}
