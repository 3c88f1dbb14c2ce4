//! Stand-in executable for platforms without an artifact.
//!
//! Staging happens at install time, which may not be where or how the
//! program is later run. Instead of failing the install, a stub is left
//! under the program's name; running it reports the unsupported key.

use std::path::Path;

use crate::error::DispatchError;
use crate::platform::PlatformKey;
use crate::runtime::Runtime;

/// Line present in every stub, used to recognize one before replacing it.
pub const FALLBACK_MARKER: &str = "reldist-fallback";

/// Filename of the stub on this host: `<program>` on unix,
/// `<program>.cmd` on Windows.
pub fn fallback_filename(program: &str) -> String {
    if cfg!(windows) {
        format!("{}.cmd", program)
    } else {
        program.to_string()
    }
}

/// Stub contents for this host.
pub fn fallback_script(program: &str, key: &PlatformKey) -> String {
    let message = DispatchError::UnsupportedPlatform {
        program: program.to_string(),
        key: key.to_string(),
    }
    .to_string();

    if cfg!(windows) {
        format!(
            "@echo off\r\nrem {}\r\necho {} 1>&2\r\nexit /b 1\r\n",
            FALLBACK_MARKER,
            batch_escape(&message)
        )
    } else {
        format!(
            "#!/bin/sh\n# {}\necho {} >&2\nexit 1\n",
            FALLBACK_MARKER,
            shell_quote(&message)
        )
    }
}

/// Whether `path` holds a stub written by [`fallback_script`].
pub fn is_fallback<R: Runtime>(runtime: &R, path: &Path) -> bool {
    if !runtime.is_file(path) {
        return false;
    }
    match runtime.read(path) {
        Ok(content) => String::from_utf8_lossy(&content).contains(FALLBACK_MARKER),
        Err(_) => false,
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn batch_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '^' | '&' | '|' | '<' | '>' | '(' | ')') {
            out.push('^');
        }
        if c == '%' {
            out.push('%');
        }
        out.push(c);
    }
    out
}
