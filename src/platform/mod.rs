//! Platform identification
//!
//! A [`PlatformKey`] names one build artifact: the operating system and CPU
//! architecture it targets, plus `.exe` for the Windows family. Names follow
//! the Node.js conventions (`darwin`, `win32`, `x64`, `ia32`) because that is
//! how the npm distribution lays out its files.

mod detection;
mod key;

pub use detection::{normalize_arch, normalize_os, resolve_platform_key};
pub use key::PlatformKey;
