//! Platform detection and OS-specific path conventions.
//!
//! [`PlatformInfo`] is the single source of truth for the separator, home
//! directory and temp directory used by every path computation in the crate.
//! The process-wide value is computed lazily by [`platform_info`]; tests and
//! hosts that need another platform's conventions build one explicitly with
//! [`PlatformInfo::new`] and hand it to [`PathUtil`].

pub mod paths;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub use paths::PathUtil;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Windows,
    MacOs,
    Linux,
    Unknown,
}

impl PlatformKind {
    /// Detect the platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Unknown
        }
    }

    /// Path separator used by this platform.
    pub fn separator(self) -> char {
        match self {
            Self::Windows => '\\',
            _ => '/',
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Immutable description of the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// Operating system family.
    pub kind: PlatformKind,

    /// Native path separator.
    pub path_separator: char,

    /// Home directory of the current user (empty if unknown).
    pub home_directory: String,

    /// System temp directory.
    pub temp_directory: String,

    pub is_windows: bool,
    pub is_macos: bool,
    pub is_linux: bool,
}

impl PlatformInfo {
    /// Build platform info for an explicit platform.
    pub fn new(
        kind: PlatformKind,
        home_directory: impl Into<String>,
        temp_directory: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path_separator: kind.separator(),
            home_directory: home_directory.into(),
            temp_directory: temp_directory.into(),
            is_windows: kind == PlatformKind::Windows,
            is_macos: kind == PlatformKind::MacOs,
            is_linux: kind == PlatformKind::Linux,
        }
    }

    /// Probe the running process for its platform conventions.
    pub fn detect() -> Self {
        let home = dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = std::env::temp_dir().to_string_lossy().into_owned();

        Self::new(PlatformKind::current(), home, temp)
    }
}

/// Process-wide platform info, computed on first access.
pub fn platform_info() -> &'static PlatformInfo {
    static PLATFORM: OnceLock<PlatformInfo> = OnceLock::new();
    PLATFORM.get_or_init(|| {
        let info = PlatformInfo::detect();
        tracing::debug!(kind = %info.kind, home = %info.home_directory, "Platform detected");
        info
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_info_is_cached() {
        let first = platform_info();
        let second = platform_info();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first, &PlatformInfo::detect());
    }

    #[test]
    fn test_derived_flags() {
        let win = PlatformInfo::new(PlatformKind::Windows, "C:\\Users\\dev", "C:\\Temp");
        assert!(win.is_windows && !win.is_macos && !win.is_linux);
        assert_eq!(win.path_separator, '\\');

        let mac = PlatformInfo::new(PlatformKind::MacOs, "/Users/dev", "/tmp");
        assert!(mac.is_macos && !mac.is_windows);
        assert_eq!(mac.path_separator, '/');

        let unknown = PlatformInfo::new(PlatformKind::Unknown, "", "/tmp");
        assert!(!unknown.is_windows && !unknown.is_macos && !unknown.is_linux);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_detect_linux() {
        let info = PlatformInfo::detect();
        assert_eq!(info.kind, PlatformKind::Linux);
        assert_eq!(info.path_separator, '/');
    }
}
