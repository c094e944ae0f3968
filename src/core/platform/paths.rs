//! String-level path manipulation bound to a platform's conventions.
//!
//! These helpers never touch the filesystem: no canonicalization, no symlink
//! resolution. Both `/` and `\` are accepted as input separators on every
//! platform; output always uses the platform separator.

use super::{PlatformInfo, platform_info};

/// Returns true for either separator style.
fn is_sep(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Replace every backslash with a forward slash (display/comparison only).
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Replace every forward slash with a backslash (display/comparison only).
pub fn to_backslashes(path: &str) -> String {
    path.replace('/', "\\")
}

/// Path operations for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathUtil {
    platform: PlatformInfo,
}

impl PathUtil {
    /// Create path utilities for an explicit platform.
    pub fn new(platform: PlatformInfo) -> Self {
        Self { platform }
    }

    /// Path utilities for the running process.
    pub fn current() -> Self {
        Self::new(platform_info().clone())
    }

    /// The platform these utilities follow.
    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// The platform separator.
    pub fn separator(&self) -> char {
        self.platform.path_separator
    }

    /// Split a leading Windows drive (`C:`) from the rest of the path.
    fn split_drive<'a>(&self, path: &'a str) -> (&'a str, &'a str) {
        if self.platform.is_windows {
            let bytes = path.as_bytes();
            if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
                return path.split_at(2);
            }
        }
        ("", path)
    }

    /// Collapse separators and `.`/`..` segments.
    ///
    /// Runs of `/` or `\` become a single platform separator, `.` segments are
    /// dropped and `..` removes the preceding segment. A `..` that would climb
    /// above the root is discarded; leading `..` in a relative path is kept.
    /// Trailing separators are not preserved. The result is stable under
    /// repeated application.
    pub fn normalize(&self, path: &str) -> String {
        let (drive, rest) = self.split_drive(path);
        let rooted = rest.starts_with(is_sep);

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split(is_sep) {
            match segment {
                "" | "." => {}
                ".." => {
                    let can_pop = matches!(segments.last(), Some(last) if *last != "..");
                    if can_pop {
                        segments.pop();
                    } else if !rooted {
                        segments.push("..");
                    }
                }
                other => segments.push(other),
            }
        }

        let sep = self.separator();
        let sep_str = sep.to_string();
        let body = segments.join(sep_str.as_str());

        if drive.is_empty() && !rooted && body.is_empty() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(drive.len() + 1 + body.len());
        out.push_str(drive);
        if rooted {
            out.push(sep);
        }
        out.push_str(&body);
        out
    }

    /// Concatenate segments with the platform separator.
    ///
    /// Empty segments are skipped and a lone segment is returned untouched.
    pub fn join(&self, segments: &[&str]) -> String {
        let parts: Vec<&str> = segments.iter().copied().filter(|s| !s.is_empty()).collect();

        match parts.as_slice() {
            [] => String::new(),
            [only] => (*only).to_string(),
            [first, rest @ ..] => {
                let mut out = (*first).to_string();
                for segment in rest {
                    let segment = segment.trim_start_matches(is_sep);
                    if segment.is_empty() {
                        continue;
                    }
                    if !out.ends_with(is_sep) {
                        out.push(self.separator());
                    }
                    out.push_str(segment);
                }
                out
            }
        }
    }

    /// Final component of the path, ignoring trailing separators.
    pub fn basename(&self, path: &str) -> String {
        let (_, rest) = self.split_drive(path);
        let trimmed = rest.trim_end_matches(is_sep);
        trimmed.rsplit(is_sep).next().unwrap_or_default().to_string()
    }

    /// Everything before the final component. `.` when there is no parent.
    pub fn dirname(&self, path: &str) -> String {
        let (drive, rest) = self.split_drive(path);
        let sep = self.separator();
        let trimmed = rest.trim_end_matches(is_sep);

        if trimmed.is_empty() {
            return match (rest.is_empty(), drive.is_empty()) {
                (false, _) => format!("{drive}{sep}"),
                (true, true) => ".".to_string(),
                (true, false) => drive.to_string(),
            };
        }

        match trimmed.rfind(is_sep) {
            None if drive.is_empty() => ".".to_string(),
            None => drive.to_string(),
            Some(idx) => {
                let head = trimmed[..idx].trim_end_matches(is_sep);
                if head.is_empty() {
                    format!("{drive}{sep}")
                } else {
                    format!("{drive}{head}")
                }
            }
        }
    }

    /// Extension of the final component including the dot, or `""`.
    ///
    /// Dotfiles such as `.env` have no extension.
    pub fn extension(&self, path: &str) -> String {
        let base = self.basename(path);
        match base.rfind('.') {
            None | Some(0) => String::new(),
            Some(idx) => base[idx..].to_string(),
        }
    }

    /// Whether the path is rooted (and, on Windows, drive-qualified if it has a drive).
    pub fn is_absolute(&self, path: &str) -> bool {
        let (drive, rest) = self.split_drive(path);
        if drive.is_empty() {
            path.starts_with(is_sep)
        } else {
            rest.starts_with(is_sep)
        }
    }

    /// Resolve `relative` against `base`, producing a normalized absolute path.
    ///
    /// A relative `base` is itself resolved against the current directory,
    /// falling back to the filesystem root if that is unavailable.
    pub fn resolve(&self, base: &str, relative: &str) -> String {
        if self.is_absolute(relative) {
            return self.normalize(relative);
        }

        let base = if self.is_absolute(base) {
            base.to_string()
        } else {
            let cwd = std::env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|cwd| self.is_absolute(cwd))
                .unwrap_or_else(|| self.separator().to_string());
            self.join(&[cwd.as_str(), base])
        };

        self.normalize(&self.join(&[base.as_str(), relative]))
    }

    /// Expand a leading `~` to the home directory.
    pub fn expand_home(&self, path: &str) -> String {
        let home = &self.platform.home_directory;
        if home.is_empty() {
            return path.to_string();
        }

        match path.strip_prefix('~') {
            Some("") => home.clone(),
            Some(rest) if rest.starts_with(is_sep) => self.join(&[home.as_str(), rest]),
            _ => path.to_string(),
        }
    }

    /// Shorten a path for display: `~` for the home directory and, on
    /// Windows, an upper-case drive letter.
    ///
    /// On Windows the home prefix is matched ignoring ASCII case and
    /// separator style.
    pub fn format_for_display(&self, path: &str) -> String {
        let display = self.upper_case_drive(path);
        let home = self.upper_case_drive(&self.platform.home_directory);
        let home = home.trim_end_matches(is_sep);

        if home.is_empty() || !self.is_absolute(home) {
            return display;
        }

        let rest = if self.platform.is_windows {
            let folded = to_backslashes(&display).to_ascii_lowercase();
            let home_folded = to_backslashes(home).to_ascii_lowercase();
            // Folding keeps byte offsets, so the prefix length carries over.
            folded
                .starts_with(&home_folded)
                .then(|| display.get(home.len()..))
                .flatten()
        } else {
            display.strip_prefix(home)
        };

        match rest {
            Some("") => "~".to_string(),
            Some(rest) if rest.starts_with(is_sep) => format!("~{rest}"),
            _ => display,
        }
    }

    fn upper_case_drive(&self, path: &str) -> String {
        let (drive, rest) = self.split_drive(path);
        if drive.is_empty() {
            path.to_string()
        } else {
            format!("{}{}", drive.to_ascii_uppercase(), rest)
        }
    }

    /// Baseline of paths that are always denied on this platform.
    pub fn default_blocked_paths(&self) -> Vec<String> {
        let mut blocked: Vec<String> = [".git", ".env", "node_modules"]
            .into_iter()
            .map(String::from)
            .collect();

        let platform_specific: &[&str] = match self.platform.kind {
            super::PlatformKind::Windows => &[
                "C:\\Windows",
                "C:\\Program Files",
                "C:\\Program Files (x86)",
                "C:\\ProgramData",
                "C:\\Users\\*\\AppData",
                "~\\.ssh",
            ],
            super::PlatformKind::MacOs => &[
                "/System",
                "/Library",
                "/private/etc",
                "/private/var",
                "~/Library/Keychains",
                "~/.ssh",
            ],
            super::PlatformKind::Linux => &["/sys", "/proc", "/dev", "/boot", "/etc/shadow", "~/.ssh"],
            super::PlatformKind::Unknown => &["~/.ssh"],
        };

        blocked.extend(platform_specific.iter().map(|p| p.to_string()));
        blocked
    }
}

impl Default for PathUtil {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformKind;
    use proptest::prelude::*;

    fn linux() -> PathUtil {
        PathUtil::new(PlatformInfo::new(PlatformKind::Linux, "/home/dev", "/tmp"))
    }

    fn windows() -> PathUtil {
        PathUtil::new(PlatformInfo::new(
            PlatformKind::Windows,
            "C:\\Users\\dev",
            "C:\\Users\\dev\\AppData\\Local\\Temp",
        ))
    }

    fn mac() -> PathUtil {
        PathUtil::new(PlatformInfo::new(PlatformKind::MacOs, "/Users/dev", "/tmp"))
    }

    #[test]
    fn test_normalize_collapses_separators_and_dots() {
        let p = linux();
        assert_eq!(p.normalize("a//b\\\\c"), "a/b/c");
        assert_eq!(p.normalize("/a/./b/../c/"), "/a/c");
        assert_eq!(p.normalize("../../a"), "../../a");
        assert_eq!(p.normalize("/../../etc"), "/etc");
        assert_eq!(p.normalize(""), ".");
        assert_eq!(p.normalize("a/.."), ".");
        assert_eq!(p.normalize("/"), "/");
    }

    #[test]
    fn test_normalize_windows() {
        let p = windows();
        assert_eq!(p.normalize("C:/Users//dev/./x"), "C:\\Users\\dev\\x");
        assert_eq!(p.normalize("c:\\a\\..\\.."), "c:\\");
        assert_eq!(p.normalize("C:"), "C:");
        assert_eq!(p.normalize(".git/config"), ".git\\config");
    }

    #[test]
    fn test_join() {
        let p = linux();
        assert_eq!(p.join(&[]), "");
        assert_eq!(p.join(&["only//"]), "only//");
        assert_eq!(p.join(&["a", "", "b"]), "a/b");
        assert_eq!(p.join(&["a/", "/b", "c"]), "a/b/c");
        assert_eq!(p.join(&["/", "etc"]), "/etc");
        assert_eq!(windows().join(&["C:\\", "Users", "dev"]), "C:\\Users\\dev");
    }

    #[test]
    fn test_slash_conversion() {
        assert_eq!(to_forward_slashes("C:\\a\\b"), "C:/a/b");
        assert_eq!(to_backslashes("a/b/c"), "a\\b\\c");
    }

    #[test]
    fn test_decomposition() {
        let p = linux();
        assert_eq!(p.basename("/a/b/file.txt"), "file.txt");
        assert_eq!(p.basename("/a/b/"), "b");
        assert_eq!(p.basename("/"), "");
        assert_eq!(p.dirname("/a/b/file.txt"), "/a/b");
        assert_eq!(p.dirname("/file.txt"), "/");
        assert_eq!(p.dirname("file.txt"), ".");
        assert_eq!(p.dirname("/"), "/");
        assert_eq!(p.extension("archive.tar.gz"), ".gz");
        assert_eq!(p.extension("Makefile"), "");
        assert_eq!(p.extension(".env"), "");
        assert_eq!(p.extension("dir.d/file"), "");

        let w = windows();
        assert_eq!(w.basename("C:\\a\\b.rs"), "b.rs");
        assert_eq!(w.dirname("C:\\a\\b.rs"), "C:\\a");
        assert_eq!(w.dirname("C:\\b.rs"), "C:\\");
    }

    #[test]
    fn test_is_absolute() {
        assert!(linux().is_absolute("/etc"));
        assert!(!linux().is_absolute("etc"));
        assert!(windows().is_absolute("C:\\Windows"));
        assert!(windows().is_absolute("\\Windows"));
        assert!(!windows().is_absolute("C:Windows"));
        assert!(!windows().is_absolute("Windows"));
    }

    #[test]
    fn test_resolve_is_absolute() {
        let p = linux();
        assert_eq!(p.resolve("/workspace", "src/../lib.rs"), "/workspace/lib.rs");
        assert_eq!(p.resolve("/workspace", "/etc/passwd"), "/etc/passwd");
        assert_eq!(p.resolve("/workspace", "../../.."), "/");
        assert!(p.is_absolute(&p.resolve("relative/base", "file")));
        assert!(p.is_absolute(&p.resolve("", "")));

        let w = windows();
        assert_eq!(w.resolve("C:\\work", "a\\b"), "C:\\work\\a\\b");
        assert!(w.is_absolute(&w.resolve("relative", "x")));
    }

    #[test]
    fn test_expand_home() {
        let p = linux();
        assert_eq!(p.expand_home("~"), "/home/dev");
        assert_eq!(p.expand_home("~/.ssh"), "/home/dev/.ssh");
        assert_eq!(p.expand_home("~other"), "~other");
        assert_eq!(p.expand_home("/abs"), "/abs");
    }

    #[test]
    fn test_format_for_display() {
        let p = linux();
        assert_eq!(p.format_for_display("/home/dev/project"), "~/project");
        assert_eq!(p.format_for_display("/home/dev"), "~");
        assert_eq!(p.format_for_display("/home/developer"), "/home/developer");
        assert_eq!(p.format_for_display("/etc"), "/etc");

        let w = windows();
        assert_eq!(w.format_for_display("c:\\Users\\dev\\code"), "~\\code");
        assert_eq!(w.format_for_display("d:\\data"), "D:\\data");
    }

    #[test]
    fn test_format_for_display_windows_ignores_case_and_separators() {
        let w = windows();
        assert_eq!(w.format_for_display("c:\\USERS\\dev\\x"), "~\\x");
        assert_eq!(w.format_for_display("C:/Users/dev/x"), "~/x");
        assert_eq!(w.format_for_display("C:/users/DEV"), "~");
        assert_eq!(w.format_for_display("C:/Users/developer"), "C:/Users/developer");

        // Case folding stays Windows-only.
        assert_eq!(linux().format_for_display("/HOME/dev/x"), "/HOME/dev/x");
    }

    #[test]
    fn test_default_blocked_paths_per_platform() {
        for util in [linux(), windows(), mac()] {
            let blocked = util.default_blocked_paths();
            for common in [".git", ".env", "node_modules"] {
                assert!(blocked.iter().any(|b| b == common));
            }
        }
        assert!(linux().default_blocked_paths().contains(&"/proc".to_string()));
        assert!(mac().default_blocked_paths().contains(&"/System".to_string()));
        assert!(windows().default_blocked_paths().contains(&"C:\\Windows".to_string()));
        assert!(windows().default_blocked_paths().iter().any(|b| b.ends_with("AppData")));
    }

    proptest! {
        #[test]
        fn property_normalize_is_idempotent(path in any::<String>()) {
            for util in [linux(), windows(), mac()] {
                let once = util.normalize(&path);
                prop_assert_eq!(util.normalize(&once), once);
            }
        }

        #[test]
        fn property_normalize_is_idempotent_on_pathlike_input(path in "[a-cC:./\\\\~]{0,24}") {
            for util in [linux(), windows()] {
                let once = util.normalize(&path);
                prop_assert_eq!(util.normalize(&once), once);
            }
        }

        #[test]
        fn property_format_for_display_is_idempotent(path in "(/home/dev|c:\\\\Users\\\\dev|[a-z:/\\\\]{0,6})[a-z/\\\\]{0,12}") {
            for util in [linux(), windows(), mac()] {
                let once = util.format_for_display(&path);
                prop_assert_eq!(util.format_for_display(&once), once);
            }
        }

        #[test]
        fn property_resolve_is_absolute(base in "[a-z/.]{0,12}", rel in "[a-z/.]{0,12}") {
            let util = linux();
            prop_assert!(util.is_absolute(&util.resolve(&base, &rel)));
        }
    }
}
