use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use super::policy::SecurityPolicy;
use crate::core::error::{Error, Result};
use crate::core::platform::PathUtil;

/// Reasons a path is denied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is within blocked directory '{entry}'")]
    BlockedPath { path: String, entry: String },

    #[error("Path '{path}' matches blocked pattern '{pattern}'")]
    BlockedPattern { path: String, pattern: String },

    #[error("Path '{path}' is outside the workspace boundary '{boundary}'")]
    OutsideBoundary { path: String, boundary: String },

    #[error("Path '{path}' is outside the allowed subdirectories of boundary '{boundary}'")]
    OutsideAllowedSubdirectories {
        path: String,
        boundary: String,
        allowed: Vec<String>,
    },

    #[error("Blocked pattern '{pattern}' could not be compiled; access to '{path}' denied")]
    InvalidPolicy { path: String, pattern: String },
}

impl PathSecurityError {
    /// The path that was denied.
    pub fn path(&self) -> &str {
        match self {
            Self::BlockedPath { path, .. }
            | Self::BlockedPattern { path, .. }
            | Self::OutsideBoundary { path, .. }
            | Self::OutsideAllowedSubdirectories { path, .. }
            | Self::InvalidPolicy { path, .. } => path,
        }
    }

    /// The boundary that was crossed, for boundary denials.
    pub fn boundary(&self) -> Option<&str> {
        match self {
            Self::OutsideBoundary { boundary, .. }
            | Self::OutsideAllowedSubdirectories { boundary, .. } => Some(boundary),
            _ => None,
        }
    }

    /// The blocked entry or pattern that matched, for blocklist denials.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::BlockedPath { entry, .. } => Some(entry),
            Self::BlockedPattern { pattern, .. } | Self::InvalidPolicy { pattern, .. } => {
                Some(pattern)
            }
            _ => None,
        }
    }
}

/// Outcome of validating one path.
///
/// A denied result always carries a reason and an allowed one never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl From<std::result::Result<(), PathSecurityError>> for ValidationResult {
    fn from(result: std::result::Result<(), PathSecurityError>) -> Self {
        match result {
            Ok(()) => Self::allowed(),
            Err(e) => Self::denied(e.to_string()),
        }
    }
}

/// One compiled entry of the blocked list.
#[derive(Debug, Clone)]
pub(crate) enum BlockedEntry {
    /// Exact path or directory prefix.
    Literal { entry: String, normalized: String },
    /// `*` wildcard rule, anchored at the start of the path.
    Pattern { entry: String, matcher: Regex },
}

impl BlockedEntry {
    /// Compile a configured entry.
    ///
    /// `*` is the only wildcard and matches any run of characters, separators
    /// included. There is no escape for a literal `*`; every other character
    /// matches itself. Matching is case-insensitive on Windows.
    pub(crate) fn compile(entry: &str, paths: &PathUtil) -> Result<Self> {
        let normalized = paths.normalize(&paths.expand_home(entry));

        if !entry.contains('*') {
            return Ok(Self::Literal {
                entry: entry.to_string(),
                normalized,
            });
        }

        let body = normalized
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let matcher = RegexBuilder::new(&format!("^{body}"))
            .case_insensitive(paths.platform().is_windows)
            .build()
            .map_err(|e| Error::invalid_pattern(entry, e))?;

        Ok(Self::Pattern {
            entry: entry.to_string(),
            matcher,
        })
    }

    /// Test a normalized candidate path against this entry.
    fn check(&self, candidate: &str, paths: &PathUtil) -> std::result::Result<(), PathSecurityError> {
        match self {
            Self::Literal { entry, normalized } => {
                if is_within(candidate, normalized, paths) {
                    return Err(PathSecurityError::BlockedPath {
                        path: candidate.to_string(),
                        entry: entry.clone(),
                    });
                }
            }
            Self::Pattern { entry, matcher } => {
                if matcher.is_match(candidate) {
                    return Err(PathSecurityError::BlockedPattern {
                        path: candidate.to_string(),
                        pattern: entry.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Whether `candidate` equals `base` or lies beneath it.
///
/// Both sides must already be normalized. Comparison ignores ASCII case on
/// Windows.
fn is_within(candidate: &str, base: &str, paths: &PathUtil) -> bool {
    let (candidate, base) = if paths.platform().is_windows {
        (candidate.to_ascii_lowercase(), base.to_ascii_lowercase())
    } else {
        (candidate.to_string(), base.to_string())
    };

    if candidate == base {
        return true;
    }

    let sep = paths.separator();
    if base.ends_with(sep) {
        // A root such as `/` or `C:\` already ends in a separator.
        candidate.starts_with(&base)
    } else {
        candidate
            .strip_prefix(&base)
            .is_some_and(|rest| rest.starts_with(sep))
    }
}

/// Validator for candidate paths against a compiled policy.
///
/// Construction compiles the blocked list once; every call after that is a
/// pure function of the candidate path.
#[derive(Debug, Clone)]
pub struct PathValidator {
    paths: PathUtil,
    entries: Vec<BlockedEntry>,
    workspace_root: String,
    allowed_subdirectories: Vec<String>,
}

impl PathValidator {
    /// Build a validator for `policy` on the running platform.
    pub fn new(policy: &SecurityPolicy) -> Result<Self> {
        Self::with_paths(Some(policy), PathUtil::current())
    }

    /// Build a validator that applies only the platform baseline.
    pub fn platform_default() -> Result<Self> {
        Self::with_paths(None, PathUtil::current())
    }

    /// Build a validator with explicit platform conventions.
    ///
    /// The effective blocked list is the policy's `blocked_paths` followed by
    /// its `blocked_patterns`, in configured order; without a policy it is the
    /// platform baseline. The first matching entry determines the reason.
    ///
    /// A resolved workspace root must be absolute, so boundary checks never
    /// depend on the process working directory.
    pub fn with_paths(policy: Option<&SecurityPolicy>, paths: PathUtil) -> Result<Self> {
        let (raw_entries, workspace_root, allowed_subdirectories) = match policy {
            Some(policy) => (
                policy
                    .blocked_paths
                    .iter()
                    .chain(&policy.blocked_patterns)
                    .cloned()
                    .collect::<Vec<_>>(),
                policy.workspace_root.clone(),
                policy.allowed_subdirectories.clone(),
            ),
            None => (paths.default_blocked_paths(), String::new(), Vec::new()),
        };

        check_workspace_root(&workspace_root, &paths)?;

        let entries = raw_entries
            .iter()
            .map(|entry| entry.trim())
            .filter(|entry| !entry.is_empty())
            .map(|entry| BlockedEntry::compile(entry, &paths))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            paths,
            entries,
            workspace_root,
            allowed_subdirectories,
        })
    }

    /// Path utilities used by this validator.
    pub fn paths(&self) -> &PathUtil {
        &self.paths
    }

    /// Check a path against the blocked list.
    pub fn validate(&self, path: &str) -> ValidationResult {
        self.validate_detailed(path).into()
    }

    /// Check a path against the blocked list, keeping the structured reason.
    ///
    /// An empty path means "no path" and is allowed. `~` is expanded and
    /// `.`/`..` segments are collapsed before matching, so traversal cannot
    /// step around a blocked prefix.
    pub fn validate_detailed(&self, path: &str) -> std::result::Result<(), PathSecurityError> {
        if path.is_empty() {
            return Ok(());
        }

        let candidate = self.paths.normalize(&self.paths.expand_home(path));

        for entry in &self.entries {
            if let Err(denial) = entry.check(&candidate, &self.paths) {
                debug!(path = %path, reason = %denial, "Path denied by blocked list");
                return Err(denial);
            }
        }

        Ok(())
    }

    /// Check that a path stays inside the workspace root and, when configured,
    /// inside one of the allowed subdirectories.
    ///
    /// Relative paths are taken relative to the workspace root and the
    /// resolved absolute path is returned. The check is skipped when no
    /// workspace root is set or the root still carries the unresolved
    /// placeholder; the path then comes back normalized but otherwise as
    /// given, relative paths included.
    pub fn check_boundary(&self, path: &str) -> std::result::Result<String, PathSecurityError> {
        let root = self.workspace_root.trim();
        if root.is_empty() || root.contains(SecurityPolicy::WORKSPACE_PLACEHOLDER) {
            return Ok(self.paths.normalize(&self.paths.expand_home(path)));
        }

        let root = self.paths.resolve(&self.paths.expand_home(root), "");
        let candidate = self.paths.resolve(&root, &self.paths.expand_home(path));

        if !is_within(&candidate, &root, &self.paths) {
            debug!(path = %candidate, boundary = %root, "Path outside workspace boundary");
            return Err(PathSecurityError::OutsideBoundary {
                path: candidate,
                boundary: root,
            });
        }

        if !self.allowed_subdirectories.is_empty() {
            let allowed: Vec<String> = self
                .allowed_subdirectories
                .iter()
                .map(|sub| self.paths.resolve(&root, &self.paths.expand_home(sub)))
                .collect();

            if !allowed
                .iter()
                .any(|sub| is_within(&candidate, sub, &self.paths))
            {
                debug!(path = %candidate, "Path outside allowed subdirectories");
                return Err(PathSecurityError::OutsideAllowedSubdirectories {
                    path: candidate,
                    boundary: root,
                    allowed,
                });
            }
        }

        Ok(candidate)
    }

    /// Full admission check for an operation: blocked list on the path as
    /// given, then the boundary, then the blocked list again on the resolved
    /// absolute path. Returns the resolved path.
    pub fn validate_operation(&self, path: &str) -> std::result::Result<String, PathSecurityError> {
        self.validate_detailed(path)?;
        let resolved = self.check_boundary(path)?;
        self.validate_detailed(&resolved)?;
        Ok(resolved)
    }
}

/// Reject a workspace root that is set, resolved and still relative.
pub(crate) fn check_workspace_root(root: &str, paths: &PathUtil) -> Result<()> {
    let root = root.trim();
    if root.is_empty() || root.contains(SecurityPolicy::WORKSPACE_PLACEHOLDER) {
        return Ok(());
    }
    if !paths.is_absolute(&paths.expand_home(root)) {
        return Err(Error::config(format!(
            "workspaceRoot must be an absolute path, got '{root}'"
        )));
    }
    Ok(())
}

/// Validate a path against `policy`, or the platform baseline when `None`.
///
/// A policy whose patterns fail to compile denies every non-empty path.
pub fn validate_path(path: &str, policy: Option<&SecurityPolicy>) -> ValidationResult {
    match PathValidator::with_paths(policy, PathUtil::current()) {
        Ok(validator) => validator.validate(path),
        Err(Error::InvalidPattern { pattern, .. }) if !path.is_empty() => {
            PathSecurityError::InvalidPolicy {
                path: path.to_string(),
                pattern,
            }
            .into()
        }
        Err(_) if !path.is_empty() => ValidationResult::denied(format!(
            "Security policy could not be applied; access to '{path}' denied"
        )),
        Err(_) => ValidationResult::allowed(),
    }
}

impl From<PathSecurityError> for ValidationResult {
    fn from(error: PathSecurityError) -> Self {
        Self::denied(error.to_string())
    }
}
