//! Security policy snapshot.
//!
//! A [`SecurityPolicy`] is owned by the caller and only read by the validator.
//! Its numeric [`ResourceLimits`] are carried for the operation executor and
//! never consulted during path validation.

use serde::{Deserialize, Serialize};

use super::path_validator::{BlockedEntry, check_workspace_root};
use crate::core::error::{Error, Result};
use crate::core::platform::PathUtil;

/// Numeric limits enforced by the operation executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceLimits {
    /// Largest file, in bytes, a single operation may touch.
    pub max_file_size: u64,

    /// Largest number of paths in one batch operation.
    pub max_batch_size: usize,

    /// Rate limit for operations.
    pub max_operations_per_minute: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_batch_size: 100,
            max_operations_per_minute: 60,
        }
    }
}

/// Snapshot of the path security settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPolicy {
    /// Root directory outside of which operations are denied.
    /// May contain [`SecurityPolicy::WORKSPACE_PLACEHOLDER`] until resolved.
    pub workspace_root: String,

    /// Subdirectories of the workspace root that operations are limited to.
    /// Empty means the whole workspace root is allowed.
    pub allowed_subdirectories: Vec<String>,

    /// Literal or prefix paths that are always denied.
    pub blocked_paths: Vec<String>,

    /// Glob-style rules (`*` wildcard) that are always denied.
    pub blocked_patterns: Vec<String>,

    #[serde(flatten)]
    pub limits: ResourceLimits,
}

impl SecurityPolicy {
    /// Token standing for the host's workspace folder.
    pub const WORKSPACE_PLACEHOLDER: &'static str = "${workspaceFolder}";

    /// Default policy using the given platform's conventions.
    pub fn for_platform(paths: &PathUtil) -> Self {
        let sep = paths.separator();
        Self {
            workspace_root: Self::WORKSPACE_PLACEHOLDER.to_string(),
            allowed_subdirectories: Vec::new(),
            blocked_paths: paths.default_blocked_paths(),
            blocked_patterns: vec![
                format!("*{sep}.git{sep}*"),
                format!("*{sep}node_modules{sep}*"),
            ],
            limits: ResourceLimits::default(),
        }
    }

    /// Substitute the workspace placeholder everywhere it appears.
    pub fn resolve_workspace(&self, workspace_folder: &str) -> Self {
        let substitute =
            |value: &String| value.replace(Self::WORKSPACE_PLACEHOLDER, workspace_folder);

        Self {
            workspace_root: substitute(&self.workspace_root),
            allowed_subdirectories: self.allowed_subdirectories.iter().map(substitute).collect(),
            blocked_paths: self.blocked_paths.iter().map(substitute).collect(),
            blocked_patterns: self.blocked_patterns.iter().map(substitute).collect(),
            limits: self.limits,
        }
    }

    /// Whether any path field still carries the unresolved placeholder.
    pub fn has_unresolved_placeholder(&self) -> bool {
        std::iter::once(&self.workspace_root)
            .chain(&self.allowed_subdirectories)
            .chain(&self.blocked_paths)
            .chain(&self.blocked_patterns)
            .any(|value| value.contains(Self::WORKSPACE_PLACEHOLDER))
    }

    /// Check limits and patterns for values the guard cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_file_size == 0 {
            return Err(Error::config("maxFileSize must be greater than zero"));
        }
        if self.limits.max_batch_size == 0 {
            return Err(Error::config("maxBatchSize must be greater than zero"));
        }
        if self.limits.max_operations_per_minute == 0 {
            return Err(Error::config(
                "maxOperationsPerMinute must be greater than zero",
            ));
        }

        let paths = PathUtil::current();
        check_workspace_root(&self.workspace_root, &paths)?;
        for entry in self.blocked_paths.iter().chain(&self.blocked_patterns) {
            BlockedEntry::compile(entry, &paths)?;
        }

        Ok(())
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::for_platform(&PathUtil::current())
    }
}
