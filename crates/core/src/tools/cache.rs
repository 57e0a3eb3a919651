//! Install cache trait.

use std::path::{Path, PathBuf};

use crate::Result;

/// A version-keyed store of installed binaries.
///
/// Entries are keyed by (tool name, version). A miss is `Ok(None)`; errors
/// are reserved for failures such as an unwritable disk.
pub trait InstallCache: Send + Sync {
    /// Get the installed binary for `tool` at `version`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error only when the cache itself cannot be read.
    fn lookup(&self, tool: &str, version: &str) -> Result<Option<PathBuf>>;

    /// Register `source` as the binary for `tool` at `version`.
    ///
    /// Returns the canonical path of the cached binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be copied into the cache.
    fn store(&self, source: &Path, tool: &str, version: &str) -> Result<PathBuf>;
}
