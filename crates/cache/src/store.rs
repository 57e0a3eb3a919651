//! Filesystem tool cache keyed by tool name and version.

use relup_core::tools::{HostPlatform, InstallCache};
use relup_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Environment variable naming the runner's tool cache directory.
pub const TOOL_CACHE_ENV: &str = "RUNNER_TOOL_CACHE";

/// Version-keyed cache of installed binaries.
///
/// Default location: `$RUNNER_TOOL_CACHE`, or `~/.cache/relup/tools/`
/// outside a runner.
///
/// Structure (compatible with the hosted runner tool cache):
/// ```text
/// <root>/
/// └── <tool>/
///     └── <version>/
///         ├── x64/
///         │   └── <tool>      # Installed binary
///         └── x64.complete    # Marker written after a successful store
/// ```
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
    arch: String,
}

impl Default for ToolCache {
    fn default() -> Self {
        Self::new(default_cache_dir(), HostPlatform::current().arch)
    }
}

impl ToolCache {
    /// Create a cache at the specified root directory for one architecture.
    #[must_use]
    pub fn new(root: PathBuf, arch: impl Into<String>) -> Self {
        Self {
            root,
            arch: arch.into(),
        }
    }

    /// Create a cache rooted at `$RUNNER_TOOL_CACHE` when set.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(TOOL_CACHE_ENV) {
            Ok(root) if !root.trim().is_empty() => {
                Self::new(PathBuf::from(root), HostPlatform::current().arch)
            }
            _ => Self::default(),
        }
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the binary for a tool version.
    #[must_use]
    pub fn entry_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(version_key(version))
            .join(&self.arch)
    }

    /// Marker file that flags an entry as completely written.
    #[must_use]
    pub fn marker_path(&self, tool: &str, version: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(version_key(version))
            .join(format!("{}.complete", self.arch))
    }

    /// Full path of the cached binary.
    #[must_use]
    pub fn binary_path(&self, tool: &str, version: &str) -> PathBuf {
        self.entry_dir(tool, version)
            .join(format!("{tool}{}", std::env::consts::EXE_SUFFIX))
    }
}

impl InstallCache for ToolCache {
    fn lookup(&self, tool: &str, version: &str) -> Result<Option<PathBuf>> {
        let marker = self.marker_path(tool, version);
        let binary = self.binary_path(tool, version);

        if marker.is_file() && binary.is_file() {
            trace!(tool, version, ?binary, "Cache hit for binary");
            Ok(Some(binary))
        } else {
            trace!(tool, version, "Cache miss for binary");
            Ok(None)
        }
    }

    fn store(&self, source: &Path, tool: &str, version: &str) -> Result<PathBuf> {
        let dir = self.entry_dir(tool, version);
        let marker = self.marker_path(tool, version);
        let dest = self.binary_path(tool, version);

        // Drop any half-written entry from an earlier failed run
        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;

        std::fs::copy(source, &dest).map_err(|e| {
            Error::cache(
                format!("Failed to copy {} into cache: {e}", source.display()),
                Some(dest.clone()),
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&dest)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&dest, perms)?;
        }

        std::fs::write(&marker, b"")?;

        debug!(tool, version, ?dest, "Stored binary in cache");
        Ok(dest)
    }
}

/// Get the default tool cache directory outside a runner.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("relup")
        .join("tools")
}

/// Clean a version for use as a cache key.
///
/// Examples:
/// - "v1.2.3" -> "1.2.3"
/// - "=2.0.0-rc.1" -> "2.0.0-rc.1"
/// - "nightly-2024-01-01" -> "nightly-2024-01-01"
#[must_use]
pub fn clean_version(version: &str) -> String {
    let version = version.trim();
    let stripped = version.trim_start_matches(['v', '=']);
    semver::Version::parse(stripped).map_or_else(|_| version.to_string(), |v| v.to_string())
}

/// Single path component for a version: separators in tags such as
/// `release/v1.0` become `_`, and dot-only tags cannot name a parent.
fn version_key(version: &str) -> String {
    let key = clean_version(version).replace(['/', '\\'], "_");
    if !key.is_empty() && key.chars().all(|c| c == '.') {
        key.replace('.', "_")
    } else {
        key
    }
}
