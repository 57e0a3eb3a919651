//! Archive kinds and suffix handling.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Packaging format of a release asset, which selects the extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// The asset is the binary itself.
    None,
    /// `.zip`
    Zip,
    /// `.tar.gz`
    TarGz,
    /// `.7z`, only when enabled explicitly.
    SevenZip,
    /// `.xar`, only when enabled explicitly.
    Xar,
}

impl ArchiveKind {
    /// Formats recognized from the asset name without extra configuration.
    pub const SNIFFED: &'static [Self] = &[Self::Zip, Self::TarGz];

    /// Canonical suffix with leading `.`; empty for [`ArchiveKind::None`].
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
            Self::SevenZip => ".7z",
            Self::Xar => ".xar",
        }
    }

    /// Parse an archive suffix such as `zip`, `.TAR.GZ` or `.7z`.
    ///
    /// The input is lowercased and given a leading `.` before matching. An
    /// empty string means the asset is not packed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArchive`] for any other suffix.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        let normalized = normalize_suffix(suffix);
        match normalized.as_str() {
            "" => Ok(Self::None),
            ".zip" => Ok(Self::Zip),
            ".tar.gz" => Ok(Self::TarGz),
            ".7z" => Ok(Self::SevenZip),
            ".xar" => Ok(Self::Xar),
            _ => Err(Error::unsupported_archive(normalized)),
        }
    }

    /// Parse a comma separated list of suffixes (e.g. `7z, xar`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArchive`] for the first unknown entry.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::from_suffix)
            .collect()
    }

    /// Determine the kind of an asset from its name, considering `candidates`.
    ///
    /// Matching is case-insensitive; names without a candidate suffix are
    /// treated as bare binaries.
    #[must_use]
    pub fn sniff(name: &str, candidates: &[Self]) -> Self {
        let name = name.to_lowercase();
        candidates
            .iter()
            .copied()
            .filter(|kind| *kind != Self::None)
            .find(|kind| name.ends_with(kind.suffix()))
            .unwrap_or(Self::None)
    }
}

impl FromStr for ArchiveKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_suffix(s)
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            other => f.write_str(other.suffix()),
        }
    }
}

/// Lowercase a suffix and give it a leading `.` unless it is empty.
#[must_use]
pub fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim().to_lowercase();
    if suffix.is_empty() || suffix.starts_with('.') {
        suffix
    } else {
        format!(".{suffix}")
    }
}
