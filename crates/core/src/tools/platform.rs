//! Host platform reporting and platform signatures.
//!
//! Handles mapping between:
//! - the host's reported OS and CPU architecture (`linux`, `x64`, ...)
//! - the architecture spellings publishers use in asset names
//!   (`amd64`, `x86_64`, `64bit`, ...)

use std::fmt;
use std::str::FromStr;

/// The operating system and architecture the installed binary must run on.
///
/// Architecture tokens follow the common `arm`, `arm64`, `ia32`, `x64`
/// vocabulary; anything else is reported as the compiler target name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPlatform {
    /// Operating system name (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// CPU architecture token (`x64`, `arm64`, ...).
    pub arch: String,
}

impl HostPlatform {
    /// Create a new host platform.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Get the current platform.
    #[must_use]
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "x64",
            "x86" => "ia32",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            other => other,
        };
        Self::new(os, arch)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// How strictly the architecture is matched against asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchPolicy {
    /// Alternation of the common spellings (`x64` matches `amd64|x64|x86_64`).
    #[default]
    Synonyms,
    /// Like [`ArchPolicy::Synonyms`], also accepting `32bit`/`64bit`.
    BitWidth,
    /// A single literal: `x64` becomes `amd64`, everything else passes through.
    Literal,
}

impl ArchPolicy {
    /// Map a reported architecture to the pattern for this policy.
    #[must_use]
    pub fn arch_pattern(self, arch: &str) -> ArchPattern {
        let synonyms: Option<&'static [&'static str]> = match (self, arch) {
            (Self::Literal, "x64") => return ArchPattern::Literal("amd64".to_string()),
            (Self::Literal, _) => None,
            (_, "arm") => Some(&["arm", "arm32"]),
            (_, "arm64") => Some(&["aarch64", "arm64"]),
            (Self::Synonyms, "ia32") => Some(&["x32", "x86"]),
            (Self::BitWidth, "ia32") => Some(&["32bit", "x32", "x86"]),
            (Self::Synonyms, "x64") => Some(&["amd64", "x64", "x86_64"]),
            (Self::BitWidth, "x64") => Some(&["64bit", "amd64", "x64", "x86_64"]),
            _ => None,
        };

        match synonyms {
            Some(tokens) => ArchPattern::Alternation(tokens.to_vec()),
            None => ArchPattern::Literal(arch.to_string()),
        }
    }
}

impl FromStr for ArchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "synonyms" => Ok(Self::Synonyms),
            "bit-width" | "bitwidth" => Ok(Self::BitWidth),
            "literal" => Ok(Self::Literal),
            _ => Err(format!("Unknown architecture policy: {s}")),
        }
    }
}

impl fmt::Display for ArchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synonyms => f.write_str("synonyms"),
            Self::BitWidth => f.write_str("bit-width"),
            Self::Literal => f.write_str("literal"),
        }
    }
}

/// Architecture part of an asset pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchPattern {
    /// One token, matched literally.
    Literal(String),
    /// Any of several tokens.
    Alternation(Vec<&'static str>),
}

impl ArchPattern {
    /// Render as a regular expression fragment with every token escaped.
    #[must_use]
    pub fn to_regex(&self) -> String {
        match self {
            Self::Literal(token) => regex::escape(token),
            Self::Alternation(tokens) => {
                let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
                format!("({})", escaped.join("|"))
            }
        }
    }
}

impl fmt::Display for ArchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_regex())
    }
}

/// Normalized (OS, architecture) signature used to match release assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSignature {
    /// Operating system, exactly as reported by the host.
    pub os: String,
    /// Architecture pattern after applying the [`ArchPolicy`].
    pub arch: ArchPattern,
}

impl PlatformSignature {
    /// Build a signature for a host platform.
    #[must_use]
    pub fn build(platform: &HostPlatform, policy: ArchPolicy) -> Self {
        Self {
            os: platform.os.clone(),
            arch: policy.arch_pattern(&platform.arch),
        }
    }

    /// Build a signature for the current host.
    #[must_use]
    pub fn current(policy: ArchPolicy) -> Self {
        Self::build(&HostPlatform::current(), policy)
    }
}
