//! Validated install inputs.
//!
//! Raw inputs arrive as strings (CLI flags or `INPUT_*` variables). These
//! types validate them once so the rest of the pipeline can rely on a
//! well-formed repository identity and a tool name that is safe to embed in
//! a pattern.

use std::fmt;

use crate::{Error, Result};

/// Sentinel version that resolves to the most recent published release.
pub const LATEST: &str = "latest";

/// Repository identity on the release host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoId {
    /// Create a repository identity from separate owner and repo fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if either part is empty or contains a `/`.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let owner = owner.into().trim().to_string();
        let repo = repo.into().trim().to_string();

        if owner.is_empty() || repo.is_empty() {
            return Err(Error::missing_input("Invalid repository name"));
        }
        if owner.contains('/') || repo.contains('/') {
            return Err(Error::missing_input(format!(
                "Invalid repository name: {owner}/{repo}"
            )));
        }

        Ok(Self { owner, repo })
    }

    /// Parse a combined `owner/repo` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] unless the value has exactly two
    /// non-empty segments.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::missing_input("Missing required input: name"));
        }

        let (owner, repo) = name
            .split_once('/')
            .ok_or_else(|| Error::missing_input(format!("Invalid repository name: {name}")))?;
        Self::new(owner, repo)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A tool name restricted to ASCII letters, digits and `-`.
///
/// The name ends up inside the asset and binary patterns, so anything else is
/// rejected before a pattern is ever built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolName(String);

impl ToolName {
    /// Validate a tool name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for empty names or names with
    /// characters outside `[-A-Za-z0-9]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(Error::missing_input(format!("Invalid tool name: '{name}'")));
        }
        Ok(Self(name))
    }

    /// Pick the tool name from an optional input, defaulting to the repository name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if the chosen name is invalid.
    pub fn from_input(tool: Option<&str>, repo: &RepoId) -> Result<Self> {
        match tool.map(str::trim).filter(|t| !t.is_empty()) {
            Some(tool) => Self::new(tool),
            None => Self::new(repo.repo.clone()),
        }
    }

    /// The validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Requested version: the `latest` sentinel or an exact tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// The most recent published release.
    Latest,
    /// A release tagged exactly with this string.
    Tag(String),
}

impl VersionSpec {
    /// Parse a version input. Empty or absent input means [`VersionSpec::Latest`].
    #[must_use]
    pub fn parse(version: Option<&str>) -> Self {
        match version.map(str::trim).filter(|v| !v.is_empty()) {
            None | Some(LATEST) => Self::Latest,
            Some(tag) => Self::Tag(tag.to_string()),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}
