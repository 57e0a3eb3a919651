//! Error types for relup operations.
//!
//! Every stage of the install pipeline fails with one of these variants. None
//! of them are retried internally; the binary reports the message and exits
//! with a failure status.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, fetching or installing a tool.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A required input is absent or malformed.
    #[error("Invalid input: {message}")]
    #[diagnostic(
        code(relup::missing_input),
        help("Set the `name` input to `owner/repo` and use only letters, digits and '-' in `tool`")
    )]
    MissingInput {
        /// What was wrong with the input
        message: String,
    },

    /// The release host has no release for the requested version.
    #[error("Release not found: {repository}@{version}")]
    #[diagnostic(
        code(relup::not_found),
        help("Check that the repository publishes releases and that the tag exists")
    )]
    NotFound {
        /// Repository in `owner/repo` form
        repository: String,
        /// Requested version (tag or `latest`)
        version: String,
    },

    /// Transport failure while talking to the release host.
    #[error("Failed to query release host: {message}")]
    #[diagnostic(code(relup::network))]
    Network {
        /// The error message
        message: String,
    },

    /// No release asset matched the platform pattern.
    #[error(
        "No release asset matches '{pattern}'. Available assets: [{}]",
        .available.join(", ")
    )]
    #[diagnostic(
        code(relup::no_asset),
        help("Adjust the `tool` input or the architecture policy to match the publisher's naming")
    )]
    NoAsset {
        /// The asset pattern that was applied
        pattern: String,
        /// Every asset name attached to the release
        available: Vec<String>,
    },

    /// More than one release asset matched the platform pattern.
    #[error(
        "Expected exactly one asset matching '{pattern}', but found {}: [{}]. Available assets: [{}]",
        .matches.len(),
        .matches.join(", "),
        .available.join(", ")
    )]
    #[diagnostic(
        code(relup::ambiguous_asset),
        help("Require an archive suffix or use a more specific `tool` name")
    )]
    AmbiguousAsset {
        /// The asset pattern that was applied
        pattern: String,
        /// Names of the assets that matched
        matches: Vec<String>,
        /// Every asset name attached to the release
        available: Vec<String>,
    },

    /// The archive suffix is not one relup can extract.
    #[error("Unsupported archive format: '{suffix}'")]
    #[diagnostic(
        code(relup::unsupported_archive),
        help("Supported formats are .zip, .tar.gz, .7z and .xar")
    )]
    UnsupportedArchive {
        /// The offending suffix
        suffix: String,
    },

    /// Downloading or unpacking an asset failed.
    #[error("Failed to download {url}: {message}")]
    #[diagnostic(code(relup::download))]
    Download {
        /// Asset URL or archive path
        url: String,
        /// The error message
        message: String,
    },

    /// Extraction succeeded but no executable with the tool's name was found.
    #[error("Binary '{tool}' not found under {}", .root.display())]
    #[diagnostic(
        code(relup::binary_not_found),
        help("Set `tool` to the executable's name if it differs from the repository name")
    )]
    BinaryNotFound {
        /// The tool name that was searched for
        tool: String,
        /// The directory that was searched
        root: PathBuf,
    },

    /// The install cache could not be read or written.
    #[error("Tool cache error: {message}")]
    #[diagnostic(code(relup::cache))]
    Cache {
        /// The error message
        message: String,
        /// The cache path involved, if any
        path: Option<PathBuf>,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(relup::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a missing or invalid input error.
    #[must_use]
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            message: message.into(),
        }
    }

    /// Create a release not found error.
    #[must_use]
    pub fn not_found(repository: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NotFound {
            repository: repository.into(),
            version: version.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an unsupported archive error.
    #[must_use]
    pub fn unsupported_archive(suffix: impl Into<String>) -> Self {
        Self::UnsupportedArchive {
            suffix: suffix.into(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a binary not found error.
    #[must_use]
    pub fn binary_not_found(tool: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::BinaryNotFound {
            tool: tool.into(),
            root: root.into(),
        }
    }

    /// Create a cache error.
    #[must_use]
    pub fn cache(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Cache {
            message: message.into(),
            path,
        }
    }
}
