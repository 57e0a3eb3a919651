//! Release model and the release host trait.
//!
//! The host is an explicitly constructed collaborator: the pipeline receives
//! a `&dyn ReleaseHost`, so tests can substitute a stub for the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::inputs::RepoId;
use crate::{Error, Result};

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// File name as published.
    pub name: String,
    /// Direct download URL.
    pub download_url: String,
}

impl AssetDescriptor {
    /// Create a new asset descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// A resolved release: its concrete tag and assets in publication order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDescriptor {
    tag: String,
    assets: Vec<AssetDescriptor>,
}

impl ReleaseDescriptor {
    /// Create a release descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the tag is empty; a release without a
    /// tag cannot key the install cache.
    pub fn new(tag: impl Into<String>, assets: Vec<AssetDescriptor>) -> Result<Self> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(Error::not_found("release", "<empty tag>"));
        }
        Ok(Self { tag, assets })
    }

    /// The release tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Assets in publication order.
    #[must_use]
    pub fn assets(&self) -> &[AssetDescriptor] {
        &self.assets
    }

    /// Names of all assets, for diagnostics.
    #[must_use]
    pub fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.name.clone()).collect()
    }
}

/// A release-hosting service that can list releases and serve their assets.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Host name used in log lines (e.g. "github").
    fn name(&self) -> &'static str;

    /// Fetch the release the host marks as latest.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the repository has no published release,
    /// [`Error::Network`] on transport failure.
    async fn latest_release(&self, repo: &RepoId) -> Result<ReleaseDescriptor>;

    /// Fetch the release tagged exactly `tag`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no such tag exists, [`Error::Network`] on
    /// transport failure.
    async fn release_by_tag(&self, repo: &RepoId, tag: &str) -> Result<ReleaseDescriptor>;

    /// Download an asset to `dest`.
    ///
    /// # Errors
    ///
    /// [`Error::Download`] on transport failure or a non-success response.
    async fn download_asset(&self, url: &str, dest: &Path) -> Result<()>;
}
