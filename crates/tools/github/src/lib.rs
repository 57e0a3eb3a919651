//! GitHub Releases host for relup.
//!
//! Queries the GitHub REST API for releases and downloads release assets.
//! Supports:
//! - `latest` and exact-tag release lookup
//! - GitHub Enterprise Server through `GITHUB_API_URL`
//! - Token authentication through `GITHUB_TOKEN` or `GH_TOKEN`

use async_trait::async_trait;
use relup_core::inputs::RepoId;
use relup_core::tools::{AssetDescriptor, ReleaseDescriptor, ReleaseHost};
use relup_core::{Error, Result};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable overriding the API endpoint (set on GitHub runners).
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// Host serving `browser_download_url` assets on github.com.
const GITHUB_WEB_HOST: &str = "github.com";

/// GitHub release metadata from the API.
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    assets: Vec<Asset>,
}

/// GitHub release asset.
#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

impl TryFrom<Release> for ReleaseDescriptor {
    type Error = Error;

    fn try_from(release: Release) -> Result<Self> {
        let assets = release
            .assets
            .into_iter()
            .map(|a| AssetDescriptor::new(a.name, a.browser_download_url))
            .collect();
        Self::new(release.tag_name, assets)
    }
}

/// Release host backed by GitHub Releases.
#[derive(Debug, Clone)]
pub struct GitHubReleaseClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubReleaseClient {
    /// Create a client for the given API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built
    /// (TLS backend initialization failure).
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("relup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Create a client from `GITHUB_API_URL` and `GITHUB_TOKEN`/`GH_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GH_TOKEN").ok());
        Self::new(api_url, token)
    }

    /// The API endpoint this client talks to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build an API URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| Error::network(format!("Invalid API URL '{}': {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| Error::network(format!("Invalid API URL '{}'", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Whether `url` may receive the auth token.
    ///
    /// Only the API origin itself and github.com qualify; template URLs can
    /// point anywhere.
    fn is_trusted(&self, url: &Url) -> bool {
        let Ok(api) = Url::parse(&self.api_url) else {
            return false;
        };
        let same_origin = url.scheme() == api.scheme()
            && url.host_str() == api.host_str()
            && url.port_or_known_default() == api.port_or_known_default();
        same_origin || (url.scheme() == "https" && url.host_str() == Some(GITHUB_WEB_HOST))
    }

    /// GET request carrying the auth token when `url` is trusted.
    fn get(&self, url: Url) -> RequestBuilder {
        match &self.token {
            Some(token) if self.is_trusted(&url) => self
                .client
                .get(url)
                .header("Authorization", format!("Bearer {token}")),
            Some(_) => {
                debug!(host = url.host_str(), "Not sending token to foreign host");
                self.client.get(url)
            }
            None => self.client.get(url),
        }
    }

    /// Fetch release information from the GitHub API.
    async fn fetch_release(
        &self,
        repo: &RepoId,
        url: Url,
        version: &str,
    ) -> Result<ReleaseDescriptor> {
        debug!(%url, "Fetching GitHub release");

        let request = self
            .get(url)
            .header("Accept", "application/vnd.github+json");

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("Failed to fetch release: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(repo.to_string(), version));
        }
        if !status.is_success() {
            return Err(Error::network(format!(
                "Release lookup for {repo}@{version} failed (HTTP {status})"
            )));
        }

        let release: Release = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse release: {e}")))?;
        release.try_into()
    }
}

#[async_trait]
impl ReleaseHost for GitHubReleaseClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn latest_release(&self, repo: &RepoId) -> Result<ReleaseDescriptor> {
        let url = self.endpoint(&[
            "repos",
            repo.owner.as_str(),
            repo.repo.as_str(),
            "releases",
            "latest",
        ])?;
        self.fetch_release(repo, url, relup_core::inputs::LATEST).await
    }

    async fn release_by_tag(&self, repo: &RepoId, tag: &str) -> Result<ReleaseDescriptor> {
        let url = self.endpoint(&[
            "repos",
            repo.owner.as_str(),
            repo.repo.as_str(),
            "releases",
            "tags",
            tag,
        ])?;
        self.fetch_release(repo, url, tag).await
    }

    async fn download_asset(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, ?dest, "Downloading GitHub asset");

        let parsed =
            Url::parse(url).map_err(|e| Error::download(url, format!("Invalid URL: {e}")))?;
        let request = self.get(parsed).header("Accept", "application/octet-stream");

        let mut response = request
            .send()
            .await
            .map_err(|e| Error::download(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::download(url, format!("HTTP {}", response.status())));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::download(url, format!("Transfer interrupted: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(%url, bytes = written, "Downloaded asset");
        Ok(())
    }
}
