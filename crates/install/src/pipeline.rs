//! End-to-end install: resolve, match, download, extract, locate, cache.

use relup_core::inputs::{RepoId, ToolName, VersionSpec};
use relup_core::tools::{
    ArchPolicy, ArchiveKind, AssetDescriptor, HostPlatform, InstallCache, PlatformSignature,
    ReleaseHost,
};
use relup_core::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::extract::{ExtractOptions, extract};
use crate::locate::{SearchStrategy, locate_binary};
use crate::matcher::{AssetPattern, MatchResult, SuffixRule, match_asset};
use crate::resolver::resolve_release;

/// What to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Repository publishing the releases.
    pub repo: RepoId,
    /// Name of the executable.
    pub tool: ToolName,
    /// `latest` or an exact tag.
    pub version: VersionSpec,
}

/// Knobs for asset selection, unpacking and discovery.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Platform the binary must run on.
    pub platform: HostPlatform,
    /// How the architecture is spelled in asset names.
    pub arch_policy: ArchPolicy,
    /// Whether asset names must end in an archive suffix.
    pub suffix_rule: SuffixRule,
    /// Formats accepted beyond zip and tar.gz.
    pub extra_formats: Vec<ArchiveKind>,
    /// Forced archive kind instead of sniffing the asset name.
    pub archive_override: Option<ArchiveKind>,
    /// Leading components dropped from tarball entries.
    pub strip_components: usize,
    /// Binary search strategy after extraction.
    pub search: SearchStrategy,
    /// Download URL template used instead of asset matching.
    pub url_template: Option<String>,
    /// Parent directory for per-install scratch space.
    pub staging_dir: PathBuf,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            platform: HostPlatform::current(),
            arch_policy: ArchPolicy::default(),
            suffix_rule: SuffixRule::default(),
            extra_formats: Vec::new(),
            archive_override: None,
            strip_components: 0,
            search: SearchStrategy::default(),
            url_template: None,
            staging_dir: std::env::temp_dir().join("relup"),
        }
    }
}

impl InstallOptions {
    /// Asset pattern for a tool under these options.
    #[must_use]
    pub fn asset_pattern(&self, tool: &ToolName) -> AssetPattern {
        let signature = PlatformSignature::build(&self.platform, self.arch_policy);
        AssetPattern::new(tool, &signature)
            .with_formats(self.extra_formats.iter().copied().chain(self.archive_override))
            .with_rule(self.suffix_rule)
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The installed tool.
    pub tool: ToolName,
    /// Concrete release tag.
    pub version: String,
    /// Path of the cached executable.
    pub binary_path: PathBuf,
    /// Whether the binary came from the cache without a download.
    pub cached: bool,
}

impl InstallOutcome {
    /// Directory to add to `PATH`.
    #[must_use]
    pub fn bin_dir(&self) -> &Path {
        self.binary_path.parent().unwrap_or(&self.binary_path)
    }
}

/// Runs the install stages against a release host and a cache.
pub struct Installer<'a> {
    host: &'a dyn ReleaseHost,
    cache: &'a dyn InstallCache,
    options: InstallOptions,
}

impl<'a> Installer<'a> {
    /// Create an installer.
    #[must_use]
    pub fn new(
        host: &'a dyn ReleaseHost,
        cache: &'a dyn InstallCache,
        options: InstallOptions,
    ) -> Self {
        Self {
            host,
            cache,
            options,
        }
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Install the requested tool, reusing a cached copy when one exists.
    ///
    /// An exact tag is checked against the cache before any network
    /// activity; `latest` is resolved first and the resulting tag checked.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails. Nothing is retried.
    pub async fn install(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let tool = request.tool.as_str();

        if let VersionSpec::Tag(tag) = &request.version
            && let Some(outcome) = self.cached(request, tag)?
        {
            return Ok(outcome);
        }

        let release = resolve_release(self.host, &request.repo, &request.version).await?;
        let version = release.tag().to_string();

        if matches!(request.version, VersionSpec::Latest)
            && let Some(outcome) = self.cached(request, &version)?
        {
            return Ok(outcome);
        }

        let selected = match &self.options.url_template {
            Some(template) => self.select_from_template(template, request, &version),
            None => {
                let pattern = self.options.asset_pattern(&request.tool);
                match_asset(&release, &pattern, self.options.archive_override)?
            }
        };

        let staging = self
            .options
            .staging_dir
            .join(uuid::Uuid::new_v4().to_string());
        let result = self.fetch_and_store(request, &version, &selected, &staging).await;

        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            debug!(?staging, error = %e, "Could not remove staging directory");
        }

        let binary_path = result?;
        info!(tool, %version, ?binary_path, "Installed tool");

        Ok(InstallOutcome {
            tool: request.tool.clone(),
            version,
            binary_path,
            cached: false,
        })
    }

    fn cached(&self, request: &InstallRequest, version: &str) -> Result<Option<InstallOutcome>> {
        let hit = self.cache.lookup(request.tool.as_str(), version)?;
        Ok(hit.map(|binary_path| {
            info!(tool = %request.tool, version, ?binary_path, "Using cached tool");
            InstallOutcome {
                tool: request.tool.clone(),
                version: version.to_string(),
                binary_path,
                cached: true,
            }
        }))
    }

    fn select_from_template(
        &self,
        template: &str,
        request: &InstallRequest,
        version: &str,
    ) -> MatchResult {
        let url = expand_url_template(template, &request.tool, version, &self.options.platform);
        let name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(request.tool.as_str())
            .to_string();

        let archive_kind = self.options.archive_override.unwrap_or_else(|| {
            let pattern = self.options.asset_pattern(&request.tool);
            ArchiveKind::sniff(&name, pattern.formats())
        });

        info!(%url, archive = %archive_kind, "Using templated download URL");
        MatchResult {
            asset: AssetDescriptor::new(name, url),
            archive_kind,
        }
    }

    async fn fetch_and_store(
        &self,
        request: &InstallRequest,
        version: &str,
        selected: &MatchResult,
        staging: &Path,
    ) -> Result<PathBuf> {
        let file_name = Path::new(&selected.asset.name)
            .file_name()
            .map_or_else(|| request.tool.to_string(), |n| n.to_string_lossy().into_owned());
        let download_path = staging.join(file_name);

        self.host
            .download_asset(selected.url(), &download_path)
            .await?;

        let extract_options = ExtractOptions {
            strip_components: self.options.strip_components,
        };
        let root = extract(
            &download_path,
            selected.archive_kind,
            &staging.join("extract"),
            &extract_options,
        )
        .await?;

        let binary = locate_binary(&root, &request.tool, self.options.search)?;

        match compute_file_sha256(&binary).await {
            Ok(digest) => info!(?binary, sha256 = %digest, "Binary checksum"),
            Err(e) => warn!(?binary, error = %e, "Could not hash binary"),
        }

        self.cache.store(&binary, request.tool.as_str(), version)
    }
}

/// Expand a download URL template.
///
/// Placeholders: `{tool}`, `{tag}` (the release tag), `{version}` (the tag
/// without a leading `v`), `{os}` and `{arch}` (as reported by the host).
#[must_use]
pub fn expand_url_template(
    template: &str,
    tool: &ToolName,
    tag: &str,
    platform: &HostPlatform,
) -> String {
    template
        .replace("{tool}", tool.as_str())
        .replace("{tag}", tag)
        .replace("{version}", tag.strip_prefix('v').unwrap_or(tag))
        .replace("{os}", &platform.os)
        .replace("{arch}", &platform.arch)
}

async fn compute_file_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
