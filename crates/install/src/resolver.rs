//! Release resolution.

use relup_core::Result;
use relup_core::inputs::{RepoId, VersionSpec};
use relup_core::tools::{ReleaseDescriptor, ReleaseHost};
use tracing::{debug, info};

/// Resolve a version request to a concrete release.
///
/// `latest` asks the host for the repository's designated latest release,
/// which is not necessarily the newest or the last one listed. A tag is
/// looked up verbatim.
///
/// # Errors
///
/// Returns [`Error::NotFound`](relup_core::Error::NotFound) when no release
/// exists for the request, or [`Error::Network`](relup_core::Error::Network)
/// on transport failures.
pub async fn resolve_release(
    host: &dyn ReleaseHost,
    repo: &RepoId,
    version: &VersionSpec,
) -> Result<ReleaseDescriptor> {
    debug!(host = host.name(), %repo, %version, "Resolving release");

    let release = match version {
        VersionSpec::Latest => {
            let release = host.latest_release(repo).await?;
            info!(%repo, version = release.tag(), "Resolved latest version");
            release
        }
        VersionSpec::Tag(tag) => host.release_by_tag(repo, tag).await?,
    };

    debug!(
        %repo,
        tag = release.tag(),
        assets = release.assets().len(),
        "Release resolved"
    );
    Ok(release)
}
