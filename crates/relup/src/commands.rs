//! The install command.

use relup_cache::ToolCache;
use relup_core::Result;
use relup_core::tools::{HostPlatform, InstallCache, ReleaseHost};
use relup_install::{InstallOutcome, Installer};
use relup_tools_github::GitHubReleaseClient;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::cli::Cli;
use crate::workflow::Workflow;

/// Machine-readable result printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct InstallSummary {
    /// Installed tool name
    pub tool: String,
    /// Concrete release tag
    pub version: String,
    /// Cached binary
    pub path: PathBuf,
    /// Directory added to `PATH`
    pub bin_dir: PathBuf,
    /// Whether the binary was already cached
    pub cached: bool,
}

impl From<&InstallOutcome> for InstallSummary {
    fn from(outcome: &InstallOutcome) -> Self {
        Self {
            tool: outcome.tool.to_string(),
            version: outcome.version.clone(),
            path: outcome.binary_path.clone(),
            bin_dir: outcome.bin_dir().to_path_buf(),
            cached: outcome.cached,
        }
    }
}

/// Run the install against GitHub and the runner tool cache.
///
/// # Errors
///
/// Returns the first failure of input validation, the install pipeline or
/// the workflow command files.
pub async fn execute(
    cli: &Cli,
    workflow: &Workflow,
    out: &mut dyn Write,
) -> Result<InstallOutcome> {
    let host = GitHubReleaseClient::from_env()?;
    let cache = match &cli.tool_cache {
        Some(root) => ToolCache::new(root.clone(), HostPlatform::current().arch),
        None => ToolCache::from_env(),
    };
    execute_with(cli, &host, &cache, workflow, out).await
}

/// Run the install against an explicit host and cache.
///
/// # Errors
///
/// See [`execute`].
#[instrument(
    name = "install",
    skip_all,
    fields(correlation_id = %crate::tracing::correlation_id())
)]
pub async fn execute_with(
    cli: &Cli,
    host: &dyn ReleaseHost,
    cache: &dyn InstallCache,
    workflow: &Workflow,
    out: &mut dyn Write,
) -> Result<InstallOutcome> {
    let request = cli.request()?;
    let options = cli.options()?;

    info!(
        repo = %request.repo,
        tool = %request.tool,
        version = %request.version,
        platform = %options.platform,
        "Installing tool"
    );

    let outcome = Installer::new(host, cache, options).install(&request).await?;

    workflow.add_path(outcome.bin_dir(), out)?;
    workflow.set_output("version", &outcome.version, out)?;

    if cli.json {
        let summary = InstallSummary::from(&outcome);
        let json = serde_json::to_string(&summary)
            .map_err(|e| std::io::Error::other(format!("Failed to serialize summary: {e}")))?;
        writeln!(out, "{json}")?;
    }

    Ok(outcome)
}
