//! Command-line and action input parsing.
//!
//! Every input can come from a flag or from the `INPUT_*` variable GitHub
//! Actions sets for the step's `with:` block. Actions passes unset inputs as
//! empty strings, so empty values count as absent.

use clap::Parser;
use clap::builder::{BoolishValueParser, TypedValueParser};
use relup_core::inputs::{RepoId, ToolName, VersionSpec};
use relup_core::tools::{ArchPolicy, ArchiveKind, HostPlatform};
use relup_core::{Error, Result};
use relup_install::{InstallOptions, InstallRequest, SearchStrategy, SuffixRule};
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::tracing::{LogLevel, TracingConfig, TracingFormat};

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for any failed install
pub const EXIT_FAILED: i32 = 1;

/// Install a tool binary from a GitHub release.
#[derive(Parser, Debug)]
#[command(name = "relup")]
#[command(about = "Install a tool binary from a GitHub release into the tool cache")]
#[command(long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Repository in `owner/repo` form.
    #[arg(long, env = "INPUT_NAME")]
    pub name: Option<String>,

    /// Repository owner, used with `--repo` instead of `--name`.
    #[arg(long, env = "INPUT_OWNER")]
    pub owner: Option<String>,

    /// Repository name, used with `--owner` instead of `--name`.
    #[arg(long, env = "INPUT_REPO")]
    pub repo: Option<String>,

    /// Executable name; defaults to the repository name.
    #[arg(long, env = "INPUT_TOOL")]
    pub tool: Option<String>,

    /// Release tag, or `latest`.
    #[arg(long, env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Force the archive format (`zip`, `tar.gz`, `7z`, `xar` or `none`).
    #[arg(long, env = "INPUT_ARCHIVE")]
    pub archive: Option<String>,

    /// Architecture spelling policy: `synonyms`, `bit-width` or `literal`.
    #[arg(long, env = "INPUT_ARCH_POLICY")]
    pub arch_policy: Option<String>,

    /// Only match assets ending in an archive suffix (`true`/`false`).
    #[arg(long, env = "INPUT_REQUIRE_SUFFIX")]
    pub require_suffix: Option<String>,

    /// Leading path components dropped from tarball entries.
    #[arg(long, env = "INPUT_STRIP_COMPONENTS")]
    pub strip_components: Option<String>,

    /// Binary search strategy: `recursive` or `flat`.
    #[arg(long, env = "INPUT_SEARCH")]
    pub search: Option<String>,

    /// Download URL template with `{tool}`, `{tag}`, `{version}`, `{os}`, `{arch}`.
    #[arg(long, env = "INPUT_URL_TEMPLATE")]
    pub url_template: Option<String>,

    /// Extra archive formats to match, comma separated (e.g. `7z,xar`).
    #[arg(long, env = "INPUT_FORMATS")]
    pub formats: Option<String>,

    /// Tool cache root; defaults to `$RUNNER_TOOL_CACHE`.
    #[arg(long)]
    pub tool_cache: Option<PathBuf>,

    /// Scratch directory root for downloads.
    #[arg(long, env = "RUNNER_TEMP", hide_env_values = true)]
    pub temp_dir: Option<PathBuf>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Tracing filter directive (e.g. `relup_install=trace,reqwest=debug`).
    ///
    /// Overrides both `--level` and `RUST_LOG`.
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Print a JSON summary of the install on stdout.
    #[arg(long)]
    pub json: bool,
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Trimmed value, with empty treated as absent.
fn given(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_bool(input: &str, value: &str) -> Result<bool> {
    BoolishValueParser::new()
        .parse_ref(&clap::Command::new("relup"), None, OsStr::new(value))
        .map_err(|_| {
            Error::missing_input(format!(
                "Input '{input}' must be true or false, got '{value}'"
            ))
        })
}

impl Cli {
    /// Tracing settings from the logging flags.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.level.into(),
            filter: given(self.log_filter.as_ref()).map(str::to_string),
        }
    }

    /// Repository from `name`, or from `owner` and `repo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] when neither form is given or the
    /// given one is malformed.
    pub fn repo_id(&self) -> Result<RepoId> {
        match (
            given(self.name.as_ref()),
            given(self.owner.as_ref()),
            given(self.repo.as_ref()),
        ) {
            (Some(name), _, _) => RepoId::parse(name),
            (None, Some(owner), Some(repo)) => RepoId::new(owner, repo),
            _ => Err(Error::missing_input("Missing required input: name")),
        }
    }

    /// The validated install request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for a missing repository or an
    /// invalid tool name.
    pub fn request(&self) -> Result<InstallRequest> {
        let repo = self.repo_id()?;
        let tool = ToolName::from_input(given(self.tool.as_ref()), &repo)?;
        let version = VersionSpec::parse(given(self.version.as_ref()));
        Ok(InstallRequest {
            repo,
            tool,
            version,
        })
    }

    /// Install options for the current host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for malformed option values and
    /// [`Error::UnsupportedArchive`] for unknown archive formats.
    pub fn options(&self) -> Result<InstallOptions> {
        self.options_for(HostPlatform::current())
    }

    /// Install options for a given platform.
    ///
    /// # Errors
    ///
    /// See [`Cli::options`].
    pub fn options_for(&self, platform: HostPlatform) -> Result<InstallOptions> {
        let arch_policy = given(self.arch_policy.as_ref())
            .map(str::parse::<ArchPolicy>)
            .transpose()
            .map_err(Error::missing_input)?
            .unwrap_or_default();

        let suffix_rule = match given(self.require_suffix.as_ref()) {
            Some(value) if parse_bool("require-suffix", value)? => SuffixRule::Required,
            _ => SuffixRule::Optional,
        };

        let archive_override = given(self.archive.as_ref())
            .map(|value| {
                if value.eq_ignore_ascii_case("none") {
                    Ok(ArchiveKind::None)
                } else {
                    ArchiveKind::from_suffix(value)
                }
            })
            .transpose()?;

        let extra_formats = given(self.formats.as_ref())
            .map(ArchiveKind::parse_list)
            .transpose()?
            .unwrap_or_default();

        let strip_components = given(self.strip_components.as_ref())
            .map(|value| {
                value.parse::<usize>().map_err(|_| {
                    Error::missing_input(format!(
                        "Input 'strip-components' must be a non-negative integer, got '{value}'"
                    ))
                })
            })
            .transpose()?
            .unwrap_or(0);

        let search = given(self.search.as_ref())
            .map(str::parse::<SearchStrategy>)
            .transpose()
            .map_err(Error::missing_input)?
            .unwrap_or_default();

        let staging_dir = self
            .temp_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(std::env::temp_dir)
            .join("relup");

        Ok(InstallOptions {
            platform,
            arch_policy,
            suffix_rule,
            extra_formats,
            archive_override,
            strip_components,
            search,
            url_template: given(self.url_template.as_ref()).map(str::to_string),
            staging_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUTS: &[&str] = &[
        "INPUT_NAME",
        "INPUT_OWNER",
        "INPUT_REPO",
        "INPUT_TOOL",
        "INPUT_VERSION",
        "INPUT_ARCHIVE",
        "INPUT_ARCH_POLICY",
        "INPUT_REQUIRE_SUFFIX",
        "INPUT_STRIP_COMPONENTS",
        "INPUT_SEARCH",
        "INPUT_URL_TEMPLATE",
        "INPUT_FORMATS",
        "RUNNER_TEMP",
    ];

    /// Parse with a clean input environment plus `vars`.
    fn parse_with(args: &[&str], vars: &[(&str, &str)]) -> Cli {
        let mut env: Vec<(&str, Option<&str>)> = INPUTS.iter().map(|k| (*k, None)).collect();
        env.extend(vars.iter().map(|(k, v)| (*k, Some(*v))));
        temp_env::with_vars(env, || Cli::try_parse_from(args).unwrap())
    }

    fn linux() -> HostPlatform {
        HostPlatform::new("linux", "x64")
    }

    #[test]
    fn test_defaults() {
        let cli = parse_with(&["relup", "--name", "cli/cli"], &[]);
        let request = cli.request().unwrap();

        assert_eq!(request.repo.to_string(), "cli/cli");
        assert_eq!(request.tool.as_str(), "cli");
        assert_eq!(request.version, VersionSpec::Latest);
        assert!(matches!(cli.level, LogLevel::Info));
        assert!(!cli.json);

        let options = cli.options_for(linux()).unwrap();
        assert_eq!(options.arch_policy, ArchPolicy::Synonyms);
        assert_eq!(options.suffix_rule, SuffixRule::Optional);
        assert_eq!(options.archive_override, None);
        assert!(options.extra_formats.is_empty());
        assert_eq!(options.strip_components, 0);
        assert_eq!(options.search, SearchStrategy::Recursive);
        assert!(options.url_template.is_none());
        assert!(options.staging_dir.ends_with("relup"));
    }

    #[test]
    fn test_action_inputs_from_env() {
        let cli = parse_with(
            &["relup"],
            &[
                ("INPUT_NAME", "BurntSushi/ripgrep"),
                ("INPUT_TOOL", "rg"),
                ("INPUT_VERSION", "14.1.0"),
                ("INPUT_ARCHIVE", "TAR.GZ"),
                ("INPUT_ARCH_POLICY", "bit-width"),
                ("INPUT_REQUIRE_SUFFIX", "true"),
                ("INPUT_STRIP_COMPONENTS", "1"),
                ("INPUT_SEARCH", "flat"),
                ("INPUT_FORMATS", "7z, xar"),
                ("RUNNER_TEMP", "/runner/_temp"),
            ],
        );

        let request = cli.request().unwrap();
        assert_eq!(request.repo.to_string(), "BurntSushi/ripgrep");
        assert_eq!(request.tool.as_str(), "rg");
        assert_eq!(request.version, VersionSpec::Tag("14.1.0".into()));

        let options = cli.options_for(linux()).unwrap();
        assert_eq!(options.archive_override, Some(ArchiveKind::TarGz));
        assert_eq!(options.arch_policy, ArchPolicy::BitWidth);
        assert_eq!(options.suffix_rule, SuffixRule::Required);
        assert_eq!(options.strip_components, 1);
        assert_eq!(options.search, SearchStrategy::Flat);
        assert_eq!(
            options.extra_formats,
            vec![ArchiveKind::SevenZip, ArchiveKind::Xar]
        );
        assert_eq!(options.staging_dir, PathBuf::from("/runner/_temp/relup"));
    }

    #[test]
    fn test_empty_inputs_are_absent() {
        let cli = parse_with(
            &["relup"],
            &[
                ("INPUT_NAME", "owner/tool"),
                ("INPUT_TOOL", ""),
                ("INPUT_VERSION", ""),
                ("INPUT_ARCHIVE", ""),
                ("INPUT_STRIP_COMPONENTS", ""),
            ],
        );

        let request = cli.request().unwrap();
        assert_eq!(request.tool.as_str(), "tool");
        assert_eq!(request.version, VersionSpec::Latest);

        let options = cli.options_for(linux()).unwrap();
        assert_eq!(options.archive_override, None);
        assert_eq!(options.strip_components, 0);
    }

    #[test]
    fn test_owner_and_repo() {
        let cli = parse_with(&["relup", "--owner", "cli", "--repo", "cli"], &[]);
        assert_eq!(cli.repo_id().unwrap().to_string(), "cli/cli");
    }

    #[test]
    fn test_name_takes_precedence() {
        let cli = parse_with(
            &["relup", "--name", "a/b", "--owner", "c", "--repo", "d"],
            &[],
        );
        assert_eq!(cli.repo_id().unwrap().to_string(), "a/b");
    }

    #[test]
    fn test_missing_name() {
        let cli = parse_with(&["relup", "--owner", "cli"], &[]);
        let err = cli.request().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Missing required input: name"
        );
    }

    #[test]
    fn test_invalid_tool_name() {
        let cli = parse_with(&["relup", "--name", "o/r", "--tool", "rg;rm"], &[]);
        assert!(matches!(cli.request(), Err(Error::MissingInput { .. })));
    }

    #[test]
    fn test_invalid_option_values() {
        let cases: &[&[&str]] = &[
            &["--arch-policy", "fuzzy"],
            &["--require-suffix", "maybe"],
            &["--strip-components", "two"],
            &["--search", "breadth"],
        ];

        for extra in cases {
            let mut args = vec!["relup", "--name", "o/r"];
            args.extend_from_slice(extra);
            let cli = parse_with(&args, &[]);
            assert!(
                matches!(cli.options_for(linux()), Err(Error::MissingInput { .. })),
                "expected MissingInput for {extra:?}"
            );
        }
    }

    #[test]
    fn test_unsupported_archive() {
        let cli = parse_with(&["relup", "--name", "o/r", "--archive", "rar"], &[]);
        let err = cli.options_for(linux()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported archive format: '.rar'");
    }

    #[test]
    fn test_archive_none() {
        let cli = parse_with(&["relup", "--name", "o/r", "--archive", "None"], &[]);
        let options = cli.options_for(linux()).unwrap();
        assert_eq!(options.archive_override, Some(ArchiveKind::None));
    }

    #[test]
    fn test_log_flags() {
        let cli = parse_with(
            &["relup", "-L", "debug", "--log-format", "json", "--json"],
            &[],
        );
        let config = cli.tracing_config();
        assert_eq!(config.level, crate::tracing::Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Json);
        assert!(config.filter.is_none());
        assert!(cli.json);
    }

    #[test]
    fn test_log_filter() {
        let cli = parse_with(
            &["relup", "--log-filter", "relup_install=trace"],
            &[],
        );
        assert_eq!(
            cli.tracing_config().filter.as_deref(),
            Some("relup_install=trace")
        );

        let cli = parse_with(&["relup", "--log-filter", " "], &[]);
        assert!(cli.tracing_config().filter.is_none());
    }

    #[test]
    fn test_parse_bool() {
        for value in ["true", "TRUE", "yes", "on", "1"] {
            assert!(parse_bool("require-suffix", value).unwrap(), "{value}");
        }
        for value in ["false", "No", "off", "0"] {
            assert!(!parse_bool("require-suffix", value).unwrap(), "{value}");
        }
        let err = parse_bool("require-suffix", "maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Input 'require-suffix' must be true or false, got 'maybe'"
        );
    }
}
