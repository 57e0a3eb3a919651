//! Install pipeline for relup.
//!
//! Turns a repository, tool name and version into an executable on disk:
//!
//! 1. [`resolve_release`] picks the concrete release for `latest` or a tag
//! 2. [`AssetPattern`] and [`match_asset`] select the one asset for the host
//! 3. [`extract`] unpacks it according to its [`ArchiveKind`](relup_core::tools::ArchiveKind)
//! 4. [`locate_binary`] finds the executable in the unpacked tree
//! 5. [`Installer`] runs the stages and stores the result in the tool cache

mod extract;
mod locate;
mod matcher;
mod pipeline;
mod resolver;

pub use extract::{ExtractOptions, extract};
pub use locate::{SearchStrategy, binary_name_regex, locate_binary};
pub use matcher::{AssetPattern, MatchResult, SuffixRule, match_asset};
pub use pipeline::{InstallOptions, InstallOutcome, InstallRequest, Installer, expand_url_template};
pub use resolver::resolve_release;
