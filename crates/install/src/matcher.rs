//! Asset selection.
//!
//! Builds the case-insensitive pattern
//! `^<tool>.+<os>.+<arch>(\.<suffix>)?$` from escaped parts and requires
//! exactly one asset of a release to match it.

use regex::{Regex, RegexBuilder};
use relup_core::inputs::ToolName;
use relup_core::tools::{
    ArchPattern, ArchiveKind, AssetDescriptor, PlatformSignature, ReleaseDescriptor,
};
use relup_core::{Error, Result};
use std::fmt;
use tracing::{debug, info};

/// Whether an archive suffix is part of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuffixRule {
    /// Names with or without a recognized suffix match.
    #[default]
    Optional,
    /// Only names ending in a recognized suffix match.
    Required,
}

/// Typed asset name pattern.
///
/// Every literal part is escaped before it reaches the regex engine, so tool
/// names and OS strings never act as metacharacters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPattern {
    tool: String,
    os: String,
    arch: ArchPattern,
    suffixes: Vec<ArchiveKind>,
    rule: SuffixRule,
}

impl AssetPattern {
    /// Pattern for a tool on a platform, accepting the sniffed formats.
    #[must_use]
    pub fn new(tool: &ToolName, signature: &PlatformSignature) -> Self {
        Self {
            tool: tool.as_str().to_string(),
            os: signature.os.clone(),
            arch: signature.arch.clone(),
            suffixes: ArchiveKind::SNIFFED.to_vec(),
            rule: SuffixRule::Optional,
        }
    }

    /// Also accept these archive formats.
    #[must_use]
    pub fn with_formats(mut self, kinds: impl IntoIterator<Item = ArchiveKind>) -> Self {
        for kind in kinds {
            if kind != ArchiveKind::None && !self.suffixes.contains(&kind) {
                self.suffixes.push(kind);
            }
        }
        self
    }

    /// Set whether a suffix is required.
    #[must_use]
    pub const fn with_rule(mut self, rule: SuffixRule) -> Self {
        self.rule = rule;
        self
    }

    /// Archive formats this pattern recognizes.
    #[must_use]
    pub fn formats(&self) -> &[ArchiveKind] {
        &self.suffixes
    }

    /// Render the pattern source.
    #[must_use]
    pub fn to_regex_string(&self) -> String {
        let alternatives: Vec<String> = self
            .suffixes
            .iter()
            .map(|kind| regex::escape(kind.suffix().trim_start_matches('.')))
            .collect();

        let suffix = match (alternatives.is_empty(), self.rule) {
            (true, _) => String::new(),
            (false, SuffixRule::Optional) => format!("([.]({}))?", alternatives.join("|")),
            (false, SuffixRule::Required) => format!("[.]({})", alternatives.join("|")),
        };

        format!(
            "^{}.+{}.+{}{}$",
            regex::escape(&self.tool),
            regex::escape(&self.os),
            self.arch.to_regex(),
            suffix
        )
    }

    /// Compile into a case-insensitive regex.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] if the pattern cannot be compiled.
    pub fn compile(&self) -> Result<Regex> {
        RegexBuilder::new(&self.to_regex_string())
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::missing_input(format!("Invalid asset pattern: {e}")))
    }
}

impl fmt::Display for AssetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_regex_string())
    }
}

/// The single asset chosen for this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The matched asset.
    pub asset: AssetDescriptor,
    /// How the asset is packed.
    pub archive_kind: ArchiveKind,
}

impl MatchResult {
    /// Download URL of the matched asset.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.asset.download_url
    }
}

/// Select the one asset of `release` matching `pattern`.
///
/// The archive kind comes from `archive_override` when set, otherwise from
/// the asset name's suffix.
///
/// # Errors
///
/// Returns [`Error::NoAsset`] when nothing matches and
/// [`Error::AmbiguousAsset`] when more than one asset does. Both carry the
/// full list of asset names.
pub fn match_asset(
    release: &ReleaseDescriptor,
    pattern: &AssetPattern,
    archive_override: Option<ArchiveKind>,
) -> Result<MatchResult> {
    let regex = pattern.compile()?;
    debug!(pattern = %pattern, tag = release.tag(), "Matching release assets");

    let mut matches = release
        .assets()
        .iter()
        .filter(|asset| regex.is_match(&asset.name));

    let first = matches.next();
    let rest: Vec<&AssetDescriptor> = matches.collect();

    let asset = match (first, rest.is_empty()) {
        (Some(asset), true) => asset,
        (None, _) => {
            return Err(Error::NoAsset {
                pattern: pattern.to_string(),
                available: release.asset_names(),
            });
        }
        (Some(asset), false) => {
            let matched = std::iter::once(asset)
                .chain(rest)
                .map(|a| a.name.clone())
                .collect();
            return Err(Error::AmbiguousAsset {
                pattern: pattern.to_string(),
                matches: matched,
                available: release.asset_names(),
            });
        }
    };

    let archive_kind =
        archive_override.unwrap_or_else(|| ArchiveKind::sniff(&asset.name, pattern.formats()));

    info!(asset = %asset.name, archive = %archive_kind, "Selected release asset");
    Ok(MatchResult {
        asset: asset.clone(),
        archive_kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relup_core::tools::{ArchPolicy, HostPlatform};

    fn release(names: &[&str]) -> ReleaseDescriptor {
        let assets = names
            .iter()
            .map(|n| AssetDescriptor::new(*n, format!("https://example.com/dl/{n}")))
            .collect();
        ReleaseDescriptor::new("v1.0.0", assets).unwrap()
    }

    fn linux_x64(tool: &str) -> AssetPattern {
        let signature =
            PlatformSignature::build(&HostPlatform::new("linux", "x64"), ArchPolicy::Synonyms);
        AssetPattern::new(&ToolName::new(tool).unwrap(), &signature)
    }

    #[test]
    fn test_pattern_source() {
        assert_eq!(
            linux_x64("tool").to_string(),
            r"^tool.+linux.+(amd64|x64|x86_64)([.](zip|tar\.gz))?$"
        );
        assert_eq!(
            linux_x64("tool").with_rule(SuffixRule::Required).to_string(),
            r"^tool.+linux.+(amd64|x64|x86_64)[.](zip|tar\.gz)$"
        );
    }

    #[test]
    fn test_pattern_with_extra_formats() {
        let pattern = linux_x64("tool").with_formats([ArchiveKind::SevenZip, ArchiveKind::Zip]);
        assert_eq!(
            pattern.formats(),
            &[ArchiveKind::Zip, ArchiveKind::TarGz, ArchiveKind::SevenZip]
        );
        assert!(pattern.to_string().ends_with(r"([.](zip|tar\.gz|7z))?$"));
    }

    #[test]
    fn test_selects_platform_asset() {
        let release = release(&["tool-linux-amd64.tar.gz", "tool-windows-amd64.zip"]);
        let result = match_asset(&release, &linux_x64("tool"), None).unwrap();

        assert_eq!(result.asset.name, "tool-linux-amd64.tar.gz");
        assert_eq!(result.url(), "https://example.com/dl/tool-linux-amd64.tar.gz");
        assert_eq!(result.archive_kind, ArchiveKind::TarGz);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let release = release(&["Tool_Linux_X86_64.ZIP", "tool-darwin-arm64.zip"]);
        let result = match_asset(&release, &linux_x64("tool"), None).unwrap();

        assert_eq!(result.asset.name, "Tool_Linux_X86_64.ZIP");
        assert_eq!(result.archive_kind, ArchiveKind::Zip);
    }

    #[test]
    fn test_bare_binary_is_unpacked_kind() {
        let release = release(&["tool-linux-x64", "tool-linux-arm64"]);
        let result = match_asset(&release, &linux_x64("tool"), None).unwrap();

        assert_eq!(result.asset.name, "tool-linux-x64");
        assert_eq!(result.archive_kind, ArchiveKind::None);
    }

    #[test]
    fn test_unknown_suffix_does_not_match() {
        let release = release(&["tool-linux-amd64.tar.gz.sha256", "tool-linux-amd64.deb"]);
        let err = match_asset(&release, &linux_x64("tool"), None).unwrap_err();
        assert!(matches!(err, Error::NoAsset { .. }));
    }

    #[test]
    fn test_no_match_lists_all_assets() {
        let release = release(&["tool-darwin-arm64.zip", "checksums.txt"]);
        let err = match_asset(&release, &linux_x64("tool"), None).unwrap_err();

        match err {
            Error::NoAsset { available, .. } => {
                assert_eq!(available, vec!["tool-darwin-arm64.zip", "checksums.txt"]);
            }
            other => panic!("expected NoAsset, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_matches_are_ambiguous() {
        let release = release(&[
            "tool-linux-amd64",
            "tool-linux-amd64.tar.gz",
            "tool-windows-amd64.zip",
        ]);
        let err = match_asset(&release, &linux_x64("tool"), None).unwrap_err();

        match err {
            Error::AmbiguousAsset {
                matches, available, ..
            } => {
                assert_eq!(matches, vec!["tool-linux-amd64", "tool-linux-amd64.tar.gz"]);
                assert_eq!(available.len(), 3);
            }
            other => panic!("expected AmbiguousAsset, got {other:?}"),
        }
    }

    #[test]
    fn test_required_suffix_resolves_ambiguity() {
        let release = release(&["tool-linux-amd64", "tool-linux-amd64.tar.gz"]);
        let pattern = linux_x64("tool").with_rule(SuffixRule::Required);
        let result = match_asset(&release, &pattern, None).unwrap();

        assert_eq!(result.asset.name, "tool-linux-amd64.tar.gz");
    }

    #[test]
    fn test_archive_override_wins() {
        let release = release(&["tool-linux-amd64.tar.gz"]);
        let result =
            match_asset(&release, &linux_x64("tool"), Some(ArchiveKind::None)).unwrap();

        assert_eq!(result.archive_kind, ArchiveKind::None);
    }

    #[test]
    fn test_tool_name_is_escaped() {
        let release = release(&["my-tool-linux-amd64.zip", "mytool-linux-amd64.zip"]);
        let result = match_asset(&release, &linux_x64("my-tool"), None).unwrap();
        assert_eq!(result.asset.name, "my-tool-linux-amd64.zip");
    }

    #[test]
    fn test_literal_policy_only_matches_amd64() {
        let signature =
            PlatformSignature::build(&HostPlatform::new("linux", "x64"), ArchPolicy::Literal);
        let pattern = AssetPattern::new(&ToolName::new("tool").unwrap(), &signature);
        let release = release(&["tool-linux-x86_64.zip", "tool-linux-amd64.zip"]);

        let result = match_asset(&release, &pattern, None).unwrap();
        assert_eq!(result.asset.name, "tool-linux-amd64.zip");
    }

    #[test]
    fn test_bit_width_policy() {
        let signature =
            PlatformSignature::build(&HostPlatform::new("linux", "x64"), ArchPolicy::BitWidth);
        let pattern = AssetPattern::new(&ToolName::new("tool").unwrap(), &signature);
        let release = release(&["tool-linux-64bit.tar.gz", "tool-linux-32bit.tar.gz"]);

        let result = match_asset(&release, &pattern, None).unwrap();
        assert_eq!(result.asset.name, "tool-linux-64bit.tar.gz");
    }
}
