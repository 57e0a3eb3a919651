//! Binary discovery in an unpacked asset.

use regex::{Regex, RegexBuilder};
use relup_core::inputs::ToolName;
use relup_core::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Where to look for the binary below the extraction root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Depth-first over the whole tree, siblings in name order.
    #[default]
    Recursive,
    /// Only `<root>/<tool>`.
    Flat,
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "recursive" => Ok(Self::Recursive),
            "flat" => Ok(Self::Flat),
            _ => Err(format!("Unknown search strategy: {s}")),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursive => f.write_str("recursive"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

/// File name pattern for a tool's binary.
///
/// Accepts `<tool>`, `<tool>_<os>_<arch>` and the platform's executable
/// suffix, case-insensitively.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if the pattern cannot be compiled.
pub fn binary_name_regex(tool: &ToolName) -> Result<Regex> {
    let exe = match std::env::consts::EXE_SUFFIX {
        "" => String::new(),
        suffix => format!("({})?", regex::escape(suffix)),
    };
    let source = format!("^{}(_[a-z]+_[a-z0-9]+)?{exe}$", regex::escape(tool.as_str()));

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::missing_input(format!("Invalid binary pattern: {e}")))
}

/// Find the tool's binary under `root`.
///
/// A `root` that is itself a file is returned unchanged: unpacked assets are
/// their own binary.
///
/// # Errors
///
/// Returns [`Error::BinaryNotFound`] when no file matches, or
/// [`Error::Io`] if the tree cannot be read.
pub fn locate_binary(root: &Path, tool: &ToolName, strategy: SearchStrategy) -> Result<PathBuf> {
    if root.is_file() {
        return Ok(root.to_path_buf());
    }

    let found = match strategy {
        SearchStrategy::Flat => find_flat(root, tool),
        SearchStrategy::Recursive => find_recursive(root, &binary_name_regex(tool)?)?,
    };

    match found {
        Some(path) => {
            debug!(?path, %strategy, "Located binary");
            Ok(path)
        }
        None => Err(Error::binary_not_found(tool.as_str(), root)),
    }
}

fn find_flat(root: &Path, tool: &ToolName) -> Option<PathBuf> {
    [
        format!("{tool}{}", std::env::consts::EXE_SUFFIX),
        tool.to_string(),
    ]
    .into_iter()
    .map(|name| root.join(name))
    .find(|path| path.is_file())
}

fn find_recursive(root: &Path, pattern: &Regex) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if pattern.is_match(&name) && entry.path().is_file() {
            return Ok(Some(entry.into_path()));
        }
        trace!(path = ?entry.path(), "Not the binary");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tool(name: &str) -> ToolName {
        ToolName::new(name).unwrap()
    }

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_binary_name_regex() {
        let pattern = binary_name_regex(&tool("tool")).unwrap();

        assert!(pattern.is_match("tool"));
        assert!(pattern.is_match("tool_linux_amd64"));
        assert!(pattern.is_match("Tool_Darwin_ARM64"));
        assert!(!pattern.is_match("tool-linux-amd64"));
        assert!(!pattern.is_match("tool_linux"));
        assert!(!pattern.is_match("readme.txt"));
        assert!(!pattern.is_match("mytool"));
        assert!(!pattern.is_match("tool.sha256"));
    }

    #[test]
    fn test_finds_nested_platform_binary() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "readme.txt");
        let binary = touch(temp.path(), "bin/tool_linux_amd64");

        let found = locate_binary(temp.path(), &tool("tool"), SearchStrategy::Recursive).unwrap();
        assert_eq!(found, binary);
    }

    #[test]
    fn test_first_match_in_name_order() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b/tool");
        let first = touch(temp.path(), "a/deep/tool");

        let found = locate_binary(temp.path(), &tool("tool"), SearchStrategy::Recursive).unwrap();
        assert_eq!(found, first);
    }

    #[test]
    fn test_directory_named_like_tool_is_skipped() {
        let temp = TempDir::new().unwrap();
        let binary = touch(temp.path(), "tool/tool");

        let found = locate_binary(temp.path(), &tool("tool"), SearchStrategy::Recursive).unwrap();
        assert_eq!(found, binary);
    }

    #[test]
    fn test_not_found() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "readme.txt");
        touch(temp.path(), "LICENSE");

        let err =
            locate_binary(temp.path(), &tool("tool"), SearchStrategy::Recursive).unwrap_err();
        match err {
            Error::BinaryNotFound { tool, root } => {
                assert_eq!(tool, "tool");
                assert_eq!(root, temp.path());
            }
            other => panic!("expected BinaryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_only_checks_root() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "bin/tool");

        assert!(locate_binary(temp.path(), &tool("tool"), SearchStrategy::Flat).is_err());

        let binary = touch(temp.path(), "tool");
        let found = locate_binary(temp.path(), &tool("tool"), SearchStrategy::Flat).unwrap();
        assert_eq!(found, binary);
    }

    #[test]
    fn test_file_root_is_the_binary() {
        let temp = TempDir::new().unwrap();
        let binary = touch(temp.path(), "tool-linux-amd64");

        let found = locate_binary(&binary, &tool("tool"), SearchStrategy::Recursive).unwrap();
        assert_eq!(found, binary);
    }

    #[test]
    fn test_search_strategy_from_str() {
        assert_eq!("".parse::<SearchStrategy>().unwrap(), SearchStrategy::Recursive);
        assert_eq!("Flat".parse::<SearchStrategy>().unwrap(), SearchStrategy::Flat);
        assert!("breadth".parse::<SearchStrategy>().is_err());
    }
}
