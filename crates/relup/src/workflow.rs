//! GitHub Actions workflow commands.
//!
//! `GITHUB_PATH` and `GITHUB_OUTPUT` are files the runner reads after the
//! step finishes. Without them (plain CLI use) the same information is
//! written to stdout in the legacy `::command::` form.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the file of directories to add to `PATH`.
pub const PATH_FILE_ENV: &str = "GITHUB_PATH";

/// Environment variable naming the step output file.
pub const OUTPUT_FILE_ENV: &str = "GITHUB_OUTPUT";

/// Destination for workflow commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    path_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Workflow {
    /// Create a workflow writer for explicit command files.
    #[must_use]
    pub fn new(path_file: Option<PathBuf>, output_file: Option<PathBuf>) -> Self {
        Self {
            path_file,
            output_file,
        }
    }

    /// Read the command files from `GITHUB_PATH` and `GITHUB_OUTPUT`.
    #[must_use]
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(file(PATH_FILE_ENV), file(OUTPUT_FILE_ENV))
    }

    /// Make `dir` available on `PATH` for later steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the path file or `out` cannot be written.
    pub fn add_path(&self, dir: &Path, out: &mut dyn Write) -> io::Result<()> {
        debug!(?dir, "Adding directory to PATH");
        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", dir.display())),
            None => writeln!(out, "::add-path::{}", dir.display()),
        }
    }

    /// Set a step output.
    ///
    /// Multi-line values use a heredoc delimiter that cannot occur in the
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file or `out` cannot be written.
    pub fn set_output(&self, name: &str, value: &str, out: &mut dyn Write) -> io::Result<()> {
        debug!(name, value, "Setting output");
        match &self.output_file {
            Some(file) => append(file, &output_entry(name, value)),
            None => writeln!(
                out,
                "::set-output name={}::{}",
                escape_property(name),
                escape_data(value)
            ),
        }
    }

    /// Report a failure annotation.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` cannot be written.
    pub fn error(&self, message: &str, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "::error::{}", escape_data(message))
    }
}

fn append(file: &Path, content: &str) -> io::Result<()> {
    let mut handle = OpenOptions::new().create(true).append(true).open(file)?;
    handle.write_all(content.as_bytes())
}

fn output_entry(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

/// Escape a command message.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_path_appends_to_file() {
        let temp = TempDir::new().unwrap();
        let path_file = temp.path().join("path");
        std::fs::write(&path_file, "/existing\n").unwrap();
        let workflow = Workflow::new(Some(path_file.clone()), None);
        let mut out = Vec::new();

        workflow
            .add_path(Path::new("/cache/tool/1.0.0/x64"), &mut out)
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path_file).unwrap(),
            "/existing\n/cache/tool/1.0.0/x64\n"
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_commands_without_files_go_to_stdout() {
        let workflow = Workflow::default();
        let mut out = Vec::new();

        workflow.add_path(Path::new("/opt/bin"), &mut out).unwrap();
        workflow.set_output("version", "v1.2.3", &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "::add-path::/opt/bin\n::set-output name=version::v1.2.3\n"
        );
    }

    #[test]
    fn test_set_output_appends_to_file() {
        let temp = TempDir::new().unwrap();
        let output_file = temp.path().join("output");
        let workflow = Workflow::new(None, Some(output_file.clone()));
        let mut out = Vec::new();

        workflow.set_output("version", "v1.2.3", &mut out).unwrap();
        workflow.set_output("cached", "false", &mut out).unwrap();

        assert_eq!(
            std::fs::read_to_string(&output_file).unwrap(),
            "version=v1.2.3\ncached=false\n"
        );
    }

    #[test]
    fn test_multiline_output_uses_delimiter() {
        let entry = output_entry("notes", "line one\nline two");
        let mut lines = entry.lines();

        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("notes<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines.next(), Some("line one"));
        assert_eq!(lines.next(), Some("line two"));
        assert_eq!(lines.next(), Some(delimiter));
    }

    #[test]
    fn test_error_is_escaped() {
        let mut out = Vec::new();
        Workflow::default()
            .error("100% failed\nsecond line", &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "::error::100%25 failed%0Asecond line\n"
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                (PATH_FILE_ENV, Some("/runner/path")),
                (OUTPUT_FILE_ENV, Some("")),
            ],
            || {
                let workflow = Workflow::from_env();
                assert_eq!(workflow.path_file, Some(PathBuf::from("/runner/path")));
                assert_eq!(workflow.output_file, None);
            },
        );
    }
}
