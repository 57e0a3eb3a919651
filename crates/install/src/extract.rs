//! Archive extraction.
//!
//! Zip and gzip-compressed tarballs are unpacked in-process. 7z and xar
//! archives go through the `7z` and `xar` command line tools, which must be
//! on `PATH`.

use flate2::read::GzDecoder;
use relup_core::tools::ArchiveKind;
use relup_core::{Error, Result};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tokio::process::Command;
use tracing::{debug, trace};

/// Extraction settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Leading path components dropped from tarball entries.
    pub strip_components: usize,
}

/// Unpack `archive` according to `kind`.
///
/// Returns the directory holding the unpacked tree, or `archive` itself for
/// [`ArchiveKind::None`]. Any existing content at `dest` is replaced.
///
/// # Errors
///
/// Returns [`Error::Download`] when the archive is corrupt or truncated, or
/// when an external extractor is missing or fails.
pub async fn extract(
    archive: &Path,
    kind: ArchiveKind,
    dest: &Path,
    options: &ExtractOptions,
) -> Result<PathBuf> {
    debug!(?archive, %kind, ?dest, "Extracting asset");

    match kind {
        ArchiveKind::None => Ok(archive.to_path_buf()),
        ArchiveKind::Zip => {
            unpack_atomically(dest, |tmp| extract_zip(archive, tmp))?;
            Ok(dest.to_path_buf())
        }
        ArchiveKind::TarGz => {
            unpack_atomically(dest, |tmp| {
                extract_tar_gz(archive, tmp, options.strip_components)
            })?;
            Ok(dest.to_path_buf())
        }
        ArchiveKind::SevenZip => {
            fresh_dir(dest)?;
            let mut command = Command::new("7z");
            command
                .arg("x")
                .arg("-y")
                .arg(format!("-o{}", dest.display()))
                .arg(archive);
            run_extractor(archive, command).await?;
            Ok(dest.to_path_buf())
        }
        ArchiveKind::Xar => {
            fresh_dir(dest)?;
            let mut command = Command::new("xar");
            command.arg("-x").arg("-C").arg(dest).arg("-f").arg(archive);
            run_extractor(archive, command).await?;
            Ok(dest.to_path_buf())
        }
    }
}

/// Error for an archive that cannot be read.
fn corrupt(archive: &Path, message: impl std::fmt::Display) -> Error {
    Error::download(archive.display().to_string(), format!("Corrupt archive: {message}"))
}

fn fresh_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Unpack into a sibling temp directory, then move it into place.
fn unpack_atomically(dest: &Path, unpack: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let temp_dir = dest.with_file_name(format!(
        ".{}.tmp",
        dest.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("extract")
    ));

    fresh_dir(&temp_dir)?;

    if let Err(e) = unpack(&temp_dir) {
        let _ = std::fs::remove_dir_all(&temp_dir);
        return Err(e);
    }

    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::rename(&temp_dir, dest)?;
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| corrupt(archive, e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| corrupt(archive, e))?;

        let Some(relative) = entry.enclosed_name() else {
            trace!(name = entry.name(), "Skipping zip entry outside the destination");
            continue;
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&outpath)?;
        std::io::copy(&mut entry, &mut out).map_err(|e| corrupt(archive, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }

    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path, strip_components: usize) -> Result<()> {
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    let root = dest.canonicalize()?;

    for entry in tar.entries().map_err(|e| corrupt(archive, e))? {
        let mut entry = entry.map_err(|e| corrupt(archive, e))?;
        let path = entry.path().map_err(|e| corrupt(archive, e))?.into_owned();

        let Some(relative) = strip_path(&path, strip_components) else {
            trace!(?path, "Skipping tar entry");
            continue;
        };
        if traverses_symlink(&root, &relative) {
            return Err(corrupt(
                archive,
                format!("Entry {} escapes through a symlink", path.display()),
            ));
        }
        let outpath = root.join(&relative);

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(|e| corrupt(archive, e))?
                .map(std::borrow::Cow::into_owned)
                .ok_or_else(|| corrupt(archive, format!("Link {} has no target", path.display())))?;

            if kind.is_hard_link() {
                let Some(source) = strip_path(&target, strip_components)
                    .filter(|source| !traverses_symlink(&root, source))
                else {
                    return Err(corrupt(
                        archive,
                        format!("Hard link {} points outside the archive", path.display()),
                    ));
                };
                create_parent(archive, &root, &outpath)?;
                std::fs::hard_link(root.join(source), &outpath)
                    .map_err(|e| corrupt(archive, e))?;
                continue;
            }

            if !link_stays_inside(&relative, &target) {
                return Err(corrupt(
                    archive,
                    format!(
                        "Symlink {} -> {} points outside the archive",
                        path.display(),
                        target.display()
                    ),
                ));
            }
        }

        create_parent(archive, &root, &outpath)?;
        if std::fs::symlink_metadata(&outpath).is_ok_and(|m| m.file_type().is_symlink()) {
            std::fs::remove_file(&outpath)?;
        }
        entry.unpack(&outpath).map_err(|e| corrupt(archive, e))?;
    }

    Ok(())
}

/// Create the parent of `outpath`, which must resolve inside `root`.
fn create_parent(archive: &Path, root: &Path, outpath: &Path) -> Result<()> {
    let Some(parent) = outpath.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent)?;
    if !parent.canonicalize()?.starts_with(root) {
        return Err(corrupt(
            archive,
            format!("Entry {} resolves outside the extraction directory", outpath.display()),
        ));
    }
    Ok(())
}

/// Whether any existing directory on the way to `relative` is a symlink.
fn traverses_symlink(root: &Path, relative: &Path) -> bool {
    let Some(parent) = relative.parent() else {
        return false;
    };
    let mut current = root.to_path_buf();
    parent.components().any(|component| {
        current.push(component);
        std::fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink())
    })
}

/// Whether a symlink at `relative` pointing at `target` stays inside the tree.
fn link_stays_inside(relative: &Path, target: &Path) -> bool {
    let mut depth = relative
        .parent()
        .map_or(0, |parent| parent.components().count());
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Drop `count` leading components from an entry path.
///
/// Returns `None` for entries consumed entirely by the strip and for paths
/// that are absolute or climb out with `..`.
fn strip_path(path: &Path, count: usize) -> Option<PathBuf> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.len() <= count {
        return None;
    }
    Some(parts[count..].iter().collect())
}

/// Run an external extractor, mapping failures to a download error.
async fn run_extractor(archive: &Path, mut command: Command) -> Result<()> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    debug!(%program, "Running external extractor");

    let output = command
        .output()
        .await
        .map_err(|e| corrupt(archive, format!("Failed to run {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(corrupt(
            archive,
            format!("{program} exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(())
}
