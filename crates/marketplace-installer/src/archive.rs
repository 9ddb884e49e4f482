use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use marketplace_core::ExtractionOutcome;

use crate::fs_utils::{immediate_files, immediate_subdirs, remove_dir_if_exists, remove_file_if_exists};

/// Names the archive layout detection looks for.
#[derive(Debug, Clone, Copy)]
pub struct LayoutHints<'a> {
    /// Subdirectory the release archive is known to wrap its files in.
    pub expected_dir: &'a str,
    /// Case-insensitive fragment accepted for a renamed wrapper directory.
    pub keyword: &'a str,
}

/// Extracts `archive_bytes` into `target_dir` and lifts a wrapping
/// subdirectory, if there is one, into `target_dir` itself.
pub fn install_archive(
    archive_bytes: &[u8],
    target_dir: &Path,
    hints: LayoutHints<'_>,
) -> Result<ExtractionOutcome> {
    fs::create_dir_all(target_dir)
        .with_context(|| format!("failed to create {}", target_dir.display()))?;
    let extracted = extract_zip_bytes(archive_bytes, target_dir)?;
    tracing::info!(
        target = %target_dir.display(),
        entries = extracted,
        "archive extracted"
    );

    let outcome = detect_layout(target_dir, hints)?;
    tracing::info!(layout = outcome.as_str(), "archive layout detected");
    if let ExtractionOutcome::NestedLayout(name) = &outcome {
        flatten_nested_dir(target_dir, name)?;
    }
    Ok(outcome)
}

/// Writes every safely enclosed entry below `dst`, overwriting existing
/// files. Returns the number of entries written.
pub(crate) fn extract_zip_bytes(archive_bytes: &[u8], dst: &Path) -> Result<usize> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(archive_bytes)).context("failed to read zip archive")?;

    let mut written = 0_usize;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read zip entry #{index}"))?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping zip entry outside the target directory");
            continue;
        };
        let out_path = dst.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create {}", out_path.display()))?;
            written += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut out = fs::File::create(&out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        written += 1;
    }
    Ok(written)
}

pub(crate) fn detect_layout(target_dir: &Path, hints: LayoutHints<'_>) -> Result<ExtractionOutcome> {
    if target_dir.join(hints.expected_dir).is_dir() {
        return Ok(ExtractionOutcome::NestedLayout(hints.expected_dir.to_string()));
    }
    tracing::warn!(
        expected = hints.expected_dir,
        target = %target_dir.display(),
        "expected subdirectory not found; checking alternatives"
    );

    let subdirs = immediate_subdirs(target_dir)
        .with_context(|| format!("failed to list {}", target_dir.display()))?;
    if let [only] = subdirs.as_slice() {
        let name = only
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let keyword = hints.keyword.to_lowercase();
        if name.eq_ignore_ascii_case(hints.expected_dir)
            || (!keyword.is_empty() && name.to_lowercase().contains(&keyword))
        {
            tracing::warn!(
                actual = name,
                expected = hints.expected_dir,
                "archive wrapped in a differently named subdirectory"
            );
            return Ok(ExtractionOutcome::NestedLayout(name.to_string()));
        }
    }

    if subdirs.is_empty() {
        let files = immediate_files(target_dir)
            .with_context(|| format!("failed to list {}", target_dir.display()))?;
        if files.iter().any(|file| is_plugin_file(file)) {
            return Ok(ExtractionOutcome::FlatLayout);
        }
    }

    tracing::warn!(
        target = %target_dir.display(),
        subdirs = subdirs.len(),
        "archive layout not recognized; leaving files as extracted"
    );
    Ok(ExtractionOutcome::Unrecognized)
}

fn is_plugin_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".js") || lower == "manifest.json"
}

/// Moves everything inside `target_dir/<name>` up into `target_dir`, then
/// removes the emptied directory. Cleanup of the leftover is best-effort.
///
/// Nothing is moved when any entry would land on a destination of the other
/// kind (a file on a directory or a directory on a file).
pub(crate) fn flatten_nested_dir(target_dir: &Path, name: &str) -> Result<()> {
    let mut source = target_dir.join(name);
    tracing::info!(
        source = %source.display(),
        target = %target_dir.display(),
        "moving extracted items to plugin root"
    );

    let files = entry_names(
        immediate_files(&source).with_context(|| format!("failed to list {}", source.display()))?,
    )?;
    let dirs = entry_names(
        immediate_subdirs(&source)
            .with_context(|| format!("failed to list {}", source.display()))?,
    )?;
    ensure_no_kind_conflicts(target_dir, name, &files, &dirs)?;

    // An entry sharing the wrapper's name would land on the wrapper itself.
    if source.join(name).exists() {
        let staging = target_dir.join(format!(".{name}.flatten-{}", std::process::id()));
        fs::rename(&source, &staging).with_context(|| {
            format!(
                "failed to stage {} before flattening",
                source.display()
            )
        })?;
        source = staging;
    }

    for file in &files {
        let from = source.join(file);
        let dest = target_dir.join(file);
        remove_file_if_exists(&dest)
            .with_context(|| format!("failed to replace {}", dest.display()))?;
        fs::rename(&from, &dest).with_context(|| {
            format!("failed to move {} to {}", from.display(), dest.display())
        })?;
    }

    for dir in &dirs {
        let from = source.join(dir);
        let dest = target_dir.join(dir);
        if remove_dir_if_exists(&dest)
            .with_context(|| format!("failed to replace {}", dest.display()))?
        {
            tracing::debug!(path = %dest.display(), "removed existing directory before move");
        }
        move_dir_or_copy(&from, &dest)?;
    }

    if let Err(err) = fs::remove_dir_all(&source) {
        tracing::warn!(
            path = %source.display(),
            error = %err,
            "could not delete leftover extracted subdirectory"
        );
    }
    Ok(())
}

fn entry_names(paths: Vec<PathBuf>) -> Result<Vec<OsString>> {
    paths
        .iter()
        .map(|path| {
            path.file_name()
                .map(OsStr::to_os_string)
                .ok_or_else(|| anyhow!("entry has no file name: {}", path.display()))
        })
        .collect()
}

/// Fails when a nested file would replace a directory in `target_dir`, or a
/// nested directory would replace a file. The wrapper itself is exempt.
fn ensure_no_kind_conflicts(
    target_dir: &Path,
    wrapper: &str,
    files: &[OsString],
    dirs: &[OsString],
) -> Result<()> {
    let mut conflicts = Vec::new();
    for (names, moving_dir) in [(files, false), (dirs, true)] {
        for entry in names {
            if entry.as_os_str() == OsStr::new(wrapper) {
                continue;
            }
            let dest = target_dir.join(entry);
            let Ok(metadata) = fs::symlink_metadata(&dest) else {
                continue;
            };
            let clashes = if moving_dir {
                metadata.is_file()
            } else {
                metadata.is_dir()
            };
            if clashes {
                conflicts.push(dest.display().to_string());
            }
        }
    }

    if conflicts.is_empty() {
        return Ok(());
    }
    tracing::error!(
        wrapper,
        conflicts = %conflicts.join(", "),
        "nested entries clash with existing entries of another kind"
    );
    Err(anyhow!(
        "cannot flatten {wrapper}: entries of another kind already exist at {}",
        conflicts.join(", ")
    ))
}

fn move_dir_or_copy(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir_recursive(src, dst)?;
            fs::remove_dir_all(src)
                .with_context(|| format!("failed to cleanup moved dir: {}", src.display()))?;
            Ok(())
        }
    }
}

pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path)
            .with_context(|| format!("failed to stat {}", src_path.display()))?;
        if metadata.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("failed to read symlink {}", src_path.display()))?;
            std::os::unix::fs::symlink(&target, &dst_path).with_context(|| {
                format!(
                    "failed to create symlink {} -> {}",
                    dst_path.display(),
                    target.display()
                )
            })?;
            continue;
        }

        fs::copy(&src_path, &dst_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                src_path.display(),
                dst_path.display()
            )
        })?;
    }
    Ok(())
}
