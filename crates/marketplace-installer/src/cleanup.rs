use std::path::{Path, PathBuf};

use marketplace_core::{CommandInvocation, CommandResult, InstallerSettings};

use crate::fs_utils::remove_dir_if_exists;
use crate::runner::CommandRunner;

/// Runs `<cli> restore`. A failure is logged and returned, never raised.
pub fn run_restore(runner: &dyn CommandRunner, settings: &InstallerSettings) -> CommandResult {
    let result = runner.invoke(&CommandInvocation::new(
        settings.cli_program.as_str(),
        ["restore"],
    ));
    if !result.success() {
        tracing::warn!(exit_code = result.exit_code, "restore failed; continuing with cleanup");
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirRemoval {
    Removed,
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub entries: Vec<(PathBuf, DirRemoval)>,
}

impl CleanupReport {
    pub fn removed(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|(_, removal)| *removal == DirRemoval::Removed)
            .map(|(path, _)| path.as_path())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|(path, removal)| match removal {
            DirRemoval::Failed(reason) => Some((path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    pub fn all_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Deletes each directory independently; one failure does not stop the rest.
pub fn remove_data_dirs(
    dirs: &[PathBuf],
    mut on_dir: impl FnMut(&Path, &DirRemoval),
) -> CleanupReport {
    let mut report = CleanupReport::default();
    for dir in dirs {
        let removal = match remove_dir_if_exists(dir) {
            Ok(true) => DirRemoval::Removed,
            Ok(false) => DirRemoval::Missing,
            Err(err) => DirRemoval::Failed(err.to_string()),
        };
        match &removal {
            DirRemoval::Removed => tracing::info!(path = %dir.display(), "deleted data directory"),
            DirRemoval::Missing => tracing::debug!(path = %dir.display(), "data directory absent"),
            DirRemoval::Failed(reason) => {
                tracing::error!(path = %dir.display(), error = %reason, "failed to delete data directory")
            }
        }
        on_dir(dir, &removal);
        report.entries.push((dir.clone(), removal));
    }
    report
}
