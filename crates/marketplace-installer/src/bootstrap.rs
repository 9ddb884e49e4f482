use std::path::{Path, PathBuf};

use marketplace_core::{parse_cli_version, CommandInvocation, CommandResult, InstallerSettings};

use crate::fetch::{fetch_text_to_path, ArtifactFetcher, FetchError};
use crate::fs_utils::remove_file_if_exists;
use crate::runner::CommandRunner;

/// Answers fed to the install script's interactive questions.
pub const INSTALL_SCRIPT_ANSWERS: [&str; 2] = ["n", "n"];

/// `true` when `<cli> --version` exits with 0 within the probe timeout.
pub fn is_cli_installed(runner: &dyn CommandRunner, settings: &InstallerSettings) -> bool {
    let invocation = CommandInvocation::new(settings.cli_program.as_str(), ["--version"]).captured();
    let result = runner.probe(&invocation, settings.version_probe_timeout());
    if !result.success() {
        tracing::info!(
            exit_code = result.exit_code,
            output = %result.output,
            "CLI tool not detected"
        );
        return false;
    }
    match parse_cli_version(&result.output) {
        Some(version) => tracing::info!(%version, "CLI tool detected"),
        None => tracing::info!(output = %result.output, "CLI tool detected; version not parseable"),
    }
    true
}

#[derive(Debug)]
pub enum ScriptRunOutcome {
    Ran(CommandResult),
    DownloadFailed(FetchError),
}

/// Downloads the official install script into `temp_dir`, runs it with
/// scripted "no" answers and removes it again.
pub fn install_cli_tool(
    runner: &dyn CommandRunner,
    fetcher: &dyn ArtifactFetcher,
    settings: &InstallerSettings,
    temp_dir: &Path,
) -> ScriptRunOutcome {
    let script_path = install_script_path(temp_dir);
    let url = settings.install_script_url();
    if let Err(err) = fetch_text_to_path(fetcher, url, &script_path) {
        tracing::error!(url, error = %err, "failed to download install script");
        return ScriptRunOutcome::DownloadFailed(err);
    }

    let result = runner.run_with_input(&script_invocation(&script_path), &INSTALL_SCRIPT_ANSWERS);
    tracing::info!(exit_code = result.exit_code, "install script output:\n{}", result.output);

    if let Err(err) = remove_file_if_exists(&script_path) {
        tracing::warn!(path = %script_path.display(), error = %err, "could not remove install script");
    }
    ScriptRunOutcome::Ran(result)
}

pub fn install_script_path(temp_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        temp_dir.join("spicetify-install.ps1")
    } else {
        temp_dir.join("spicetify-install.sh")
    }
}

pub fn script_invocation(script_path: &Path) -> CommandInvocation {
    let script = script_path.display().to_string();
    if cfg!(windows) {
        CommandInvocation::new(
            "powershell",
            ["-NoProfile", "-ExecutionPolicy", "Bypass", "-File", script.as_str()],
        )
        .captured()
    } else {
        CommandInvocation::new("sh", [script.as_str()]).captured()
    }
}
