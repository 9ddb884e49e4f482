use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use marketplace_core::{
    Catalog, ExtractionOutcome, InstallRunOutcome, InstallerSettings, Prompt, SessionReport,
    LAUNCH_FAILED_EXIT_CODE,
};
use marketplace_installer::{
    fetch_text_to_path, install_archive, install_cli_tool, is_cli_installed, remove_data_dirs,
    resolve_user_data_path, run_restore, ArtifactFetcher, CommandRunner, ConfigEvent,
    ConfigurationApplier, DirRemoval, HostDirs, InstallationPaths, LayoutHints, ScriptRunOutcome,
    UserDataSource,
};

use crate::render::{Status, TerminalRenderer};

/// Everything a session needs besides its external collaborators.
pub(crate) struct SessionContext {
    pub(crate) settings: InstallerSettings,
    pub(crate) host: HostDirs,
    pub(crate) catalog: Catalog,
    pub(crate) renderer: TerminalRenderer,
    pub(crate) temp_dir: PathBuf,
}

pub(crate) struct InstallOrchestrator<R, F, P> {
    ctx: SessionContext,
    runner: R,
    fetcher: F,
    prompt: P,
}

impl<R, F, P> InstallOrchestrator<R, F, P>
where
    R: CommandRunner,
    F: ArtifactFetcher,
    P: Prompt,
{
    pub(crate) fn new(ctx: SessionContext, runner: R, fetcher: F, prompt: P) -> Self {
        Self {
            ctx,
            runner,
            fetcher,
            prompt,
        }
    }

    #[cfg(test)]
    pub(crate) fn prompt(&self) -> &P {
        &self.prompt
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    #[cfg(test)]
    pub(crate) fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Standard install plus verification, escalating to a force reinstall
    /// when the user does not confirm. `force` skips straight to the latter.
    pub(crate) fn run(&mut self, force: bool) -> SessionReport {
        let mut report = SessionReport::default();
        if force {
            tracing::info!("force reinstall requested on the command line");
            report.force_reinstall = Some(self.run_force_reinstall());
            return report;
        }

        report.standard = Some(self.run_standard_install());
        let confirmed = self.verify();
        report.verified = Some(confirmed);
        if !confirmed {
            report.force_reinstall = Some(self.run_force_reinstall());
        }
        report
    }

    pub(crate) fn run_standard_install(&mut self) -> InstallRunOutcome {
        tracing::info!("starting standard install");
        let result = self.install_marketplace();
        self.finish_flow(result, "DuringStandardInstall")
    }

    pub(crate) fn run_force_reinstall(&mut self) -> InstallRunOutcome {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_status(Status::Step, &catalog.t("ForceReinstallStarting"));
        self.clean_cli_data();
        renderer.print_status(Status::Step, &catalog.t("DataCleanedAttemptingFreshInstall"));
        let result = self.install_marketplace();
        self.finish_flow(result, "DuringForceReinstall")
    }

    /// Asks whether the plugin is visible. Only an explicit yes counts.
    pub(crate) fn verify(&mut self) -> bool {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_section(&catalog.t("InstallationCompletePromptTitle"));
        let question = format!(
            "{} {}",
            catalog.t("InstallationCompletePromptQuestion"),
            catalog.yes_no_suffix(false)
        );
        let answer = self.prompt.ask(&question).unwrap_or_default();
        tracing::info!(answer = %answer.trim(), "verification answer");

        if catalog.is_yes(&answer) {
            renderer.print_status(Status::Ok, &catalog.t("GreatSuccess"));
            true
        } else {
            renderer.print_status(Status::Warn, &catalog.t("ProceedingWithForceReinstall"));
            false
        }
    }

    fn finish_flow(&self, result: Result<()>, during_key: &str) -> InstallRunOutcome {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        match result {
            Ok(()) => {
                renderer.print_status(Status::Ok, &catalog.t("Done"));
                InstallRunOutcome::Success
            }
            Err(err) => {
                tracing::error!(flow = during_key, "install flow failed: {err:#}");
                renderer.print_status(
                    Status::Error,
                    &format!(
                        "{} {}: {err}",
                        catalog.t("ErrorLabel"),
                        catalog.t(during_key)
                    ),
                );
                InstallRunOutcome::Failure(format!("{err:#}"))
            }
        }
    }

    /// Runs `restore` and wipes the CLI tool's data directories. Nothing here
    /// stops the reinstall that follows.
    fn clean_cli_data(&self) {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_status(Status::Step, &catalog.t("CleaningSpicetifyData"));

        renderer.print_status(Status::Info, &catalog.t("RunningRestore"));
        let restore = run_restore(&self.runner, &self.ctx.settings);
        if !restore.success() {
            self.report_failed_command("restore", restore.exit_code, &restore.output);
        }

        let report = remove_data_dirs(&self.ctx.host.cli_data_dirs, |path, removal| {
            if let DirRemoval::Removed = removal {
                renderer.print_status(
                    Status::Info,
                    &catalog.tf("DeletingFolder", &[&path.display()]),
                );
            }
        });
        for (path, reason) in report.failures() {
            renderer.print_status(
                Status::Error,
                &format!(
                    "{} {}: {}: {reason}",
                    catalog.t("ErrorLabel"),
                    catalog.t("ErrorCleaningFolders"),
                    path.display()
                ),
            );
        }
        if report.all_clean() {
            renderer.print_status(Status::Ok, &catalog.t("SpicetifyFoldersCleaned"));
        }
    }

    /// The installation steps shared by both flows. The first fatal step
    /// ends the run with its error.
    fn install_marketplace(&mut self) -> Result<()> {
        self.ensure_cli_tool()?;
        let paths = self.resolve_paths()?;
        self.prepare_directories(&paths)?;
        self.fetch_and_install_archive(&paths)?;
        self.fetch_placeholder_theme(&paths)?;
        self.apply_configuration();
        Ok(())
    }

    fn ensure_cli_tool(&self) -> Result<()> {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        let settings = &self.ctx.settings;
        if is_cli_installed(&self.runner, settings) {
            return Ok(());
        }

        renderer.print_status(Status::Warn, &catalog.t("SpicetifyNotFound"));
        renderer.print_status(Status::Step, &catalog.t("InstallingSpicetify"));
        renderer.print_status(Status::Info, &catalog.t("RunningInstallScript"));
        let spinner = renderer.start_spinner("install script");
        match install_cli_tool(&self.runner, &self.fetcher, settings, &self.ctx.temp_dir) {
            ScriptRunOutcome::Ran(result) => {
                spinner.finish_success();
                renderer.print_status(Status::Info, &catalog.t("SpicetifyCliInstallScriptFin"));
                if !result.output.is_empty() {
                    renderer.print_status(Status::Debug, &catalog.t("InstallScriptOutput"));
                    renderer.print_status(Status::Debug, &result.output);
                }
                if !result.success() {
                    renderer.print_status(
                        Status::Warn,
                        &format!("{} (exit code {})", catalog.t("InstallationFailed"), result.exit_code),
                    );
                }
            }
            ScriptRunOutcome::DownloadFailed(err) => {
                spinner.finish_abandon();
                renderer.print_status(
                    Status::Error,
                    &format!("{} {}: {err}", catalog.t("ErrorLabel"), catalog.t("InstallationFailed")),
                );
            }
        }

        if !is_cli_installed(&self.runner, settings) {
            let message = format!(
                "{} {}",
                catalog.t("SpicetifyNotFound"),
                catalog.t("InstallationFailed")
            );
            renderer.print_status(Status::Error, &message);
            return Err(anyhow!(message));
        }
        renderer.print_status(Status::Ok, &catalog.t("SpicetifyInstalledVerified"));
        Ok(())
    }

    fn resolve_paths(&self) -> Result<InstallationPaths> {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        let resolution = match resolve_user_data_path(&self.runner, &self.ctx.settings, &self.ctx.host)
        {
            Ok(resolution) => resolution,
            Err(err) => {
                renderer.print_status(Status::Error, &catalog.t("FailedToGetSpicetifyPath"));
                return Err(err);
            }
        };

        renderer.print_status(Status::Debug, &catalog.t("SpicetifyPathCommandOutput"));
        renderer.print_status(Status::Debug, &resolution.command.output);
        if !resolution.command.success() {
            renderer.print_status(Status::Error, &catalog.t("ErrorFromSpicetify"));
            renderer.print_status(Status::Error, &resolution.command.output);
        }
        if resolution.source == UserDataSource::Fallback {
            renderer.print_status(
                Status::Warn,
                &catalog.tf("SpicetifyPathInvalidFallback", &[&resolution.path.display()]),
            );
        }
        renderer.print_status(
            Status::Info,
            &catalog.tf("SpicetifyUserDataPath", &[&resolution.path.display()]),
        );

        InstallationPaths::new(resolution.path, &self.ctx.settings.plugin_name)
    }

    fn prepare_directories(&self, paths: &InstallationPaths) -> Result<()> {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_status(Status::Step, &catalog.t("RemovingCreatingMarketplaceFolders"));
        for (dir, reason) in paths.prepare_directories()? {
            renderer.print_status(
                Status::Warn,
                &format!("{} {}: {reason}", catalog.t("ErrorDeletingFolder"), dir.display()),
            );
        }
        Ok(())
    }

    fn fetch_and_install_archive(&self, paths: &InstallationPaths) -> Result<()> {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        let settings = &self.ctx.settings;

        renderer.print_status(Status::Step, &catalog.t("DownloadingMarketplace"));
        let spinner = renderer.start_spinner("download");
        let bytes = match self.fetcher.fetch(&settings.archive_url) {
            Ok(bytes) => {
                spinner.finish_success();
                bytes
            }
            Err(err) => {
                spinner.finish_abandon();
                return Err(err).context("failed to download the Marketplace archive");
            }
        };

        renderer.print_status(Status::Step, &catalog.t("UnzippingAndInstalling"));
        let hints = LayoutHints {
            expected_dir: &settings.expected_extract_dir,
            keyword: &settings.extract_dir_keyword,
        };
        let outcome = install_archive(&bytes, paths.custom_app_dir(), hints)?;
        match &outcome {
            ExtractionOutcome::NestedLayout(name) => {
                if name != &settings.expected_extract_dir {
                    renderer.print_status(
                        Status::Warn,
                        &catalog.tf(
                            "DetectedExtractedFolder",
                            &[name, &settings.expected_extract_dir],
                        ),
                    );
                }
                renderer.print_status(Status::Info, &catalog.tf("MovingItemsFrom", &[name]));
            }
            ExtractionOutcome::FlatLayout => {
                renderer.print_status(Status::Info, &catalog.t("FilesExtractedDirectly"));
            }
            ExtractionOutcome::Unrecognized => {
                renderer.print_status(
                    Status::Warn,
                    &catalog.tf("ExpectedFolderNotFound", &[&settings.expected_extract_dir]),
                );
            }
        }
        Ok(())
    }

    fn fetch_placeholder_theme(&self, paths: &InstallationPaths) -> Result<()> {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_status(Status::Step, &catalog.t("DownloadingPlaceholderTheme"));
        fetch_text_to_path(&self.fetcher, &self.ctx.settings.theme_url, &paths.theme_color_path())
            .context("failed to install the placeholder theme")?;
        Ok(())
    }

    fn apply_configuration(&mut self) {
        let (renderer, catalog) = (self.ctx.renderer, self.ctx.catalog);
        renderer.print_status(Status::Step, &catalog.t("ConfiguringSpicetify"));

        let applier = ConfigurationApplier::new(&self.runner, &self.ctx.settings);
        let decision = applier.apply(catalog, &mut self.prompt, &mut |event| match event {
            ConfigEvent::SettingTheme => {
                renderer.print_status(Status::Info, &catalog.t("SettingCurrentThemeMarketplace"))
            }
            ConfigEvent::BackingUpAndApplying => {
                renderer.print_status(Status::Step, &catalog.t("BackingUpAndApplying"))
            }
            ConfigEvent::CommandFailed { command, result } => {
                report_failed_command(renderer, catalog, &command, result.exit_code, &result.output)
            }
        });
        tracing::info!(decision = decision.as_str(), "configuration applied");
    }

    fn report_failed_command(&self, command: &str, exit_code: i32, output: &str) {
        report_failed_command(self.ctx.renderer, self.ctx.catalog, command, exit_code, output);
    }
}

fn report_failed_command(
    renderer: TerminalRenderer,
    catalog: Catalog,
    command: &str,
    exit_code: i32,
    output: &str,
) {
    for line in failed_command_lines(catalog, command, exit_code, output) {
        renderer.print_status(Status::Warn, &line);
    }
}

/// Console lines for a failed CLI-tool command. A process that never started
/// is reported as a run error rather than an exit code.
pub(crate) fn failed_command_lines(
    catalog: Catalog,
    command: &str,
    exit_code: i32,
    output: &str,
) -> Vec<String> {
    let output = output.trim();
    if exit_code == LAUNCH_FAILED_EXIT_CODE {
        return vec![format!("{} {output}", catalog.t("ErrorRunningSpicetify"))];
    }
    let mut lines = vec![catalog.tf("SpicetifyCommandFailed", &[&command, &exit_code])];
    if !output.is_empty() {
        lines.push(format!("{} {output}", catalog.t("SpicetifyCommandOutputLog")));
    }
    lines
}
