use marketplace_core::{
    Catalog, CommandInvocation, CommandResult, InstallerSettings, Prompt, ThemeConflictDecision,
};

use crate::runner::CommandRunner;

/// Progress reported while the configuration commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    SettingTheme,
    BackingUpAndApplying,
    CommandFailed { command: String, result: CommandResult },
}

/// Issues the CLI-tool commands that activate the plugin.
pub struct ConfigurationApplier<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a InstallerSettings,
}

impl<'a> ConfigurationApplier<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a InstallerSettings) -> Self {
        Self { runner, settings }
    }

    /// Trimmed `config current_theme` output, or `None` when the query failed
    /// or printed nothing.
    pub fn current_theme(&self) -> Option<String> {
        let invocation = self.config(["current_theme"]).captured();
        let result = self.runner.invoke(&invocation);
        let theme = result.output.trim();
        if !result.success() || theme.is_empty() {
            tracing::warn!(
                exit_code = result.exit_code,
                output = %result.output,
                "could not read current theme; treating it as unset"
            );
            return None;
        }
        tracing::info!(theme, "current theme");
        Some(theme.to_string())
    }

    /// Decides whether the plugin theme should be set, asking the user only
    /// when another real theme would be replaced. The default answer is yes.
    pub fn resolve_conflict(
        &self,
        current: Option<&str>,
        catalog: Catalog,
        prompt: &mut dyn Prompt,
    ) -> ThemeConflictDecision {
        let plugin = self.settings.plugin_name.as_str();
        let decision = match current {
            Some(theme) if theme == plugin => ThemeConflictDecision::NoConflict,
            Some(theme) if self.settings.is_real_theme(theme) => {
                let question = format!(
                    "{}\n{} {}",
                    catalog.tf("LocalThemeFound", &[&theme]),
                    catalog.t("ReplaceThemePrompt"),
                    catalog.yes_no_suffix(true)
                );
                let answer = prompt.ask(&question).unwrap_or_default();
                tracing::info!(theme, answer = %answer.trim(), "theme replacement answer");
                if catalog.is_no(&answer) {
                    ThemeConflictDecision::ConflictResolvedKeep
                } else {
                    ThemeConflictDecision::ConflictResolvedReplace
                }
            }
            _ => ThemeConflictDecision::ConflictResolvedReplace,
        };
        tracing::info!(decision = decision.as_str(), "theme decision");
        decision
    }

    /// Enables CSS injection, color replacement and the custom app, setting
    /// the plugin theme only for [`ThemeConflictDecision::ConflictResolvedReplace`].
    pub fn enable_plugin(
        &self,
        decision: ThemeConflictDecision,
        on_event: &mut dyn FnMut(ConfigEvent),
    ) {
        let plugin = self.settings.plugin_name.as_str();
        self.run_step(self.config(["inject_css", "1"]), on_event);
        self.run_step(self.config(["replace_colors", "1"]), on_event);
        if decision.sets_theme() {
            on_event(ConfigEvent::SettingTheme);
            self.run_step(self.config(["current_theme", plugin]), on_event);
        }
        self.run_step(self.config(["custom_apps", plugin]), on_event);
    }

    pub fn backup_and_apply(&self, on_event: &mut dyn FnMut(ConfigEvent)) {
        on_event(ConfigEvent::BackingUpAndApplying);
        self.run_step(self.command(["backup"]), on_event);
        self.run_step(self.command(["apply"]), on_event);
    }

    /// Full configuration sequence. Every command is best-effort.
    pub fn apply(
        &self,
        catalog: Catalog,
        prompt: &mut dyn Prompt,
        on_event: &mut dyn FnMut(ConfigEvent),
    ) -> ThemeConflictDecision {
        let current = self.current_theme();
        let decision = self.resolve_conflict(current.as_deref(), catalog, prompt);
        self.enable_plugin(decision, on_event);
        self.backup_and_apply(on_event);
        decision
    }

    fn config<const N: usize>(&self, args: [&str; N]) -> CommandInvocation {
        CommandInvocation::new(
            self.settings.cli_program.as_str(),
            std::iter::once("config").chain(args),
        )
    }

    fn command<const N: usize>(&self, args: [&str; N]) -> CommandInvocation {
        CommandInvocation::new(self.settings.cli_program.as_str(), args)
    }

    fn run_step(&self, invocation: CommandInvocation, on_event: &mut dyn FnMut(ConfigEvent)) {
        let result = self.runner.invoke(&invocation);
        if !result.success() {
            on_event(ConfigEvent::CommandFailed {
                command: invocation.args.join(" "),
                result,
            });
        }
    }
}
