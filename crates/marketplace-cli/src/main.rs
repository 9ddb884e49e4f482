mod logging;
mod orchestrator;
mod privilege;
mod prompt;
mod render;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};
use marketplace_core::{Catalog, InstallerSettings, Locale, SessionReport, SETTINGS_FILE_NAME};
use marketplace_installer::{HostDirs, HttpFetcher, ProcessRunner};

use crate::logging::init_logging;
use crate::orchestrator::{InstallOrchestrator, SessionContext};
use crate::privilege::is_admin_user;
use crate::prompt::{wait_for_keypress, ConsolePrompt};
use crate::render::{Status, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "spicetify-marketplace-installer")]
#[command(about = "Installs the Spicetify Marketplace custom app", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Pass --bypass-admin to every spicetify command.
    #[arg(short = 'a', long = "bypass-admin", visible_short_alias = 'b')]
    bypass_admin: bool,
    /// Clean spicetify data and reinstall without the standard attempt.
    #[arg(short = 'f', long = "forcereinstall")]
    force_reinstall: bool,
    /// Settings file (TOML). Defaults to marketplace-installer.toml next to the executable.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Message language.
    #[arg(long, value_parser = parse_lang)]
    lang: Option<Locale>,
    /// Exit without waiting for a keypress.
    #[arg(long)]
    no_pause: bool,
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

fn parse_lang(value: &str) -> Result<Locale, String> {
    Locale::parse(value).ok_or_else(|| format!("unsupported language '{value}' (expected en or tr)"))
}

/// Lower-cases flag names so `-F` and `--ForceReinstall` parse; values after
/// `=` and positional values keep their case.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(text) if text.starts_with('-') => match text.split_once('=') {
                    Some((flag, value)) => OsString::from(format!("{}={value}", flag.to_lowercase())),
                    None => OsString::from(text.to_lowercase()),
                },
                _ => arg,
            }
        })
        .collect()
}

/// Parses `args`, dropping every argument clap does not recognize. Returns the
/// parsed flags together with the dropped arguments.
fn parse_cli(mut args: Vec<OsString>) -> Result<(Cli, Vec<String>), clap::Error> {
    let mut ignored = Vec::new();
    loop {
        let err = match Cli::try_parse_from(args.iter().cloned()) {
            Ok(cli) => return Ok((cli, ignored)),
            Err(err) if err.kind() == ErrorKind::UnknownArgument => err,
            Err(err) => return Err(err),
        };
        let Some(ContextValue::String(invalid)) = err.get(ContextKind::InvalidArg) else {
            return Err(err);
        };
        let Some(index) = args
            .iter()
            .skip(1)
            .position(|arg| is_same_arg(arg, invalid))
            .map(|position| position + 1)
        else {
            return Err(err);
        };
        ignored.push(args.remove(index).to_string_lossy().into_owned());
    }
}

fn is_same_arg(arg: &OsStr, invalid: &str) -> bool {
    match arg.to_str() {
        Some(text) => {
            text == invalid
                || text
                    .strip_prefix(invalid)
                    .is_some_and(|rest| rest.starts_with('='))
        }
        None => false,
    }
}

fn main() -> ExitCode {
    let args = normalize_args(std::env::args_os());
    let no_pause = args.iter().skip(1).any(|arg| arg == "--no-pause");
    let (cli, ignored) = match parse_cli(args) {
        Ok(parsed) => parsed,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            if !no_pause {
                let _ = wait_for_keypress();
            }
            return ExitCode::from(2);
        }
    };

    let renderer = TerminalRenderer::current();
    let locale = detect_locale(cli.lang);
    let catalog = Catalog::new(locale);
    let _log = match init_logging() {
        Ok(log) => {
            println!("{}", catalog.tf("LoggingTo", &[&log.path.display()]));
            Some(log)
        }
        Err(err) => {
            renderer.print_status(
                Status::Warn,
                &format!("{} {err:#}", catalog.t("ErrorLabel")),
            );
            None
        }
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        locale = locale.as_str(),
        "installer started"
    );
    tracing::debug!(?cli, "parsed arguments");
    for arg in &ignored {
        tracing::warn!(argument = %arg, "ignoring unrecognized argument");
    }

    let code = match run_session(&cli, renderer, catalog) {
        Ok(report) => {
            tracing::info!(?report, "session finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "installer could not start");
            renderer.print_status(
                Status::Error,
                &format!("{} {err:#}", catalog.t("ErrorLabel")),
            );
            ExitCode::FAILURE
        }
    };

    renderer.print_status(Status::Warn, &catalog.t("CheckErrors"));
    renderer.print_status(Status::Info, &catalog.t("RestartSpotify"));
    if !cli.no_pause {
        renderer.print_status(Status::Info, &catalog.t("PressAnyKeyToExit"));
        if let Err(err) = wait_for_keypress() {
            tracing::warn!(error = %err, "keypress wait failed");
        }
    }
    tracing::info!("exiting");
    code
}

fn run_session(cli: &Cli, renderer: TerminalRenderer, catalog: Catalog) -> Result<SessionReport> {
    let settings = load_settings(cli.settings.as_deref())?;
    tracing::debug!(?settings, "settings loaded");

    let bypass_admin = cli.bypass_admin || is_admin_user();
    if bypass_admin {
        renderer.print_status(Status::Info, &catalog.t("AdminRightsDetected"));
    }

    let runner = ProcessRunner::new(bypass_admin);
    tracing::info!(
        bypass_admin = runner.bypass_admin(),
        flag = cli.bypass_admin,
        "bypass mode decided"
    );
    let fetcher = HttpFetcher::new(settings.http_timeout())?;
    let ctx = SessionContext {
        settings,
        host: HostDirs::from_env(),
        catalog,
        renderer,
        temp_dir: std::env::temp_dir(),
    };

    renderer.print_status(Status::Step, &catalog.t("SettingUp"));
    let mut orchestrator = InstallOrchestrator::new(ctx, runner, fetcher, ConsolePrompt);
    Ok(orchestrator.run(cli.force_reinstall))
}

fn detect_locale(requested: Option<Locale>) -> Locale {
    if let Some(locale) = requested {
        return locale;
    }
    match sys_locale::get_locale() {
        Some(tag) => {
            tracing::debug!(tag = %tag, "system locale");
            Locale::from_tag(&tag)
        }
        None => Locale::default(),
    }
}

fn load_settings(explicit: Option<&Path>) -> Result<InstallerSettings> {
    if let Some(path) = explicit {
        return InstallerSettings::load(path);
    }
    match default_settings_path() {
        Some(path) => InstallerSettings::load_or_default(&path),
        None => Ok(InstallerSettings::default()),
    }
}

fn default_settings_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(SETTINGS_FILE_NAME))
}

#[cfg(test)]
mod tests;
