use super::*;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use marketplace_core::{CommandInvocation, CommandResult, InstallRunOutcome, ScriptedPrompt};
use marketplace_installer::{ArtifactFetcher, CommandRunner, FetchError};

use crate::logging::{open_log_file, LOG_FILE_NAME};
use crate::orchestrator::failed_command_lines;
use crate::privilege::{has_admin_rights, is_admin_name};
use crate::render::{flatten_lines, format_elapsed, render_status_line, OutputStyle};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let sequence = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "marketplace-cli-tests-{label}-{}-{nanos}-{sequence}",
        std::process::id()
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path
}

fn parse_with_ignored(args: &[&str]) -> Result<(Cli, Vec<String>), clap::Error> {
    let raw = std::iter::once("spicetify-marketplace-installer")
        .chain(args.iter().copied())
        .map(OsString::from);
    parse_cli(normalize_args(raw))
}

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    parse_with_ignored(args).map(|(cli, _)| cli)
}

fn marketplace_zip() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, text) in [
        ("marketplace-dist/index.js", "app"),
        ("marketplace-dist/manifest.json", "{}"),
    ] {
        writer.start_file(name, options).expect("must start zip file");
        writer.write_all(text.as_bytes()).expect("must write zip file");
    }
    writer.finish().expect("must finish zip").into_inner()
}

/// Answers CLI-tool calls from a table; version probes can be queued.
#[derive(Default)]
struct ScriptedRunner {
    responses: HashMap<String, CommandResult>,
    probes: RefCell<VecDeque<CommandResult>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    fn with_userdata(path: &Path) -> Self {
        let mut runner = Self::default();
        runner.responses.insert(
            "path userdata".to_string(),
            CommandResult::new(path.display().to_string(), 0),
        );
        runner
    }

    fn cli_missing(self) -> Self {
        self.probes.replace(
            [
                CommandResult::launch_failed("not found"),
                CommandResult::launch_failed("not found"),
            ]
            .into_iter()
            .collect(),
        );
        self
    }

    fn called(&self, line: &str) -> bool {
        self.calls.borrow().iter().any(|call| call == line)
    }

    fn answer(&self, invocation: &CommandInvocation) -> CommandResult {
        let line = invocation.args.join(" ");
        self.calls.borrow_mut().push(line.clone());
        self.responses
            .get(&line)
            .cloned()
            .unwrap_or_else(|| CommandResult::new("", 0))
    }
}

impl CommandRunner for ScriptedRunner {
    fn invoke(&self, invocation: &CommandInvocation) -> CommandResult {
        self.answer(invocation)
    }

    fn probe(&self, invocation: &CommandInvocation, _timeout: Duration) -> CommandResult {
        let queued = self.probes.borrow_mut().pop_front();
        match queued {
            Some(result) => {
                self.calls.borrow_mut().push(invocation.args.join(" "));
                result
            }
            None => self.answer(invocation),
        }
    }

    fn run_with_input(&self, _invocation: &CommandInvocation, _input_lines: &[&str]) -> CommandResult {
        self.calls.borrow_mut().push("<install script>".to_string());
        CommandResult::new("installed", 0)
    }
}

struct StaticFetcher {
    archive: Vec<u8>,
    requests: RefCell<Vec<String>>,
}

impl StaticFetcher {
    fn new() -> Self {
        Self {
            archive: marketplace_zip(),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn requested(&self, url: &str) -> bool {
        self.requests.borrow().iter().any(|seen| seen == url)
    }
}

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(self.archive.clone())
    }

    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        Ok("[Base]\nmain = 000000\n".to_string())
    }
}

struct Scenario {
    root: PathBuf,
    userdata: PathBuf,
    data_dirs: Vec<PathBuf>,
}

impl Scenario {
    fn new(label: &str) -> Self {
        let root = test_dir(label);
        let userdata = root.join("userdata");
        fs::create_dir_all(&userdata).expect("must create userdata");
        let data_dirs = ["config", "dot-spicetify", "share"]
            .into_iter()
            .map(|name| root.join(name))
            .collect::<Vec<_>>();
        for dir in &data_dirs {
            fs::create_dir_all(dir.join("Extensions")).expect("must create data dir");
        }
        Self {
            root,
            userdata,
            data_dirs,
        }
    }

    fn orchestrator(
        &self,
        runner: ScriptedRunner,
        answers: &[&str],
    ) -> InstallOrchestrator<ScriptedRunner, StaticFetcher, ScriptedPrompt> {
        let ctx = SessionContext {
            settings: InstallerSettings::default(),
            host: HostDirs {
                fallback_user_data: self.root.join("fallback"),
                cli_data_dirs: self.data_dirs.clone(),
            },
            catalog: Catalog::new(Locale::English),
            renderer: TerminalRenderer::from_style(OutputStyle::Plain),
            temp_dir: self.root.clone(),
        };
        InstallOrchestrator::new(
            ctx,
            runner,
            StaticFetcher::new(),
            ScriptedPrompt::new(answers.iter().copied()),
        )
    }

    fn plugin_dir(&self) -> PathBuf {
        self.userdata.join("CustomApps").join("marketplace")
    }

    fn cleanup(self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

#[test]
fn normalize_args_lowercases_flags_only() {
    let raw = ["Installer.exe", "-F", "--Settings=C:\\Users\\Me\\Cfg.toml", "Value"]
        .into_iter()
        .map(OsString::from);
    assert_eq!(
        normalize_args(raw),
        vec![
            OsString::from("Installer.exe"),
            OsString::from("-f"),
            OsString::from("--settings=C:\\Users\\Me\\Cfg.toml"),
            OsString::from("Value"),
        ]
    );
}

#[test]
fn flags_parse_case_insensitively() {
    let cli = parse(&["--ForceReinstall", "-B", "--NO-PAUSE"]).expect("must parse");
    assert!(cli.force_reinstall);
    assert!(cli.bypass_admin);
    assert!(cli.no_pause);

    let cli = parse(&["-A", "-f"]).expect("must parse");
    assert!(cli.bypass_admin);
    assert!(cli.force_reinstall);

    let cli = parse(&["--BYPASS-ADMIN"]).expect("must parse");
    assert!(cli.bypass_admin);
    assert!(!cli.force_reinstall);
}

#[test]
fn lang_flag_selects_locale() {
    let cli = parse(&["--lang", "tr"]).expect("must parse");
    assert_eq!(cli.lang, Some(Locale::Turkish));
    assert_eq!(detect_locale(cli.lang), Locale::Turkish);
    assert!(parse(&["--lang", "de"]).is_err());
}

#[test]
fn unknown_arguments_are_dropped_and_reported() {
    let (cli, ignored) =
        parse_with_ignored(&["-f", "--verbose", "stray", "--color=auto", "-a"]).expect("must parse");

    assert!(cli.force_reinstall);
    assert!(cli.bypass_admin);
    assert_eq!(ignored, vec!["--verbose", "stray", "--color=auto"]);
}

#[test]
fn invalid_flag_values_still_fail() {
    let err = parse(&["--lang", "de", "--unknown"]).expect_err("bad language must fail");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn admin_names_enable_bypass() {
    assert!(is_admin_name("Administrator"));
    assert!(is_admin_name("ROOT"));
    assert!(!is_admin_name("alice"));
    assert!(!is_admin_name(""));
}

#[test]
fn elevated_process_enables_bypass_for_any_user() {
    assert!(has_admin_rights(true, "alice"));
    assert!(has_admin_rights(false, "Administrator"));
    assert!(!has_admin_rights(false, "alice"));
}

#[cfg(unix)]
#[test]
fn elevation_follows_effective_uid() {
    let root = unsafe { libc::geteuid() } == 0;
    assert_eq!(crate::privilege::process_is_elevated(), root);
}

#[test]
fn failed_commands_report_exit_code_and_output() {
    let catalog = Catalog::default();
    let lines = failed_command_lines(catalog, "config inject_css 1", 2, "  boom \n");
    assert_eq!(
        lines,
        vec![
            catalog.tf("SpicetifyCommandFailed", &[&"config inject_css 1", &2]),
            format!("{} boom", catalog.t("SpicetifyCommandOutputLog")),
        ]
    );

    let quiet = failed_command_lines(catalog, "backup", 1, "   ");
    assert_eq!(quiet.len(), 1);
}

#[test]
fn launch_failures_report_a_run_error() {
    let catalog = Catalog::new(Locale::Turkish);
    let lines = failed_command_lines(
        catalog,
        "apply",
        marketplace_core::LAUNCH_FAILED_EXIT_CODE,
        "failed to launch process: not found",
    );
    assert_eq!(
        lines,
        vec![format!(
            "{} failed to launch process: not found",
            catalog.t("ErrorRunningSpicetify")
        )]
    );
}

#[test]
fn explicit_settings_file_must_exist() {
    let root = test_dir("settings");
    let missing = root.join("missing.toml");
    assert!(load_settings(Some(&missing)).is_err());

    let present = root.join(SETTINGS_FILE_NAME);
    fs::write(&present, "plugin_name = \"marketplace-dev\"\n").expect("must write settings");
    let settings = load_settings(Some(&present)).expect("must load");
    assert_eq!(settings.plugin_name, "marketplace-dev");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, Status::Ok, "Process completed!"),
        "Process completed!"
    );
}

#[test]
fn render_status_line_rich_includes_badge() {
    let line = render_status_line(OutputStyle::Rich, Status::Warn, "restore failed");
    assert!(line.contains("[WARN]"));
    assert!(line.ends_with(" restore failed"));
}

#[test]
fn status_lines_flatten_for_the_log() {
    assert_eq!(flatten_lines("first\n\n  second  \r\nthird"), "first | second | third");
    assert_eq!(format_elapsed(Duration::from_millis(1_250)), "1.250s");
}

#[test]
fn open_log_file_truncates_and_falls_back() {
    let root = test_dir("log");
    let existing = root.join(LOG_FILE_NAME);
    fs::write(&existing, "previous run").expect("must seed log");

    let (path, _file) =
        open_log_file(&[root.join("missing-dir"), root.clone()]).expect("must open log");

    assert_eq!(path, existing);
    assert_eq!(fs::read_to_string(&existing).expect("must read log"), "");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_cli_that_cannot_be_installed_skips_download() {
    let scenario = Scenario::new("cli-missing");
    let runner = ScriptedRunner::with_userdata(&scenario.userdata).cli_missing();
    let mut orchestrator = scenario.orchestrator(runner, &["y"]);

    let report = orchestrator.run(false);

    assert!(matches!(report.standard, Some(InstallRunOutcome::Failure(_))));
    assert_eq!(report.verified, Some(true));
    assert!(!report.ran_force_reinstall());
    let settings = InstallerSettings::default();
    assert!(orchestrator.runner().called("<install script>"));
    assert!(orchestrator.fetcher().requested(settings.install_script_url()));
    assert!(!orchestrator.fetcher().requested(&settings.archive_url));
    assert!(!orchestrator.runner().called("path userdata"));

    scenario.cleanup();
}

#[test]
fn confirmed_install_deletes_nothing() {
    let scenario = Scenario::new("confirmed");
    let runner = ScriptedRunner::with_userdata(&scenario.userdata);
    let mut orchestrator = scenario.orchestrator(runner, &["Yes"]);

    let report = orchestrator.run(false);

    assert_eq!(report.standard, Some(InstallRunOutcome::Success));
    assert_eq!(report.verified, Some(true));
    assert!(!report.ran_force_reinstall());
    assert!(!orchestrator.runner().called("restore"));
    assert!(scenario.data_dirs.iter().all(|dir| dir.is_dir()));
    assert!(scenario.plugin_dir().join("index.js").is_file());
    assert!(scenario
        .userdata
        .join("Themes")
        .join("marketplace")
        .join("color.ini")
        .is_file());

    scenario.cleanup();
}

#[test]
fn declined_or_missing_verification_escalates_to_force_reinstall() {
    for answers in [&["n"][..], &[""][..], &[][..]] {
        let scenario = Scenario::new("declined");
        let runner = ScriptedRunner::with_userdata(&scenario.userdata);
        let mut orchestrator = scenario.orchestrator(runner, answers);

        let report = orchestrator.run(false);

        assert_eq!(report.verified, Some(false), "{answers:?}");
        assert_eq!(
            report.force_reinstall,
            Some(InstallRunOutcome::Success),
            "{answers:?}"
        );
        assert!(orchestrator.runner().called("restore"));
        assert!(scenario.data_dirs.iter().all(|dir| !dir.exists()));
        assert_eq!(orchestrator.prompt().asked.len(), 1);
        assert!(scenario.plugin_dir().join("manifest.json").is_file());

        scenario.cleanup();
    }
}

#[test]
fn force_reinstall_survives_an_undeletable_data_dir() {
    let scenario = Scenario::new("undeletable");
    let blocked = &scenario.data_dirs[1];
    fs::remove_dir_all(blocked).expect("must clear blocked dir");
    // A plain file is not removable as a directory tree.
    fs::write(blocked, "in use").expect("must create blocker");
    let runner = ScriptedRunner::with_userdata(&scenario.userdata);
    let mut orchestrator = scenario.orchestrator(runner, &[]);

    let report = orchestrator.run(true);

    assert_eq!(report.standard, None);
    assert_eq!(report.verified, None);
    assert_eq!(report.force_reinstall, Some(InstallRunOutcome::Success));
    assert!(!scenario.data_dirs[0].exists());
    assert!(scenario.data_dirs[1].is_file());
    assert!(!scenario.data_dirs[2].exists());
    assert!(orchestrator
        .fetcher()
        .requested(&InstallerSettings::default().archive_url));
    assert!(orchestrator.prompt().asked.is_empty());

    scenario.cleanup();
}

#[test]
fn theme_already_active_is_not_reset() {
    let scenario = Scenario::new("theme-active");
    let mut runner = ScriptedRunner::with_userdata(&scenario.userdata);
    runner.responses.insert(
        "config current_theme".to_string(),
        CommandResult::new("marketplace", 0),
    );
    let mut orchestrator = scenario.orchestrator(runner, &["y"]);

    orchestrator.run(false);

    assert!(orchestrator.runner().called("config custom_apps marketplace"));
    assert!(!orchestrator.runner().called("config current_theme marketplace"));
    assert!(orchestrator.runner().called("apply"));

    scenario.cleanup();
}
