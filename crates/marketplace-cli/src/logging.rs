use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub(crate) const LOG_FILE_NAME: &str = "log.txt";

/// HTTP stack internals stay at info so the log reads as installer steps.
const DEFAULT_LOG_FILTER: &str = "debug,hyper=info,hyper_util=info,reqwest=info,rustls=info";

/// Keeps the background log writer alive; dropping it flushes the file.
pub(crate) struct LogSession {
    pub(crate) path: PathBuf,
    _guard: WorkerGuard,
}

/// Truncates `log.txt` next to the executable (or in the temp directory when
/// that is not writable) and routes all `tracing` events into it.
pub(crate) fn init_logging() -> Result<LogSession> {
    let (path, file) = open_log_file(&log_dir_candidates())?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;

    Ok(LogSession {
        path,
        _guard: guard,
    })
}

fn log_dir_candidates() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    dirs.push(std::env::temp_dir());
    dirs
}

pub(crate) fn open_log_file(dirs: &[PathBuf]) -> Result<(PathBuf, File)> {
    let mut last_error = None;
    for dir in dirs {
        let path = dir.join(LOG_FILE_NAME);
        match File::create(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) => {
                eprintln!("cannot write log file {}: {err}", path.display());
                last_error = Some(err);
            }
        }
    }
    Err(match last_error {
        Some(err) => anyhow!("no writable location for {LOG_FILE_NAME}: {err}"),
        None => anyhow!("no location configured for {LOG_FILE_NAME}"),
    })
}
