use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use marketplace_core::{
    combine_streams, CommandInvocation, CommandResult, TERMINATED_EXIT_CODE,
};

pub const BYPASS_ADMIN_FLAG: &str = "--bypass-admin";

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs external programs and reports every outcome as a [`CommandResult`].
///
/// Implementations never fail: launch errors become a result carrying a
/// negative exit code.
pub trait CommandRunner {
    /// Runs a CLI-tool command.
    fn invoke(&self, invocation: &CommandInvocation) -> CommandResult;

    /// Captured run that gives up after `timeout`, killing the child.
    fn probe(&self, invocation: &CommandInvocation, timeout: Duration) -> CommandResult;

    /// Captured run that feeds `input_lines` to stdin and then closes it.
    fn run_with_input(&self, invocation: &CommandInvocation, input_lines: &[&str])
        -> CommandResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessRunner {
    bypass_admin: bool,
}

impl ProcessRunner {
    pub fn new(bypass_admin: bool) -> Self {
        Self { bypass_admin }
    }

    pub fn bypass_admin(&self) -> bool {
        self.bypass_admin
    }

    /// Argument list for a CLI-tool call, with the bypass flag in front when enabled.
    pub fn cli_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        if self.bypass_admin {
            full.push(BYPASS_ADMIN_FLAG.to_string());
        }
        full.extend(args.iter().cloned());
        full
    }
}

impl CommandRunner for ProcessRunner {
    fn invoke(&self, invocation: &CommandInvocation) -> CommandResult {
        let args = self.cli_args(&invocation.args);
        let effective = CommandInvocation {
            program: invocation.program.clone(),
            args,
            capture_output: invocation.capture_output,
        };
        let line = effective.display_line();
        tracing::info!(command = %line, capture = effective.capture_output, "running command");
        let started = Instant::now();

        let mut command = Command::new(&effective.program);
        command.args(&effective.args);
        let result = if effective.capture_output {
            match command.output() {
                Ok(output) => captured_result(&output),
                Err(err) => CommandResult::launch_failed(err),
            }
        } else {
            match command.status() {
                Ok(status) => CommandResult::new(
                    String::new(),
                    status.code().unwrap_or(TERMINATED_EXIT_CODE),
                ),
                Err(err) => CommandResult::launch_failed(err),
            }
        };

        log_result(&line, &result, started.elapsed());
        result
    }

    fn probe(&self, invocation: &CommandInvocation, timeout: Duration) -> CommandResult {
        let line = invocation.display_line();
        tracing::debug!(command = %line, timeout_ms = timeout.as_millis() as u64, "probing");
        let started = Instant::now();

        let mut child = match Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(command = %line, error = %err, "probe failed to start");
                return CommandResult::launch_failed(err);
            }
        };

        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if started.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(command = %line, "probe timed out; process killed");
                    return CommandResult::new(
                        format!("timed out after {}ms", timeout.as_millis()),
                        TERMINATED_EXIT_CODE,
                    );
                }
                Ok(None) => thread::sleep(PROBE_POLL_INTERVAL),
                Err(err) => {
                    let _ = child.kill();
                    return CommandResult::launch_failed(err);
                }
            }
        }

        let result = match child.wait_with_output() {
            Ok(output) => captured_result(&output),
            Err(err) => CommandResult::launch_failed(err),
        };
        log_result(&line, &result, started.elapsed());
        result
    }

    fn run_with_input(
        &self,
        invocation: &CommandInvocation,
        input_lines: &[&str],
    ) -> CommandResult {
        let line = invocation.display_line();
        tracing::info!(command = %line, answers = input_lines.len(), "running with scripted input");
        let started = Instant::now();

        let mut child = match Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => return CommandResult::launch_failed(err),
        };

        if let Some(mut stdin) = child.stdin.take() {
            for answer in input_lines {
                if let Err(err) = writeln!(stdin, "{answer}") {
                    tracing::warn!(command = %line, error = %err, "failed writing to child stdin");
                    break;
                }
            }
        }

        let result = match child.wait_with_output() {
            Ok(output) => captured_result(&output),
            Err(err) => CommandResult::launch_failed(err),
        };
        log_result(&line, &result, started.elapsed());
        result
    }
}

fn captured_result(output: &Output) -> CommandResult {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    CommandResult::new(
        combine_streams(&stdout, &stderr),
        output.status.code().unwrap_or(TERMINATED_EXIT_CODE),
    )
}

fn log_result(line: &str, result: &CommandResult, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if result.success() {
        tracing::debug!(command = %line, exit_code = result.exit_code, elapsed_ms, "command finished");
    } else {
        tracing::warn!(
            command = %line,
            exit_code = result.exit_code,
            elapsed_ms,
            output = %result.output,
            "command failed"
        );
    }
    if !result.output.is_empty() {
        tracing::debug!(command = %line, "output:\n{}", result.output);
    }
}
