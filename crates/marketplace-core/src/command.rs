use semver::Version;

/// Exit code reported when the process could not be launched at all.
pub const LAUNCH_FAILED_EXIT_CODE: i32 = -1;

/// Exit code reported when the process ended without a code (signal, probe timeout kill).
pub const TERMINATED_EXIT_CODE: i32 = -2;

pub const STDERR_LABEL: &str = "STDERR:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub capture_output: bool,
}

impl CommandInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            capture_output: false,
        }
    }

    pub fn captured(mut self) -> Self {
        self.capture_output = true;
        self
    }

    /// Renders the command line for logs, quoting arguments that contain spaces.
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        for arg in &self.args {
            if arg.contains(' ') {
                parts.push(format!("\"{arg}\""));
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub output: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn new(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    pub fn launch_failed(reason: impl std::fmt::Display) -> Self {
        Self::new(
            format!("failed to launch process: {reason}"),
            LAUNCH_FAILED_EXIT_CODE,
        )
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Joins captured streams the way callers expect to read them: stdout first,
/// then a labeled stderr block when stderr carried anything.
pub fn combine_streams(stdout: &str, stderr: &str) -> String {
    let mut combined = stdout.trim().to_string();
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(STDERR_LABEL);
        combined.push('\n');
        combined.push_str(stderr);
    }
    combined
}

/// Picks the first semantic version token out of a `--version` style output.
pub fn parse_cli_version(output: &str) -> Option<Version> {
    output
        .split_whitespace()
        .map(|token| token.trim_start_matches(['v', 'V']))
        .find_map(|token| Version::parse(token).ok())
}
