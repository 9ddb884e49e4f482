use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Status {
    Debug,
    Info,
    Step,
    Ok,
    Warn,
    Error,
}

impl Status {
    fn badge(self) -> &'static str {
        match self {
            Self::Debug => "[DEBUG]",
            Self::Info => "[INFO]",
            Self::Step => "[STEP]",
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        }
    }

    fn style(self) -> Style {
        let color = match self {
            Self::Debug => AnsiColor::BrightBlack,
            Self::Info => AnsiColor::Cyan,
            Self::Step => AnsiColor::BrightCyan,
            Self::Ok => AnsiColor::Green,
            Self::Warn => AnsiColor::Yellow,
            Self::Error => AnsiColor::Red,
        };
        let style = Style::new().fg_color(Some(color.into()));
        match self {
            Self::Error | Self::Step => style.effects(Effects::BOLD),
            _ => style,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalSpinner {
    style: OutputStyle,
    label: String,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    /// Prints a status line and records it in the log at the matching level.
    pub(crate) fn print_status(self, status: Status, message: &str) {
        log_status(status, message);
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        log_status(Status::Info, title);
        println!();
        let line = format!("== {title} ==");
        match self.style {
            OutputStyle::Plain => println!("{line}"),
            OutputStyle::Rich => println!("{}", colorize(section_style(), &line)),
        }
    }

    /// Spinner for a step whose length is unknown. Plain output gets none.
    pub(crate) fn start_spinner(self, label: &str) -> TerminalSpinner {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}") {
                progress_bar.set_style(style.tick_chars("|/-\\ "));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalSpinner {
            style: self.style,
            label: label.to_string(),
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalSpinner {
    pub(crate) fn finish_success(mut self) {
        let elapsed = self.started_at.elapsed();
        tracing::debug!(step = %self.label, elapsed_ms = elapsed.as_millis() as u64, "step finished");
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };
        progress_bar.finish_and_clear();
        if let Some(line) = render_finished_line(self.style, &self.label, elapsed) {
            println!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: Status, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", colorize(status.style(), status.badge())),
    }
}

fn render_finished_line(style: OutputStyle, label: &str, elapsed: Duration) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }
    Some(format!(
        "{} {label} complete in {}",
        colorize(Status::Ok.style(), Status::Ok.badge()),
        format_elapsed(elapsed)
    ))
}

pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

/// Joins the non-blank lines of `message` so one status line is one log line.
pub(crate) fn flatten_lines(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn log_status(status: Status, message: &str) {
    let message = flatten_lines(message);
    match status {
        Status::Debug => tracing::debug!(target: "console", "{message}"),
        Status::Info | Status::Step | Status::Ok => tracing::info!(target: "console", "{message}"),
        Status::Warn => tracing::warn!(target: "console", "{message}"),
        Status::Error => tracing::error!(target: "console", "{message}"),
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightYellow.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
