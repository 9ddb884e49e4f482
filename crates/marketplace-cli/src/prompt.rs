use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use marketplace_core::Prompt;

/// Reads answers line by line from stdin.
pub(crate) struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        print!("{question}: ");
        if let Err(err) = io::stdout().flush() {
            tracing::warn!(error = %err, "failed to flush prompt");
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => {
                tracing::info!(question = %question, "stdin closed; no answer");
                None
            }
            Ok(_) => {
                let answer = line.trim_end_matches(['\r', '\n']).to_string();
                tracing::info!(answer = %answer, "user answered prompt");
                Some(answer)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read answer");
                None
            }
        }
    }
}

/// Blocks until a key is pressed. Without a terminal there is nothing to wait for.
pub(crate) fn wait_for_keypress() -> Result<()> {
    if !io::stdin().is_terminal() {
        return Ok(());
    }
    enable_raw_mode()?;
    let outcome = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(()),
            Ok(_) => continue,
            Err(err) => break Err(err),
        }
    };
    disable_raw_mode()?;
    Ok(outcome?)
}
