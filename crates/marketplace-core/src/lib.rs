mod catalog;
mod command;
mod outcome;
mod prompt;
mod settings;

pub use catalog::{translate, translate_with, Catalog, Locale, Message, MESSAGES};
pub use command::{
    combine_streams, parse_cli_version, CommandInvocation, CommandResult,
    LAUNCH_FAILED_EXIT_CODE, STDERR_LABEL, TERMINATED_EXIT_CODE,
};
pub use outcome::{
    ExtractionOutcome, InstallRunOutcome, SessionReport, ThemeConflictDecision,
};
pub use prompt::{Prompt, ScriptedPrompt};
pub use settings::{InstallerSettings, SETTINGS_FILE_NAME};
