mod archive;
mod bootstrap;
mod cleanup;
mod configure;
mod fetch;
mod fs_utils;
mod paths;
mod runner;

pub use archive::{install_archive, LayoutHints};
pub use bootstrap::{
    install_cli_tool, install_script_path, is_cli_installed, script_invocation, ScriptRunOutcome,
    INSTALL_SCRIPT_ANSWERS,
};
pub use cleanup::{remove_data_dirs, run_restore, CleanupReport, DirRemoval};
pub use configure::{ConfigEvent, ConfigurationApplier};
pub use fetch::{fetch_text_to_path, ArtifactFetcher, FetchError, HttpFetcher, USER_AGENT};
pub use paths::{
    resolve_user_data_path, select_user_data_path, HostDirs, InstallationPaths,
    UserDataResolution, UserDataSource, CUSTOM_APPS_DIR, THEMES_DIR, THEME_COLOR_FILE,
};
pub use runner::{CommandRunner, ProcessRunner, BYPASS_ADMIN_FLAG};
