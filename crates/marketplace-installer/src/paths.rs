use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use marketplace_core::{CommandInvocation, CommandResult, InstallerSettings};

use crate::fs_utils::remove_dir_if_exists;
use crate::runner::CommandRunner;

pub const CUSTOM_APPS_DIR: &str = "CustomApps";
pub const THEMES_DIR: &str = "Themes";
pub const THEME_COLOR_FILE: &str = "color.ini";

/// Where the plugin lives inside the CLI tool's user-data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPaths {
    user_data_root: PathBuf,
    custom_app_dir: PathBuf,
    theme_dir: PathBuf,
}

impl InstallationPaths {
    pub fn new(user_data_root: impl Into<PathBuf>, plugin_name: &str) -> Result<Self> {
        let user_data_root = user_data_root.into();
        if user_data_root.as_os_str().is_empty() {
            return Err(anyhow!("user-data path must not be empty"));
        }
        if plugin_name.trim().is_empty() {
            return Err(anyhow!("plugin name must not be empty"));
        }
        Ok(Self {
            custom_app_dir: user_data_root.join(CUSTOM_APPS_DIR).join(plugin_name),
            theme_dir: user_data_root.join(THEMES_DIR).join(plugin_name),
            user_data_root,
        })
    }

    pub fn custom_apps_base(&self) -> PathBuf {
        self.user_data_root.join(CUSTOM_APPS_DIR)
    }

    pub fn themes_base(&self) -> PathBuf {
        self.user_data_root.join(THEMES_DIR)
    }

    pub fn custom_app_dir(&self) -> &Path {
        &self.custom_app_dir
    }

    pub fn theme_dir(&self) -> &Path {
        &self.theme_dir
    }

    pub fn theme_color_path(&self) -> PathBuf {
        self.theme_dir.join(THEME_COLOR_FILE)
    }

    /// Recreates both plugin directories from scratch.
    ///
    /// Creating any directory is fatal on failure. Removing a stale plugin
    /// directory is not: the failure is returned so the caller can warn.
    pub fn prepare_directories(&self) -> Result<Vec<(PathBuf, String)>> {
        if !self.user_data_root.exists() {
            tracing::info!(path = %self.user_data_root.display(), "creating missing user-data directory");
        }
        fs::create_dir_all(&self.user_data_root).with_context(|| {
            format!(
                "failed to create user-data directory {}",
                self.user_data_root.display()
            )
        })?;

        let mut removal_failures = Vec::new();
        for dir in [&self.custom_app_dir, &self.theme_dir] {
            match remove_dir_if_exists(dir) {
                Ok(true) => tracing::info!(path = %dir.display(), "removed existing plugin directory"),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(path = %dir.display(), error = %err, "failed to remove existing plugin directory");
                    removal_failures.push((dir.clone(), err.to_string()));
                }
            }
        }

        for dir in [
            self.custom_apps_base(),
            self.themes_base(),
            self.custom_app_dir.clone(),
            self.theme_dir.clone(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        tracing::info!("plugin directories prepared");
        Ok(removal_failures)
    }
}

/// Host locations that depend on OS conventions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostDirs {
    /// User-data directory used when the CLI tool does not report a usable one.
    pub fallback_user_data: PathBuf,
    /// CLI-tool data directories wiped during a force reinstall.
    pub cli_data_dirs: Vec<PathBuf>,
}

impl HostDirs {
    /// Derives locations from environment variables. A variable that is not
    /// set leaves its location out (or empty, for the fallback).
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        if cfg!(windows) {
            let app_data = var("APPDATA").map(|dir| dir.join("spicetify"));
            let local_app_data = var("LOCALAPPDATA").map(|dir| dir.join("spicetify"));
            let profile = var("USERPROFILE").map(|dir| dir.join(".spicetify"));
            return Self {
                fallback_user_data: app_data.clone().unwrap_or_default(),
                cli_data_dirs: [app_data, local_app_data, profile]
                    .into_iter()
                    .flatten()
                    .collect(),
            };
        }

        let home = var("HOME");
        let config = var("XDG_CONFIG_HOME")
            .or_else(|| home.as_ref().map(|home| home.join(".config")))
            .map(|dir| dir.join("spicetify"));
        let dot_dir = home.as_ref().map(|home| home.join(".spicetify"));
        let share = home
            .as_ref()
            .map(|home| home.join(".local").join("share").join("spicetify"));
        Self {
            fallback_user_data: config.clone().unwrap_or_default(),
            cli_data_dirs: [config, dot_dir, share].into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDataSource {
    CommandOutput,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataResolution {
    pub path: PathBuf,
    pub source: UserDataSource,
    pub command: CommandResult,
}

/// First trimmed, non-blank line that names an existing directory.
pub fn select_user_data_path(output: &str) -> Option<PathBuf> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .find(|candidate| candidate.is_dir())
}

/// Asks the CLI tool for its user-data directory, falling back to the host
/// default. Only an empty final path is an error.
pub fn resolve_user_data_path(
    runner: &dyn CommandRunner,
    settings: &InstallerSettings,
    host: &HostDirs,
) -> Result<UserDataResolution> {
    let invocation =
        CommandInvocation::new(settings.cli_program.as_str(), ["path", "userdata"]).captured();
    let command = runner.invoke(&invocation);
    tracing::debug!(
        exit_code = command.exit_code,
        "raw 'path userdata' output:\n{}",
        command.output
    );
    if !command.success() {
        tracing::error!(
            exit_code = command.exit_code,
            output = %command.output,
            "'path userdata' command failed"
        );
    }

    let resolution = match select_user_data_path(&command.output) {
        Some(path) => {
            tracing::info!(path = %path.display(), "user-data path parsed from command output");
            UserDataResolution {
                path,
                source: UserDataSource::CommandOutput,
                command,
            }
        }
        None => {
            tracing::warn!(
                fallback = %host.fallback_user_data.display(),
                "no usable user-data path in command output; using fallback"
            );
            UserDataResolution {
                path: host.fallback_user_data.clone(),
                source: UserDataSource::Fallback,
                command,
            }
        }
    };

    if resolution.path.as_os_str().is_empty() {
        tracing::error!("user-data path is empty even after fallback");
        return Err(anyhow!(
            "failed to determine the CLI tool's user-data path"
        ));
    }
    Ok(resolution)
}
