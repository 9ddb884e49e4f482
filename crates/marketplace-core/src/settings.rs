use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE_NAME: &str = "marketplace-installer.toml";

/// Integration constants for the CLI tool and the Marketplace release.
///
/// Every field can be overridden from a TOML file; missing fields keep their
/// defaults. The theme sentinels mirror values printed by the CLI tool and need
/// updating if its output format changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerSettings {
    pub cli_program: String,
    pub plugin_name: String,
    pub expected_extract_dir: String,
    pub extract_dir_keyword: String,
    pub archive_url: String,
    pub theme_url: String,
    pub install_script_url_windows: String,
    pub install_script_url_unix: String,
    pub blank_theme_sentinels: Vec<String>,
    pub unreadable_theme_marker: String,
    pub version_probe_timeout_secs: u64,
    pub http_timeout_secs: Option<u64>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            cli_program: "spicetify".to_string(),
            plugin_name: "marketplace".to_string(),
            expected_extract_dir: "marketplace-dist".to_string(),
            extract_dir_keyword: "marketplace".to_string(),
            archive_url:
                "https://github.com/spicetify/marketplace/releases/latest/download/marketplace.zip"
                    .to_string(),
            theme_url:
                "https://raw.githubusercontent.com/spicetify/marketplace/main/resources/color.ini"
                    .to_string(),
            install_script_url_windows:
                "https://raw.githubusercontent.com/spicetify/cli/main/install.ps1".to_string(),
            install_script_url_unix:
                "https://raw.githubusercontent.com/spicetify/cli/main/install.sh".to_string(),
            blank_theme_sentinels: vec!["blank".to_string(), "default".to_string()],
            unreadable_theme_marker: "???".to_string(),
            version_probe_timeout_secs: 5,
            http_timeout_secs: None,
        }
    }
}

impl InstallerSettings {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let settings: Self =
            toml::from_str(input).context("failed to parse installer settings")?;
        for (field, value) in [
            ("cli_program", &settings.cli_program),
            ("plugin_name", &settings.plugin_name),
            ("expected_extract_dir", &settings.expected_extract_dir),
            ("archive_url", &settings.archive_url),
            ("theme_url", &settings.theme_url),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("settings field '{field}' must not be empty"));
            }
        }
        if settings.version_probe_timeout_secs == 0 {
            return Err(anyhow!(
                "settings field 'version_probe_timeout_secs' must be greater than zero"
            ));
        }
        Ok(settings)
    }

    /// Reads settings from `path`, or returns defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn install_script_url(&self) -> &str {
        if cfg!(windows) {
            &self.install_script_url_windows
        } else {
            &self.install_script_url_unix
        }
    }

    pub fn version_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.version_probe_timeout_secs)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// True when `name` denotes an actually configured theme rather than the
    /// CLI tool's placeholder or unreadable-config output.
    pub fn is_real_theme(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        if self
            .blank_theme_sentinels
            .iter()
            .any(|sentinel| sentinel.eq_ignore_ascii_case(name))
        {
            return false;
        }
        let marker = self.unreadable_theme_marker.as_str();
        marker.is_empty() || !name.contains(marker)
    }
}
