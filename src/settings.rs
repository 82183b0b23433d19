//! Runtime settings
//!
//! Everything the CLI persists lives below one base directory:
//! `~/.ff-diff`, or `./.ff-diff` when `USE_CURRENT_DIR=true`. An optional
//! `config.toml` there extends the churn key list and overrides the
//! release archive mirror.

use crate::diff::COMMON_CHANGED_VALUE_KEYS;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the base directory
pub const BASE_DIR_NAME: &str = ".ff-diff";

/// Name of the optional configuration file inside the base directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Release archive mirror
pub const DEFAULT_ARCHIVE_BASE_URL: &str = "https://archive.mozilla.org/pub/firefox/releases";

/// Overrides read from `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsPatch {
    hide_changed_keys: Option<Vec<String>>,
    archive_base_url: Option<String>,
}

/// Resolved settings of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub archive_base_url: String,
    /// Keys hidden by `--hide-common-changed-values`
    pub hide_changed_keys: Vec<String>,
}

impl Settings {
    /// Settings for the host, reading `config.toml` if present
    pub fn load() -> Result<Self> {
        Self::load_from(base_dir()?)
    }

    /// Settings rooted at `base_dir`
    pub fn load_from(base_dir: PathBuf) -> Result<Self> {
        let mut settings = Settings {
            base_dir,
            ..Default::default()
        };

        let config_file = settings.base_dir.join(CONFIG_FILE_NAME);
        if config_file.is_file() {
            let content = fs::read_to_string(&config_file)?;
            settings.apply_config(&content, &config_file)?;
            tracing::debug!(file = %config_file.display(), "loaded configuration");
        }
        Ok(settings)
    }

    fn apply_config(&mut self, content: &str, file: &Path) -> Result<()> {
        let patch: SettingsPatch = toml::from_str(content).map_err(|e| Error::Config {
            file: file.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(keys) = patch.hide_changed_keys {
            for key in keys {
                if !self.hide_changed_keys.contains(&key) {
                    self.hide_changed_keys.push(key);
                }
            }
        }
        if let Some(url) = patch.archive_base_url {
            self.archive_base_url = url.trim_end_matches('/').to_string();
        }
        Ok(())
    }

    /// Release archives and installs for the host OS
    pub fn install_dir(&self) -> PathBuf {
        self.base_dir.join("firefox").join(std::env::consts::OS)
    }

    /// Markdown diffs saved by `diff`
    pub fn diffs_dir(&self) -> PathBuf {
        self.base_dir.join("diffs")
    }

    /// user.js documents saved by `default-prefs`
    pub fn defaults_dir(&self) -> PathBuf {
        self.base_dir.join("default")
    }

    /// Reports saved by `default-prefs-userjs`
    pub fn defaults_userjs_dir(&self) -> PathBuf {
        self.base_dir.join("default-userjs")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(BASE_DIR_NAME),
            archive_base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            hide_changed_keys: COMMON_CHANGED_VALUE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Base directory: the working directory when `USE_CURRENT_DIR=true`,
/// the home directory otherwise
fn base_dir() -> Result<PathBuf> {
    let use_current_dir = std::env::var("USE_CURRENT_DIR").is_ok_and(|v| v == "true");
    let root = if use_current_dir {
        std::env::current_dir()?
    } else {
        dirs::home_dir().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "home directory not found",
            ))
        })?
    };
    Ok(root.join(BASE_DIR_NAME))
}

/// Release archive platform for an OS/architecture pair
///
/// Mozilla only publishes the Linux tarballs this tool can extract.
pub fn platform_tag(os: &str, arch: &str) -> Result<String> {
    match (os, arch) {
        ("linux", "x86_64") => Ok("linux-x86_64".to_string()),
        ("linux", "aarch64") => Ok("linux-aarch64".to_string()),
        _ => Err(Error::UnsupportedPlatform(format!("{os}/{arch}"))),
    }
}
