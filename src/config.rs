//! Optional TOML configuration for the command-line defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::library::naming::sanitize_segment;
use crate::zotero::creators::DEFAULT_AUTHOR_SEPARATOR;
use crate::zotero::extract::{DEFAULT_SUBFOLDER, DEFAULT_TIME_FORMAT, is_valid_time_format};

const APP_DIR: &str = "zotero-import";
const CONFIG_FILE: &str = "config.toml";

/// Values read from `config.toml`; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Destination used when `--out` is not given.
    pub library_dir: Option<PathBuf>,
    /// chrono format for `time-added`.
    pub time_format: Option<String>,
    /// Folder for items outside any collection.
    pub default_subfolder: Option<String>,
    /// Separator between rendered authors.
    pub author_separator: Option<String>,
    /// Link files instead of copying them.
    pub link: Option<bool>,
}

impl FileConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Fails on TOML syntax errors, unknown keys, or invalid values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that TOML types alone cannot.
    ///
    /// # Errors
    ///
    /// Names the offending key.
    pub fn validate(&self) -> Result<()> {
        if let Some(format) = &self.time_format
            && (format.is_empty() || !is_valid_time_format(format))
        {
            bail!("Invalid config value for `time_format`: {format:?}. Expected a chrono strftime format such as \"%Y-%m-%d\"");
        }

        if let Some(folder) = &self.default_subfolder
            && sanitize_segment(folder).as_deref() != Some(folder.as_str())
        {
            bail!("Invalid config value for `default_subfolder`: {folder:?}. Expected a single folder name without separators");
        }

        if let Some(separator) = &self.author_separator
            && separator.is_empty()
        {
            bail!("Invalid config value for `author_separator`: must not be empty");
        }
        Ok(())
    }

    #[must_use]
    pub fn time_format(&self) -> &str {
        self.time_format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
    }

    #[must_use]
    pub fn default_subfolder(&self) -> &str {
        self.default_subfolder.as_deref().unwrap_or(DEFAULT_SUBFOLDER)
    }

    #[must_use]
    pub fn author_separator(&self) -> &str {
        self.author_separator
            .as_deref()
            .unwrap_or(DEFAULT_AUTHOR_SEPARATOR)
    }

    #[must_use]
    pub fn link(&self) -> bool {
        self.link.unwrap_or(false)
    }
}

/// Config as loaded for one run.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was looked at, if one could be resolved.
    pub path: Option<PathBuf>,
    /// Defaults when no file was found.
    pub config: FileConfig,
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/zotero-import/config.toml`
/// 2. `$HOME/.config/zotero-import/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty("XDG_CONFIG_HOME"), env_var_non_empty("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        return Some(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }
    home.map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE)
    })
}

fn env_var_non_empty(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}

/// Loads `explicit`, or the default path when `None`.
///
/// A missing default file yields defaults; a missing explicit file is an
/// error.
///
/// # Errors
///
/// Fails when the file cannot be read or does not validate.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: load_file_config(path)?,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

/// Reads and validates one config file.
///
/// # Errors
///
/// Fails when the file cannot be read or does not validate.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    FileConfig::from_toml(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}
