// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Section-based loading of `drill-rs.toml`.
//!
//! One file may hold several `[<section>]` tables; each binary reads only its own.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "drill-rs.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Config file {0} has no [{1}] section")]
    MissingSection(PathBuf, &'static str),
}

/// Default locations of `drill-rs.toml`, most specific first:
/// current directory, user config directory, `/etc`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("drill-rs").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from("/etc/drill-rs").join(CONFIG_FILE_NAME));
    paths
}

/// `Ok(None)` when the file has no `[key]` table.
fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

    let Some(section) = table.get(key) else {
        return Ok(None);
    };

    // Go through text again so serde defaults apply to the section alone.
    let section_toml = toml::to_string(section)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
    let cfg = toml::from_str::<T>(&section_toml)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
    Ok(Some(cfg))
}

/// A configuration stored as one section of `drill-rs.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key, e.g. `"drill-server"`.
    fn section_key() -> &'static str;

    /// Load the section from an explicit path. The section must be present.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?
            .ok_or_else(|| ConfigError::MissingSection(path.to_path_buf(), Self::section_key()))
    }

    /// Load the first default-path file carrying the section.
    ///
    /// Returns the defaults and `None` when no such file exists.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_from_paths(&config_search_paths())
    }

    fn load_from_paths(paths: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in paths {
            if path.exists() {
                if let Some(cfg) = load_section_from_file::<Self>(path, Self::section_key())? {
                    return Ok((cfg, Some(path.clone())));
                }
            }
        }
        Ok((Self::default(), None))
    }
}
