// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SyncError};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (URLs, durations). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration the CLI runs with.
///
/// - `path: Some(..)` must exist.
/// - `path: None` reads [`default_config_path`] if present, otherwise uses
///   built-in defaults.
/// - `api_url` overrides `[server].api_url` before validation, so a derived
///   stream URL follows it.
pub fn load_config(path: Option<&Path>, api_url: Option<&str>) -> Result<ConfigFile> {
    let mut raw = match path {
        Some(path) => load_from_path(path).map_err(|e| match e {
            SyncError::IoError(io) => SyncError::ConfigError(format!(
                "cannot read config file '{}': {io}",
                path.display()
            )),
            other => other,
        })?,
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                debug!(path = %default_path.display(), "loading default config file");
                load_from_path(&default_path)?
            } else {
                debug!("no config file found; using built-in defaults");
                RawConfigFile::default()
            }
        }
    };

    if let Some(api_url) = api_url {
        raw.server.api_url = api_url.to_string();
    }

    ConfigFile::try_from(raw)
}

/// Config file looked up in the current working directory when `--config`
/// is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Livesync.toml")
}
