//! Loading `.deepshift.toml` from the root being shifted.

use crate::config::schema::{ShiftConfig, ValidationError};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional per-root configuration file.
pub const CONFIG_FILE_NAME: &str = ".deepshift.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("{} is not valid TOML: {source}", origin(.path))]
    Malformed {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("{} rejected:\n{source}", origin(.path))]
    Rejected {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "shift configuration".to_string(),
    }
}

fn parse(input: &str, path: Option<&Path>) -> Result<ShiftConfig, ConfigError> {
    let owned_path = || path.map(Path::to_path_buf);

    let config: ShiftConfig = toml_edit::de::from_str(input).map_err(|source| {
        ConfigError::Malformed {
            path: owned_path(),
            source,
        }
    })?;
    config.validate().map_err(|source| ConfigError::Rejected {
        path: owned_path(),
        source,
    })?;

    Ok(config)
}

/// Parse a configuration held in memory.
pub fn load_from_str(input: &str) -> Result<ShiftConfig, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ShiftConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, Some(path))
}

/// Load `<root>/.deepshift.toml`; a root without one gets the defaults.
pub fn load_for_root(root: &Path) -> Result<ShiftConfig, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    match load_from_path(&path) {
        Err(ConfigError::Unreadable { source, .. }) if source.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ShiftConfig::default())
        }
        other => other,
    }
}
