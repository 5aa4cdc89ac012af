//! Errors of the file-backed user configuration store

use std::io;
use std::path::PathBuf;

use application::error::ApplicationError;
use thiserror::Error;

/// Failure reading or writing the user configuration file
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// The file could not be read or written
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not valid TOML for the preferences
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The preferences could not be encoded
    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),
}

impl From<ConfigStoreError> for ApplicationError {
    fn from(err: ConfigStoreError) -> Self {
        Self::UserConfig(err.to_string())
    }
}
