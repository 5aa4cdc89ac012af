//! TOML file storage for user preferences

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use application::error::ApplicationError;
use application::ports::UserConfigPort;
use domain::UserPreferences;
use tracing::debug;

use super::error::ConfigStoreError;

/// Stores [`UserPreferences`] in a TOML file
///
/// A missing file reads as default preferences. Saving creates the parent
/// directory and replaces the file through a rename, so readers never see
/// a half-written file.
#[derive(Debug, Clone)]
pub struct TomlUserConfigStore {
    path: PathBuf,
}

impl TomlUserConfigStore {
    /// Create a store for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> ConfigStoreError {
        ConfigStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<UserPreferences, ConfigStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No user config yet, using defaults");
                return Ok(UserPreferences::default());
            },
            Err(e) => return Err(self.io_error(e)),
        };

        toml::from_str(&contents).map_err(|source| ConfigStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, preferences: &UserPreferences) -> Result<(), ConfigStoreError> {
        let contents = toml::to_string_pretty(preferences)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, contents).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "Saved user config");
        Ok(())
    }
}

impl UserConfigPort for TomlUserConfigStore {
    fn load(&self) -> Result<UserPreferences, ApplicationError> {
        Ok(self.read()?)
    }

    fn save(&self, preferences: &UserPreferences) -> Result<(), ApplicationError> {
        Ok(self.write(preferences)?)
    }
}
