//! Locations of devtrail's per-user files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Directory under the home directory holding every devtrail file
pub const DEFAULT_DIR: &str = ".devtrail";

/// Span log written by the file exporter
pub const SPAN_FILE: &str = "spans.json";

/// Metric summary written by the file exporter
pub const METRIC_FILE: &str = "metrics.json";

/// User preferences
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Telemetry settings overrides
pub const SETTINGS_FILE: &str = "settings.toml";

/// Path management for devtrail's user files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevtrailPaths {
    /// Root directory (`~/.devtrail`)
    pub root: PathBuf,
    /// Span log
    pub span_file: PathBuf,
    /// Metric summary
    pub metric_file: PathBuf,
    /// User preferences
    pub user_config_file: PathBuf,
    /// Telemetry settings
    pub settings_file: PathBuf,
}

impl DevtrailPaths {
    /// Paths under the current user's home directory
    pub fn from_home() -> io::Result<Self> {
        let dirs = BaseDirs::new().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Failed to determine home directory")
        })?;
        Ok(Self::for_root(dirs.home_dir().join(DEFAULT_DIR)))
    }

    /// Paths under an explicit root directory
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            span_file: root.join(SPAN_FILE),
            metric_file: root.join(METRIC_FILE),
            user_config_file: root.join(USER_CONFIG_FILE),
            settings_file: root.join(SETTINGS_FILE),
            root,
        }
    }

    /// Create the root directory if it does not exist yet
    pub fn ensure_root(&self) -> io::Result<&Path> {
        fs::create_dir_all(&self.root)?;
        Ok(&self.root)
    }
}
