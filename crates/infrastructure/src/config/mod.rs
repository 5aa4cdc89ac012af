//! Telemetry settings
//!
//! Settings are layered: built-in defaults, then the optional
//! `~/.devtrail/settings.toml`, then `DEVTRAIL_*` environment variables.
//! The cloud project is read from `PROJECT_ID` unless set explicitly.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming the cloud project
pub const PROJECT_ID_ENV: &str = "PROJECT_ID";

/// Prefix of settings environment variables (e.g. `DEVTRAIL_TARGET=cloud`)
pub const ENV_PREFIX: &str = "DEVTRAIL";

/// Where spans and metrics are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryTarget {
    /// Local span log and metric summary under `~/.devtrail`
    #[default]
    File,
    /// OTLP export tagged with a cloud project
    Cloud,
    /// No export
    Off,
}

impl fmt::Display for TelemetryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Cloud => write!(f, "cloud"),
            Self::Off => write!(f, "off"),
        }
    }
}

impl std::str::FromStr for TelemetryTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "local" => Ok(Self::File),
            "cloud" | "otlp" => Ok(Self::Cloud),
            "off" | "none" | "disabled" => Ok(Self::Off),
            _ => Err(format!(
                "Invalid telemetry target: {s}. Use 'file', 'cloud' or 'off'"
            )),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Export destination
    #[serde(default)]
    pub target: TelemetryTarget,

    /// Cloud project receiving spans and metrics
    #[serde(default)]
    pub project_id: Option<String>,

    /// OTLP endpoint URL (gRPC) used by the cloud target
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,

    /// Service name attached to exported telemetry
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Export timeout in seconds
    #[serde(default = "default_export_timeout")]
    pub export_timeout_secs: u64,

    /// Log filter overriding the CLI verbosity (e.g. "devtrail=debug")
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "devtrail".to_string()
}

const fn default_export_timeout() -> u64 {
    10
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            target: TelemetryTarget::default(),
            project_id: None,
            otlp_endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
            export_timeout_secs: default_export_timeout(),
            log_filter: None,
        }
    }
}

impl TelemetrySettings {
    /// Load settings from `settings_file` and the process environment
    pub fn load(settings_file: &Path) -> Result<Self, config::ConfigError> {
        Self::load_with_env(settings_file, None)
    }

    /// Load settings with an explicit environment
    ///
    /// `None` reads the process environment; tests pass a fixed map.
    pub fn load_with_env(
        settings_file: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let project_from_env = match &env {
            Some(vars) => vars.get(PROJECT_ID_ENV).cloned(),
            None => std::env::var(PROJECT_ID_ENV).ok(),
        };

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(settings_file).required(false))
            // Override with environment variables (e.g., DEVTRAIL_TARGET)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            );

        let mut settings: Self = builder.build()?.try_deserialize()?;
        if settings.project_id.as_deref().is_none_or(str::is_empty) {
            settings.project_id = project_from_env.filter(|id| !id.is_empty());
        }

        debug!(
            target_kind = %settings.target,
            project = ?settings.project_id,
            "Loaded telemetry settings"
        );
        Ok(settings)
    }

    /// Check that the selected target has what it needs
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.target == TelemetryTarget::Cloud && self.project_id.is_none() {
            return Err(config::ConfigError::Message(format!(
                "cloud telemetry requires a project id (set {PROJECT_ID_ENV})"
            )));
        }
        if self.export_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "export_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_settings_default() {
        let settings = TelemetrySettings::default();
        assert_eq!(settings.target, TelemetryTarget::File);
        assert_eq!(settings.otlp_endpoint, "http://localhost:4317");
        assert_eq!(settings.service_name, "devtrail");
        assert_eq!(settings.export_timeout_secs, 10);
        assert!(settings.project_id.is_none());
        assert!(settings.log_filter.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            TelemetrySettings::load_with_env(&dir.path().join("settings.toml"), env(&[])).unwrap();
        assert_eq!(settings, TelemetrySettings::default());
    }

    #[test]
    fn test_file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.toml");
        std::fs::write(
            &file,
            "target = \"cloud\"\nproject_id = \"my-project\"\nexport_timeout_secs = 3\n",
        )
        .unwrap();

        let settings = TelemetrySettings::load_with_env(&file, env(&[])).unwrap();
        assert_eq!(settings.target, TelemetryTarget::Cloud);
        assert_eq!(settings.project_id.as_deref(), Some("my-project"));
        assert_eq!(settings.export_timeout_secs, 3);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.toml");
        std::fs::write(&file, "target = \"cloud\"\n").unwrap();

        let settings = TelemetrySettings::load_with_env(
            &file,
            env(&[("DEVTRAIL_TARGET", "off"), ("DEVTRAIL_SERVICE_NAME", "ci")]),
        )
        .unwrap();
        assert_eq!(settings.target, TelemetryTarget::Off);
        assert_eq!(settings.service_name, "ci");
    }

    #[test]
    fn test_project_id_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TelemetrySettings::load_with_env(
            &dir.path().join("settings.toml"),
            env(&[("PROJECT_ID", "env-project")]),
        )
        .unwrap();
        assert_eq!(settings.project_id.as_deref(), Some("env-project"));
    }

    #[test]
    fn test_empty_project_id_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TelemetrySettings::load_with_env(
            &dir.path().join("settings.toml"),
            env(&[("PROJECT_ID", "")]),
        )
        .unwrap();
        assert!(settings.project_id.is_none());
    }

    #[test]
    fn test_cloud_without_project_fails_validation() {
        let settings = TelemetrySettings {
            target: TelemetryTarget::Cloud,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("PROJECT_ID"));
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let settings = TelemetrySettings {
            export_timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_file_target_validates() {
        assert!(TelemetrySettings::default().validate().is_ok());
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("CLOUD".parse::<TelemetryTarget>().unwrap(), TelemetryTarget::Cloud);
        assert_eq!("local".parse::<TelemetryTarget>().unwrap(), TelemetryTarget::File);
        assert_eq!("none".parse::<TelemetryTarget>().unwrap(), TelemetryTarget::Off);
        assert!("stdout".parse::<TelemetryTarget>().is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(TelemetryTarget::File.to_string(), "file");
        assert_eq!(TelemetryTarget::Cloud.to_string(), "cloud");
        assert_eq!(TelemetryTarget::Off.to_string(), "off");
    }
}
