//! User configuration port
//!
//! Persists per-user telemetry preferences between invocations.

use domain::UserPreferences;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for loading and saving user preferences
#[cfg_attr(test, automock)]
pub trait UserConfigPort: Send + Sync {
    /// Load preferences, returning defaults when nothing was saved yet
    fn load(&self) -> Result<UserPreferences, ApplicationError>;

    /// Persist preferences
    fn save(&self, preferences: &UserPreferences) -> Result<(), ApplicationError>;
}
