//! Per-user telemetry preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Telemetry preferences stored in the user config directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Explicit opt-in/opt-out; unset means collection is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_metrics: Option<bool>,

    /// When the metrics notice was last shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_prompted_at: Option<DateTime<Utc>>,

    /// Anonymous identifier attached to exported telemetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<Uuid>,
}

impl UserPreferences {
    /// Whether usage metrics may be collected
    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        self.collect_metrics.unwrap_or(true)
    }

    /// Whether the metrics notice has already been shown
    #[must_use]
    pub const fn was_prompted(&self) -> bool {
        self.metrics_prompted_at.is_some()
    }

    /// Record that the metrics notice was shown
    pub fn mark_prompted(&mut self, at: DateTime<Utc>) {
        self.metrics_prompted_at = Some(at);
    }

    /// Return the installation id, generating one on first use
    ///
    /// The boolean is `true` when a new id was generated and the
    /// preferences need to be persisted.
    pub fn ensure_installation_id(&mut self) -> (Uuid, bool) {
        match self.installation_id {
            Some(id) => (id, false),
            None => {
                let id = Uuid::new_v4();
                self.installation_id = Some(id);
                (id, true)
            },
        }
    }
}
