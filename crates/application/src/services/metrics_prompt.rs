//! Metrics collection notice and consent
//!
//! Shows a one-time notice about usage metrics on interactive terminals and
//! lets users opt in or out.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use domain::UserPreferences;
use tracing::{debug, info};

use crate::error::ApplicationError;
use crate::ports::UserConfigPort;

/// Notice shown the first time metrics collection is active
pub const METRICS_PROMPT: &str = "\
devtrail collects anonymous usage metrics (command, duration, builder and deployer types)
to help improve the tool. No project names, paths or image names are recorded.
To opt out, run: devtrail metrics disable
";

/// Shows the metrics notice and manages the collection preference
pub struct MetricsPromptService {
    store: Arc<dyn UserConfigPort>,
}

impl fmt::Debug for MetricsPromptService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsPromptService").finish_non_exhaustive()
    }
}

impl MetricsPromptService {
    /// Create a service backed by the given preference store
    pub fn new(store: Arc<dyn UserConfigPort>) -> Self {
        Self { store }
    }

    /// Show the notice if it is due
    ///
    /// Nothing is written, and the store is not touched, unless `out` is an
    /// interactive terminal. The notice is shown once, and never to users
    /// who already made an explicit choice. Returns whether it was shown.
    pub fn display(&self, out: &mut dyn Write, is_terminal: bool) -> Result<bool, ApplicationError> {
        if !is_terminal {
            return Ok(false);
        }

        let mut preferences = self.store.load()?;
        if preferences.was_prompted() || preferences.collect_metrics.is_some() {
            debug!("Metrics notice already handled");
            return Ok(false);
        }

        out.write_all(METRICS_PROMPT.as_bytes())?;
        preferences.mark_prompted(Utc::now());
        self.store.save(&preferences)?;
        Ok(true)
    }

    /// Opt in to or out of metrics collection
    pub fn set_collection(&self, enabled: bool) -> Result<UserPreferences, ApplicationError> {
        let mut preferences = self.store.load()?;
        preferences.collect_metrics = Some(enabled);
        self.store.save(&preferences)?;
        info!(enabled, "Updated metrics collection preference");
        Ok(preferences)
    }

    /// Current preferences
    pub fn status(&self) -> Result<UserPreferences, ApplicationError> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockUserConfigPort;

    fn service(mock: MockUserConfigPort) -> MetricsPromptService {
        MetricsPromptService::new(Arc::new(mock))
    }

    #[test]
    fn prints_prompt_on_terminal() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load()
            .times(1)
            .returning(|| Ok(UserPreferences::default()));
        mock.expect_save()
            .withf(|prefs| prefs.was_prompted() && prefs.collect_metrics.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let mut buf = Vec::new();
        let shown = service(mock).display(&mut buf, true).unwrap();

        assert!(shown);
        assert_eq!(String::from_utf8(buf).unwrap(), METRICS_PROMPT);
    }

    #[test]
    fn stays_silent_when_not_a_terminal() {
        // no expectations: any store access fails the test
        let mock = MockUserConfigPort::new();

        let mut buf = Vec::new();
        let shown = service(mock).display(&mut buf, false).unwrap();

        assert!(!shown);
        assert!(buf.is_empty());
    }

    #[test]
    fn prompts_only_once() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load().times(1).returning(|| {
            let mut prefs = UserPreferences::default();
            prefs.mark_prompted(Utc::now());
            Ok(prefs)
        });
        mock.expect_save().times(0);

        let mut buf = Vec::new();
        let shown = service(mock).display(&mut buf, true).unwrap();

        assert!(!shown);
        assert!(buf.is_empty());
    }

    #[test]
    fn explicit_choice_suppresses_prompt() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load().returning(|| {
            Ok(UserPreferences {
                collect_metrics: Some(false),
                ..Default::default()
            })
        });
        mock.expect_save().times(0);

        let mut buf = Vec::new();
        assert!(!service(mock).display(&mut buf, true).unwrap());
    }

    #[test]
    fn save_failure_is_reported() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load()
            .returning(|| Ok(UserPreferences::default()));
        mock.expect_save()
            .returning(|_| Err(ApplicationError::UserConfig("read-only".to_string())));

        let mut buf = Vec::new();
        let err = service(mock).display(&mut buf, true).unwrap_err();
        assert!(matches!(err, ApplicationError::UserConfig(_)));
    }

    #[test]
    fn set_collection_persists_choice() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load()
            .returning(|| Ok(UserPreferences::default()));
        mock.expect_save()
            .withf(|prefs| prefs.collect_metrics == Some(false))
            .times(1)
            .returning(|_| Ok(()));

        let prefs = service(mock).set_collection(false).unwrap();
        assert!(!prefs.metrics_enabled());
    }

    #[test]
    fn status_reads_store() {
        let mut mock = MockUserConfigPort::new();
        mock.expect_load().returning(|| {
            Ok(UserPreferences {
                collect_metrics: Some(true),
                ..Default::default()
            })
        });

        let prefs = service(mock).status().unwrap();
        assert_eq!(prefs.collect_metrics, Some(true));
    }
}
