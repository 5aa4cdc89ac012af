//! Metric instrument descriptors
//!
//! Every instrument emitted at the end of a run is described here so that
//! sinks agree on names, descriptions and units.

use std::borrow::Cow;

use crate::value_objects::RunMode;

/// How an instrument aggregates its samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Monotonic sum of increments
    Counter,
    /// Distribution of individual samples
    Recorder,
}

/// Name, description and unit of a metric instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    /// Instrument name as exported
    pub name: Cow<'static, str>,
    /// Human-readable description
    pub description: Cow<'static, str>,
    /// Unit of measurement (UCUM), if any
    pub unit: Option<&'static str>,
    /// Aggregation kind
    pub kind: InstrumentKind,
}

impl Instrument {
    /// Describe a counter
    #[must_use]
    pub const fn counter(name: &'static str, description: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            unit: None,
            kind: InstrumentKind::Counter,
        }
    }

    /// Describe a recorder
    #[must_use]
    pub const fn recorder(name: &'static str, description: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            unit: None,
            kind: InstrumentKind::Recorder,
        }
    }

    /// Attach a unit
    #[must_use]
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// Instruments emitted when a run is finalized
pub mod instruments {
    use super::{Cow, Instrument, InstrumentKind, RunMode};

    /// Invocation count
    pub const RUNS: Instrument = Instrument::counter("runs", "Invocations");

    /// Artifacts built, labelled by builder
    pub const ARTIFACT_TYPES: Instrument =
        Instrument::counter("artifact/types", "Count of each artifact type");

    /// Deployers used, labelled by deployer
    pub const DEPLOYERS: Instrument = Instrument::counter("deployers", "Count of deployers used");

    /// Dev-loop iterations in a session
    pub const SYNC_SESSION_COUNT: Instrument =
        Instrument::recorder("sync/session/count", "Number of syncs in a session");

    /// Duration of a run, named after its mode
    #[must_use]
    pub fn command_duration(mode: RunMode) -> Instrument {
        Instrument {
            name: Cow::Borrowed(mode.as_str()),
            description: Cow::Owned(format!("durations of {mode} in seconds")),
            unit: Some("s"),
            kind: InstrumentKind::Recorder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_is_a_counter() {
        assert_eq!(instruments::RUNS.name, "runs");
        assert_eq!(instruments::RUNS.kind, InstrumentKind::Counter);
        assert!(instruments::RUNS.unit.is_none());
    }

    #[test]
    fn sync_count_is_a_recorder() {
        assert_eq!(instruments::SYNC_SESSION_COUNT.name, "sync/session/count");
        assert_eq!(
            instruments::SYNC_SESSION_COUNT.kind,
            InstrumentKind::Recorder
        );
    }

    #[test]
    fn command_duration_is_named_after_mode() {
        let duration = instruments::command_duration(RunMode::Dev);
        assert_eq!(duration.name, "dev");
        assert_eq!(duration.description, "durations of dev in seconds");
        assert_eq!(duration.unit, Some("s"));
        assert_eq!(duration.kind, InstrumentKind::Recorder);
    }

    #[test]
    fn with_unit_sets_unit() {
        let instrument = Instrument::recorder("latency", "Latency").with_unit("ms");
        assert_eq!(instrument.unit, Some("ms"));
    }
}
