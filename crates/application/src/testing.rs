//! Test doubles shared by the service tests

use domain::{Instrument, InstrumentKind, LabelSet};
use parking_lot::Mutex;

use crate::ports::MetricsPort;

/// A single emission captured by [`RecordingMetrics`]
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub name: String,
    pub kind: InstrumentKind,
    pub value: f64,
    pub labels: LabelSet,
}

/// Metrics sink that keeps every emission in order
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    emissions: Mutex<Vec<Emission>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every emission so far
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().clone()
    }

    /// Emissions for one instrument name
    pub fn named(&self, name: &str) -> Vec<Emission> {
        self.emissions
            .lock()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Names in emission order
    pub fn names(&self) -> Vec<String> {
        self.emissions.lock().iter().map(|e| e.name.clone()).collect()
    }

    fn push(&self, instrument: &Instrument, value: f64, labels: &LabelSet) {
        self.emissions.lock().push(Emission {
            name: instrument.name.to_string(),
            kind: instrument.kind,
            value,
            labels: labels.clone(),
        });
    }
}

impl MetricsPort for RecordingMetrics {
    #[allow(clippy::cast_precision_loss)]
    fn add(&self, instrument: &Instrument, value: u64, labels: &LabelSet) {
        self.push(instrument, value as f64, labels);
    }

    fn record(&self, instrument: &Instrument, value: f64, labels: &LabelSet) {
        self.push(instrument, value, labels);
    }
}
