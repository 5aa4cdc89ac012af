//! Metrics sink used when collection is disabled

use application::ports::MetricsPort;
use domain::{Instrument, LabelSet};
use tracing::trace;

/// Discards every sample
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsPort for NoopMetricsSink {
    fn add(&self, instrument: &Instrument, value: u64, _labels: &LabelSet) {
        trace!(instrument = %instrument.name, value, "Metrics disabled, dropping increment");
    }

    fn record(&self, instrument: &Instrument, value: f64, _labels: &LabelSet) {
        trace!(instrument = %instrument.name, value, "Metrics disabled, dropping sample");
    }
}
