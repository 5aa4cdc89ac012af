//! Metrics sink backed by an OpenTelemetry meter

use std::collections::HashMap;
use std::fmt;

use application::ports::MetricsPort;
use domain::{Instrument, LabelSet, LabelValue};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use parking_lot::Mutex;

/// Convert a label set to OpenTelemetry attributes, keeping value types
pub fn to_key_values(labels: &LabelSet) -> Vec<KeyValue> {
    labels
        .iter()
        .map(|label| {
            let key = label.key().to_string();
            match label.value() {
                LabelValue::String(s) => KeyValue::new(key, s.clone()),
                LabelValue::Int(i) => KeyValue::new(key, *i),
                LabelValue::Float(f) => KeyValue::new(key, *f),
            }
        })
        .collect()
}

/// Forwards samples to meter instruments, creating each one on first use
pub struct OtelMetricsSink {
    meter: Meter,
    counters: Mutex<HashMap<String, Counter<u64>>>,
    histograms: Mutex<HashMap<String, Histogram<f64>>>,
}

impl fmt::Debug for OtelMetricsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelMetricsSink")
            .field("counters", &self.counters.lock().len())
            .field("histograms", &self.histograms.lock().len())
            .finish_non_exhaustive()
    }
}

impl OtelMetricsSink {
    /// Create a sink emitting through `meter`
    pub fn new(meter: Meter) -> Self {
        Self {
            meter,
            counters: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct instruments created so far
    pub fn instrument_count(&self) -> usize {
        self.counters.lock().len() + self.histograms.lock().len()
    }

    fn counter(&self, instrument: &Instrument) -> Counter<u64> {
        self.counters
            .lock()
            .entry(instrument.name.to_string())
            .or_insert_with(|| {
                let builder = self
                    .meter
                    .u64_counter(instrument.name.clone())
                    .with_description(instrument.description.clone());
                match instrument.unit {
                    Some(unit) => builder.with_unit(unit).build(),
                    None => builder.build(),
                }
            })
            .clone()
    }

    fn histogram(&self, instrument: &Instrument) -> Histogram<f64> {
        self.histograms
            .lock()
            .entry(instrument.name.to_string())
            .or_insert_with(|| {
                let builder = self
                    .meter
                    .f64_histogram(instrument.name.clone())
                    .with_description(instrument.description.clone());
                match instrument.unit {
                    Some(unit) => builder.with_unit(unit).build(),
                    None => builder.build(),
                }
            })
            .clone()
    }
}

impl MetricsPort for OtelMetricsSink {
    fn add(&self, instrument: &Instrument, value: u64, labels: &LabelSet) {
        self.counter(instrument).add(value, &to_key_values(labels));
    }

    fn record(&self, instrument: &Instrument, value: f64, labels: &LabelSet) {
        self.histogram(instrument).record(value, &to_key_values(labels));
    }
}
