//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod file_metrics_sink;
mod noop_metrics_sink;
mod otel_metrics_sink;

pub use file_metrics_sink::{
    CounterSummary, FileMetricsSink, MetricsSummary, RecorderSummary, median,
};
pub use noop_metrics_sink::NoopMetricsSink;
pub use otel_metrics_sink::{OtelMetricsSink, to_key_values};
