//! Span and metric export
//!
//! Exporter initialization for the file and cloud targets, the local span
//! log writer and the span attribute helper.

mod file_exporter;
mod otel;
mod trace_helper;

pub use file_exporter::{EventRecord, FileSpanExporter, SpanRecord, read_span_log};
pub use otel::{
    CLOUD_ACCOUNT_ID, INSTALLATION_ID, TelemetryError, TelemetryGuard, init_telemetry,
    install_subscriber,
};
pub use trace_helper::{InstrumentedSpan, TRACER_NAME, TraceHelper};
