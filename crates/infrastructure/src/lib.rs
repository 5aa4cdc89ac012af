//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer.
//! Contains exporter setup, metric sinks, the trace helper and the
//! file-backed user configuration store.

pub mod adapters;
pub mod config;
pub mod paths;
pub mod persistence;
pub mod telemetry;

pub use adapters::{FileMetricsSink, NoopMetricsSink, OtelMetricsSink};
pub use config::{PROJECT_ID_ENV, TelemetrySettings, TelemetryTarget};
pub use paths::DevtrailPaths;
pub use persistence::{ConfigStoreError, TomlUserConfigStore};
pub use telemetry::{
    InstrumentedSpan, TelemetryError, TelemetryGuard, TraceHelper, init_telemetry,
    install_subscriber,
};
