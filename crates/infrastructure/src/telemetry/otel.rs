//! OpenTelemetry initialization
//!
//! Wires span and metric exporters to the selected target and installs the
//! console logging subscriber. Failing to reach the destination during setup
//! is fatal: there is no retry and no fallback target.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use application::ports::MetricsPort;
use opentelemetry::metrics::MeterProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use tracing::{error, info};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use super::file_exporter::{FileSpanExporter, json_resource};
use super::trace_helper::{TRACER_NAME, TraceHelper};
use crate::adapters::{FileMetricsSink, NoopMetricsSink, OtelMetricsSink};
use crate::config::{PROJECT_ID_ENV, TelemetrySettings, TelemetryTarget};
use crate::paths::DevtrailPaths;

/// Resource attribute carrying the cloud project
pub const CLOUD_ACCOUNT_ID: &str = "cloud.account.id";

/// Resource attribute carrying the anonymous installation id
pub const INSTALLATION_ID: &str = "installation_id";

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),

    /// The local destination could not be created or opened
    #[error("Failed to open telemetry destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create OTLP exporter
    #[error("Failed to create OTLP exporter: {0}")]
    Exporter(String),

    /// Failed to flush or shut down a provider
    #[error("Telemetry provider error: {0}")]
    Provider(String),

    /// The selected target lacks required settings
    #[error("Telemetry configuration error: {0}")]
    Configuration(String),
}

impl TelemetryError {
    fn destination(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Destination {
            path: path.into(),
            source,
        }
    }
}

/// Guard owning the installed providers
///
/// Keep it alive for the whole invocation. [`TelemetryGuard::shutdown`]
/// flushes and stops every exporter; dropping the guard does the same and
/// logs any failure.
pub struct TelemetryGuard {
    target: TelemetryTarget,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    file_metrics: Option<Arc<FileMetricsSink>>,
    metrics: Arc<dyn MetricsPort>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("target", &self.target)
            .field("active", &self.tracer_provider.is_some())
            .finish_non_exhaustive()
    }
}

impl TelemetryGuard {
    /// Guard that exports nothing
    pub fn disabled() -> Self {
        Self {
            target: TelemetryTarget::Off,
            tracer_provider: None,
            meter_provider: None,
            file_metrics: None,
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Target the guard was built for
    pub const fn target(&self) -> TelemetryTarget {
        self.target
    }

    /// Whether spans and metrics leave the process
    pub const fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Sink for run metrics
    pub fn metrics(&self) -> Arc<dyn MetricsPort> {
        Arc::clone(&self.metrics)
    }

    /// Tracer from the installed provider
    ///
    /// When nothing is exported the tracer comes from a provider that
    /// samples nothing.
    pub fn tracer(&self) -> SdkTracer {
        match &self.tracer_provider {
            Some(provider) => provider.tracer(TRACER_NAME),
            None => SdkTracerProvider::builder()
                .with_sampler(Sampler::AlwaysOff)
                .build()
                .tracer(TRACER_NAME),
        }
    }

    /// Trace helper bound to this guard's tracer
    pub fn trace_helper(&self) -> TraceHelper<SdkTracer> {
        TraceHelper::new(self.tracer())
    }

    /// Push pending spans and metrics to the destination
    pub fn flush(&self) -> Result<(), TelemetryError> {
        if let Some(provider) = &self.tracer_provider {
            provider
                .force_flush()
                .map_err(|e| TelemetryError::Provider(format!("span flush failed: {e}")))?;
        }
        if let Some(provider) = &self.meter_provider {
            provider
                .force_flush()
                .map_err(|e| TelemetryError::Provider(format!("metric flush failed: {e}")))?;
        }
        if let Some(sink) = &self.file_metrics {
            sink.flush()
                .map_err(|e| TelemetryError::destination(sink.path(), e))?;
        }
        Ok(())
    }

    /// Flush and stop every exporter
    pub fn shutdown(mut self) -> Result<(), TelemetryError> {
        self.shutdown_providers()
    }

    fn shutdown_providers(&mut self) -> Result<(), TelemetryError> {
        let mut first_error = None;

        if let Some(sink) = self.file_metrics.take() {
            if let Err(e) = sink.flush() {
                first_error.get_or_insert(TelemetryError::destination(sink.path(), e));
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                first_error.get_or_insert(TelemetryError::Provider(format!(
                    "meter provider shutdown failed: {e}"
                )));
            }
        }
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                first_error.get_or_insert(TelemetryError::Provider(format!(
                    "tracer provider shutdown failed: {e}"
                )));
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown_providers() {
            error!("Failed to shutdown telemetry: {e}");
        }
    }
}

fn build_resource(
    settings: &TelemetrySettings,
    installation_id: Uuid,
    project: Option<&str>,
) -> Resource {
    let mut attributes = vec![KeyValue::new(INSTALLATION_ID, installation_id.to_string())];
    if let Some(project) = project {
        attributes.push(KeyValue::new(CLOUD_ACCOUNT_ID, project.to_string()));
    }

    Resource::builder()
        .with_service_name(settings.service_name.clone())
        .with_attributes(attributes)
        .build()
}

fn init_file(
    settings: &TelemetrySettings,
    paths: &DevtrailPaths,
    installation_id: Uuid,
) -> Result<TelemetryGuard, TelemetryError> {
    paths
        .ensure_root()
        .map_err(|e| TelemetryError::destination(&paths.root, e))?;

    let resource = build_resource(settings, installation_id, None);
    let exporter = FileSpanExporter::create(&paths.span_file, &resource)
        .map_err(|e| TelemetryError::destination(&paths.span_file, e))?;
    let file_metrics = Arc::new(
        FileMetricsSink::create(&paths.metric_file, json_resource(&resource))
            .map_err(|e| TelemetryError::destination(&paths.metric_file, e))?,
    );

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build();
    global::set_tracer_provider(tracer_provider.clone());

    info!(
        spans = %paths.span_file.display(),
        metrics = %paths.metric_file.display(),
        "Telemetry initialized with file export"
    );

    Ok(TelemetryGuard {
        target: TelemetryTarget::File,
        tracer_provider: Some(tracer_provider),
        meter_provider: None,
        metrics: Arc::clone(&file_metrics) as Arc<dyn MetricsPort>,
        file_metrics: Some(file_metrics),
    })
}

fn init_cloud(
    settings: &TelemetrySettings,
    installation_id: Uuid,
) -> Result<TelemetryGuard, TelemetryError> {
    let project = settings
        .project_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            TelemetryError::Configuration(format!(
                "cloud export requires a project id ({PROJECT_ID_ENV} is empty)"
            ))
        })?;

    let resource = build_resource(settings, installation_id, Some(project));
    let timeout = Duration::from_secs(settings.export_timeout_secs);

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.otlp_endpoint)
        .with_timeout(timeout)
        .build()
        .map_err(|e| TelemetryError::Exporter(format!("span exporter: {e}")))?;

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.otlp_endpoint)
        .with_timeout(timeout)
        .build()
        .map_err(|e| TelemetryError::Exporter(format!("metric exporter: {e}")))?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource.clone())
        .build();

    let meter_provider = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(metric_exporter).build())
        .with_resource(resource)
        .build();

    global::set_tracer_provider(tracer_provider.clone());
    global::set_meter_provider(meter_provider.clone());

    let metrics = Arc::new(OtelMetricsSink::new(meter_provider.meter(TRACER_NAME)));

    info!(
        endpoint = %settings.otlp_endpoint,
        project = %project,
        service = %settings.service_name,
        "Telemetry initialized with OTLP export"
    );

    Ok(TelemetryGuard {
        target: TelemetryTarget::Cloud,
        tracer_provider: Some(tracer_provider),
        meter_provider: Some(meter_provider),
        file_metrics: None,
        metrics,
    })
}

/// Initialize span and metric export for the configured target
///
/// Returns a guard that must be kept alive for the duration of the run.
/// `File` creates the devtrail directory and truncates the span log and
/// metric summary. `Cloud` requires a non-empty project id and exports
/// over OTLP/gRPC, so it must be called from within a Tokio runtime. `Off`
/// installs nothing.
pub fn init_telemetry(
    settings: &TelemetrySettings,
    paths: &DevtrailPaths,
    installation_id: Uuid,
) -> Result<TelemetryGuard, TelemetryError> {
    match settings.target {
        TelemetryTarget::File => init_file(settings, paths, installation_id),
        TelemetryTarget::Cloud => init_cloud(settings, installation_id),
        TelemetryTarget::Off => {
            info!("Telemetry disabled");
            Ok(TelemetryGuard::disabled())
        },
    }
}

/// Install the global `tracing` subscriber
///
/// Console output goes to stderr, filtered by `RUST_LOG` when set and by
/// `default_filter` otherwise. When the guard exports, `tracing` spans are
/// bridged to its tracer as well.
pub fn install_subscriber(
    guard: &TelemetryGuard,
    default_filter: &str,
) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let otel_layer = guard
        .is_exporting()
        .then(|| OpenTelemetryLayer::new(guard.tracer()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}
