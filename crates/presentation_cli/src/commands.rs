//! Subcommand handlers

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use application::ports::UserConfigPort;
use application::services::{BuildInfo, MetricsPromptService, RunFinalizer, RunReport};
use domain::{PipelineConfig, RunMode};
use infrastructure::{
    DevtrailPaths, TelemetryGuard, TelemetrySettings, TelemetryTarget, TomlUserConfigStore,
    init_telemetry, install_subscriber,
};
use tracing::{debug, info};

use crate::plan;

/// A pipeline invocation requested on the command line
#[derive(Debug, Clone)]
pub struct PipelineRun<'a> {
    pub mode: RunMode,
    pub pipeline_file: &'a Path,
    pub iterations: u32,
    pub telemetry: Option<TelemetryTarget>,
}

/// Resolve the telemetry settings for this invocation
///
/// The command-line target overrides settings, and an explicit opt-out
/// overrides both.
pub fn resolve_settings(
    paths: &DevtrailPaths,
    cli_target: Option<TelemetryTarget>,
    metrics_enabled: bool,
) -> Result<TelemetrySettings> {
    let mut settings = TelemetrySettings::load(&paths.settings_file)
        .with_context(|| format!("Failed to load {}", paths.settings_file.display()))?;

    if let Some(target) = cli_target {
        settings.target = target;
    }
    if !metrics_enabled {
        settings.target = TelemetryTarget::Off;
    }

    settings.validate()?;
    Ok(settings)
}

/// Load and validate the pipeline file
pub fn load_pipeline(path: &Path) -> Result<PipelineConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file {}", path.display()))?;
    PipelineConfig::from_toml(&source)
        .with_context(|| format!("Invalid pipeline file {}", path.display()))
}

/// Run a pipeline mode and report its metrics
///
/// The reported duration covers the whole invocation, setup included.
pub fn run_pipeline(
    run: &PipelineRun<'_>,
    paths: &DevtrailPaths,
    default_filter: &str,
) -> Result<()> {
    let started = Instant::now();
    let store = Arc::new(TomlUserConfigStore::new(&paths.user_config_file));
    let mut preferences = store.load()?;
    let (installation_id, generated) = preferences.ensure_installation_id();
    if generated && preferences.metrics_enabled() {
        store.save(&preferences)?;
    }

    let settings = resolve_settings(paths, run.telemetry, preferences.metrics_enabled())?;
    let guard = init_telemetry(&settings, paths, installation_id)?;
    install_subscriber(&guard, settings.log_filter.as_deref().unwrap_or(default_filter))?;
    debug!(target_kind = %guard.target(), "Telemetry ready");

    let mut stdout = io::stdout();
    if guard.is_exporting() {
        let is_terminal = stdout.is_terminal();
        MetricsPromptService::new(store).display(&mut stdout, is_terminal)?;
    }

    let pipeline = load_pipeline(run.pipeline_file)?;
    execute(run, &pipeline, &guard, &mut stdout)?;
    report(run, &pipeline, &guard, started, &mut stdout)?;

    guard.shutdown()?;
    Ok(())
}

fn execute(
    run: &PipelineRun<'_>,
    pipeline: &PipelineConfig,
    guard: &TelemetryGuard,
    out: &mut dyn Write,
) -> Result<()> {
    let helper = guard.trace_helper();
    let mut span = helper.start_span(format!("devtrail/{}", run.mode));
    let artifacts = i64::try_from(pipeline.artifacts().len()).unwrap_or(i64::MAX);
    span.set_attribute("command", run.mode.as_str());
    span.set_attribute("artifacts", artifacts);
    if let Some(kind) = pipeline.deployer_kind() {
        span.set_attribute("deployer", kind.label());
    }
    if run.mode == RunMode::Dev {
        span.set_attribute("iterations", i64::from(run.iterations));
    }

    for step in plan::describe(run.mode, pipeline, run.iterations) {
        writeln!(out, "{step}")?;
    }
    if run.mode == RunMode::Dev {
        for iteration in 1..=run.iterations {
            span.add_event("sync");
            info!(iteration, "Dev loop iteration");
        }
    }

    span.finalize();
    Ok(())
}

/// Emit the run metrics, timing the invocation from `started`
fn report(
    run: &PipelineRun<'_>,
    pipeline: &PipelineConfig,
    guard: &TelemetryGuard,
    started: Instant,
    out: &mut dyn Write,
) -> Result<()> {
    let build_info = BuildInfo::current(env!("CARGO_PKG_VERSION"));
    let finalizer = RunFinalizer::new(guard.metrics(), build_info);
    let report = RunReport::new(run.mode, pipeline, started.elapsed())
        .with_dev_iterations(run.iterations);
    finalizer.finalize(out, &report)?;
    Ok(())
}

/// `devtrail metrics ...` actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsAction {
    Enable,
    Disable,
    Status,
}

/// Change or show the metrics collection preference
pub fn metrics_command(
    action: MetricsAction,
    paths: &DevtrailPaths,
    out: &mut dyn Write,
) -> Result<()> {
    let service = MetricsPromptService::new(Arc::new(TomlUserConfigStore::new(
        &paths.user_config_file,
    )));

    let preferences = match action {
        MetricsAction::Enable => service.set_collection(true)?,
        MetricsAction::Disable => service.set_collection(false)?,
        MetricsAction::Status => service.status()?,
    };

    let state = if preferences.metrics_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    writeln!(out, "Metrics collection is {state}")?;
    if let Some(at) = preferences.metrics_prompted_at {
        writeln!(out, "Notice shown on {}", at.format("%Y-%m-%d"))?;
    }
    Ok(())
}
