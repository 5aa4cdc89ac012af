//! devtrail CLI
//!
//! Runs a pipeline mode against `devtrail.toml` and reports invocation
//! telemetry, or manages the metrics collection preference.

mod commands;
mod plan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use domain::RunMode;
use infrastructure::{DevtrailPaths, TelemetryTarget};

use crate::commands::{MetricsAction, PipelineRun};

/// Default pipeline file name
const DEFAULT_PIPELINE_FILE: &str = "devtrail.toml";

/// devtrail CLI
#[derive(Parser, Debug)]
#[command(name = "devtrail")]
#[command(author, version, about = "Build and deploy pipelines with invocation telemetry", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Telemetry target (file, cloud or off); overrides settings.toml
    #[arg(long, global = true)]
    telemetry: Option<TelemetryTarget>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// Pipeline file
    #[arg(short = 'f', long = "filename", default_value = DEFAULT_PIPELINE_FILE)]
    filename: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every artifact
    Build(PipelineArgs),

    /// Deploy with the configured deployer
    Deploy(PipelineArgs),

    /// Build and deploy, then rebuild on changes
    Dev {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Number of dev loop iterations to run
        #[arg(long, default_value_t = 1)]
        iterations: u32,
    },

    /// Build and deploy once
    Run(PipelineArgs),

    /// Render deployment manifests
    Render(PipelineArgs),

    /// Build and deploy with debugging enabled
    Debug(PipelineArgs),

    /// Manage anonymous usage metrics
    Metrics {
        #[command(subcommand)]
        action: MetricsCommand,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum MetricsCommand {
    /// Allow usage metrics collection
    Enable,
    /// Opt out of usage metrics collection
    Disable,
    /// Show the current preference
    Status,
}

impl From<MetricsCommand> for MetricsAction {
    fn from(command: MetricsCommand) -> Self {
        match command {
            MetricsCommand::Enable => Self::Enable,
            MetricsCommand::Disable => Self::Disable,
            MetricsCommand::Status => Self::Status,
        }
    }
}

impl Commands {
    /// Run mode, pipeline arguments and dev iterations of a pipeline command
    fn pipeline_mode(&self) -> Option<(RunMode, &PipelineArgs, u32)> {
        match self {
            Self::Build(args) => Some((RunMode::Build, args, 0)),
            Self::Deploy(args) => Some((RunMode::Deploy, args, 0)),
            Self::Dev {
                pipeline,
                iterations,
            } => Some((RunMode::Dev, pipeline, *iterations)),
            Self::Run(args) => Some((RunMode::Run, args, 0)),
            Self::Render(args) => Some((RunMode::Render, args, 0)),
            Self::Debug(args) => Some((RunMode::Debug, args, 0)),
            Self::Metrics { .. } => None,
        }
    }
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = log_filter_from_verbosity(cli.verbose);
    let paths = DevtrailPaths::from_home()?;

    if let Some((mode, args, iterations)) = cli.command.pipeline_mode() {
        let run = PipelineRun {
            mode,
            pipeline_file: &args.filename,
            iterations,
            telemetry: cli.telemetry,
        };
        return commands::run_pipeline(&run, &paths, filter);
    }

    if let Commands::Metrics { action } = cli.command {
        commands::metrics_command(action.into(), &paths, &mut std::io::stdout())?;
    }
    Ok(())
}
