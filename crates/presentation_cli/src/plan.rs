//! Human-readable description of what a run mode does with a pipeline

use domain::{PipelineConfig, RunMode};

/// Steps a mode performs on `pipeline`, one line each
pub fn describe(mode: RunMode, pipeline: &PipelineConfig, iterations: u32) -> Vec<String> {
    let mut steps = Vec::new();
    let deployer = pipeline.deployer_kind();

    if mode.counts_builders() {
        if pipeline.artifacts().is_empty() {
            steps.push("No artifacts to build".to_string());
        }
        for artifact in pipeline.artifacts() {
            steps.push(format!(
                "Building {} with {} (context: {})",
                artifact.image,
                artifact.kind(),
                artifact.context
            ));
        }
    }

    if mode == RunMode::Render {
        steps.push(match deployer {
            Some(kind) => format!("Rendering manifests with {kind}"),
            None => "No deploy section, nothing to render".to_string(),
        });
    }

    if mode.counts_deployer() {
        steps.push(match deployer {
            Some(kind) => format!("Deploying with {kind}"),
            None => "No deploy section, skipping deploy".to_string(),
        });
    }

    match mode {
        RunMode::Dev => steps.push(format!("Watching for changes ({iterations} iteration(s))")),
        RunMode::Debug => steps.push("Attaching debuggers".to_string()),
        _ => {},
    }

    steps
}
