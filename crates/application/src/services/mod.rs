//! Application services - Use case implementations

mod metrics_prompt;
mod run_finalizer;

pub use metrics_prompt::{METRICS_PROMPT, MetricsPromptService};
pub use run_finalizer::{BuildInfo, RunFinalizer, RunReport, WRITING_METRICS, tally_builders};
