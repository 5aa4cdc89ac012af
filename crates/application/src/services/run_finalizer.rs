//! Run finalizer
//!
//! Turns a completed invocation into metric emissions. The run mode picks
//! which counters are touched:
//!
//! | mode   | builders | deployer | syncs |
//! |--------|----------|----------|-------|
//! | run    | yes      | yes      | no    |
//! | build  | yes      | no       | no    |
//! | dev    | yes      | yes      | yes   |
//! | render | no       | no       | no    |
//! | deploy | no       | yes      | no    |
//! | debug  | yes      | yes      | no    |
//!
//! Every mode then increments `runs` and records its duration.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use domain::{
    Artifact, ArtifactKind, Deployer, Label, LabelSet, PipelineConfig, RunMode, instruments, keys,
};
use tracing::debug;

use crate::error::ApplicationError;
use crate::ports::MetricsPort;

/// Line written before metrics are emitted
pub const WRITING_METRICS: &str = "Writing metrics...";

/// Version and platform of the running binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// CLI version
    pub version: String,
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
}

impl BuildInfo {
    /// Build info for the current platform
    pub fn current(version: impl Into<String>) -> Self {
        Self::with_platform(version, std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build info for an explicit platform
    pub fn with_platform(
        version: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }
}

/// What happened during a completed invocation
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    /// Mode the CLI ran in
    pub mode: RunMode,
    /// Wall-clock time since the invocation started
    pub elapsed: Duration,
    /// Dev-loop iterations (only reported in dev mode)
    pub dev_iterations: u32,
    /// Pipeline the invocation worked on
    pub pipeline: &'a PipelineConfig,
}

impl<'a> RunReport<'a> {
    /// Create a report without dev-loop iterations
    #[must_use]
    pub const fn new(mode: RunMode, pipeline: &'a PipelineConfig, elapsed: Duration) -> Self {
        Self {
            mode,
            elapsed,
            dev_iterations: 0,
            pipeline,
        }
    }

    /// Set the number of dev-loop iterations
    #[must_use]
    pub const fn with_dev_iterations(mut self, iterations: u32) -> Self {
        self.dev_iterations = iterations;
        self
    }
}

/// Count artifacts per builder, in stable builder order
#[must_use]
pub fn tally_builders(artifacts: &[Artifact]) -> BTreeMap<ArtifactKind, u64> {
    let mut counts = BTreeMap::new();
    for artifact in artifacts {
        *counts.entry(artifact.kind()).or_insert(0) += 1;
    }
    counts
}

/// Records invocation statistics once a run has completed
pub struct RunFinalizer {
    metrics: Arc<dyn MetricsPort>,
    build_info: BuildInfo,
}

impl fmt::Debug for RunFinalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunFinalizer")
            .field("build_info", &self.build_info)
            .finish_non_exhaustive()
    }
}

impl RunFinalizer {
    /// Create a finalizer emitting to the given sink
    pub fn new(metrics: Arc<dyn MetricsPort>, build_info: BuildInfo) -> Self {
        Self {
            metrics,
            build_info,
        }
    }

    /// Record the metrics of a completed run
    ///
    /// Returns the label set attached to the `runs` and duration
    /// instruments.
    pub fn finalize(
        &self,
        out: &mut dyn Write,
        report: &RunReport<'_>,
    ) -> Result<LabelSet, ApplicationError> {
        writeln!(out, "{WRITING_METRICS}")?;

        let seconds = report.elapsed.as_secs_f64();
        let mut labels = self.base_labels(report.mode, seconds);

        if report.mode.counts_builders() {
            self.count_builders(report.pipeline.artifacts(), &labels);
        }

        if report.mode.counts_deployer() {
            let deployer_labels = self.count_deployer(report.pipeline.deploy.as_ref());
            labels.extend(deployer_labels);
        }

        if report.mode.records_syncs() {
            self.metrics.record(
                &instruments::SYNC_SESSION_COUNT,
                f64::from(report.dev_iterations),
                &labels,
            );
        }

        self.metrics.add(&instruments::RUNS, 1, &labels);
        self.metrics.record(
            &instruments::command_duration(report.mode),
            seconds,
            &labels,
        );

        debug!(
            mode = %report.mode,
            duration_secs = seconds,
            labels = %labels,
            "Recorded run metrics"
        );

        Ok(labels)
    }

    /// Labels shared by every instrument of a run
    #[must_use]
    pub fn base_labels(&self, mode: RunMode, duration_secs: f64) -> LabelSet {
        [
            Label::string(keys::VERSION, self.build_info.version.clone()),
            Label::string(keys::OS, self.build_info.os.clone()),
            Label::string(keys::ARCH, self.build_info.arch.clone()),
            Label::string(keys::COMMAND, mode.as_str()),
            Label::float(keys::DURATION, duration_secs),
        ]
        .into_iter()
        .collect()
    }

    /// Emit one `artifact/types` increment per distinct builder
    pub fn count_builders(
        &self,
        artifacts: &[Artifact],
        labels: &LabelSet,
    ) -> BTreeMap<ArtifactKind, u64> {
        let counts = tally_builders(artifacts);
        for (kind, count) in &counts {
            let series = labels.with(Label::string(keys::BUILDER, kind.label()));
            self.metrics
                .add(&instruments::ARTIFACT_TYPES, *count, &series);
        }
        counts
    }

    /// Emit a `deployers` increment and return its labels
    ///
    /// Pipelines without a deploy section emit nothing.
    pub fn count_deployer(&self, deployer: Option<&Deployer>) -> LabelSet {
        let Some(deployer) = deployer else {
            return LabelSet::new();
        };

        let labels: LabelSet = [Label::string(keys::DEPLOYER, deployer.kind().label())]
            .into_iter()
            .collect();
        self.metrics.add(&instruments::DEPLOYERS, 1, &labels);
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockMetricsPort;
    use crate::testing::RecordingMetrics;
    use domain::{
        ArtifactBuilder, BazelArtifact, DockerArtifact, InstrumentKind, JibArtifact, KptDeploy,
        KubectlDeploy, LabelValue,
    };

    fn docker(image: &str) -> Artifact {
        Artifact::new(
            image,
            ArtifactBuilder::Docker(DockerArtifact {
                dockerfile: "Dockerfile".to_string(),
                build_args: BTreeMap::new(),
            }),
        )
    }

    fn jib(image: &str) -> Artifact {
        Artifact::new(image, ArtifactBuilder::Jib(JibArtifact { project: None }))
    }

    fn bazel(image: &str) -> Artifact {
        Artifact::new(
            image,
            ArtifactBuilder::Bazel(BazelArtifact {
                target: "//app:image.tar".to_string(),
            }),
        )
    }

    fn pipeline() -> PipelineConfig {
        let mut pipeline = PipelineConfig::default();
        pipeline.build.artifacts = vec![docker("web"), jib("api"), docker("worker")];
        pipeline.deploy = Some(Deployer::Kubectl(KubectlDeploy {
            manifests: vec!["k8s/*.yaml".to_string()],
        }));
        pipeline
    }

    fn finalizer(metrics: Arc<RecordingMetrics>) -> RunFinalizer {
        RunFinalizer::new(metrics, BuildInfo::with_platform("1.2.3", "linux", "x86_64"))
    }

    fn run(mode: RunMode, pipeline: &PipelineConfig) -> (Arc<RecordingMetrics>, LabelSet) {
        let metrics = Arc::new(RecordingMetrics::new());
        let mut out = Vec::new();
        let report = RunReport::new(mode, pipeline, Duration::from_millis(2500))
            .with_dev_iterations(4);
        let labels = finalizer(Arc::clone(&metrics))
            .finalize(&mut out, &report)
            .unwrap();
        (metrics, labels)
    }

    fn string(value: &str) -> LabelValue {
        LabelValue::String(value.to_string())
    }

    #[test]
    fn writes_notice_before_emitting() {
        let metrics = Arc::new(RecordingMetrics::new());
        let mut out = Vec::new();
        let pipeline = pipeline();
        let report = RunReport::new(RunMode::Build, &pipeline, Duration::from_secs(1));

        finalizer(metrics).finalize(&mut out, &report).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Writing metrics...\n");
    }

    #[test]
    fn base_labels_describe_invocation() {
        let metrics = Arc::new(RecordingMetrics::new());
        let labels = finalizer(metrics).base_labels(RunMode::Dev, 2.5);

        assert_eq!(labels.len(), 5);
        assert_eq!(labels.get(keys::VERSION), Some(&string("1.2.3")));
        assert_eq!(labels.get(keys::OS), Some(&string("linux")));
        assert_eq!(labels.get(keys::ARCH), Some(&string("x86_64")));
        assert_eq!(labels.get(keys::COMMAND), Some(&string("dev")));
        assert_eq!(labels.get(keys::DURATION), Some(&LabelValue::Float(2.5)));
    }

    #[test]
    fn render_emits_only_runs_and_duration() {
        let (metrics, labels) = run(RunMode::Render, &pipeline());

        assert_eq!(metrics.names(), vec!["runs", "render"]);
        assert!(labels.get(keys::DEPLOYER).is_none());
        assert!(metrics.named("artifact/types").is_empty());
        assert!(metrics.named("deployers").is_empty());
        assert!(metrics.named("sync/session/count").is_empty());
    }

    #[test]
    fn build_counts_each_distinct_builder_once() {
        let (metrics, labels) = run(RunMode::Build, &pipeline());

        let builders = metrics.named("artifact/types");
        assert_eq!(builders.len(), 2);

        assert_eq!(builders[0].labels.get(keys::BUILDER), Some(&string("docker")));
        assert!((builders[0].value - 2.0).abs() < f64::EPSILON);
        assert_eq!(builders[1].labels.get(keys::BUILDER), Some(&string("jib")));
        assert!((builders[1].value - 1.0).abs() < f64::EPSILON);

        // builder series carry the base labels too
        assert_eq!(builders[0].labels.len(), 6);
        assert_eq!(builders[0].labels.get(keys::COMMAND), Some(&string("build")));

        assert!(metrics.named("deployers").is_empty());
        assert!(labels.get(keys::DEPLOYER).is_none());
    }

    #[test]
    fn deploy_emits_single_deployer_label() {
        let (metrics, labels) = run(RunMode::Deploy, &pipeline());

        let deployers = metrics.named("deployers");
        assert_eq!(deployers.len(), 1);
        assert_eq!(deployers[0].labels.len(), 1);
        assert_eq!(
            deployers[0].labels.get(keys::DEPLOYER),
            Some(&string("kubectl"))
        );
        assert!((deployers[0].value - 1.0).abs() < f64::EPSILON);

        assert!(metrics.named("artifact/types").is_empty());
        assert_eq!(labels.get(keys::DEPLOYER), Some(&string("kubectl")));

        let runs = metrics.named("runs");
        assert_eq!(runs[0].labels, labels);
    }

    #[test]
    fn deploy_without_deploy_section_emits_no_deployer() {
        let mut pipeline = pipeline();
        pipeline.deploy = None;

        let (metrics, labels) = run(RunMode::Deploy, &pipeline);

        assert!(metrics.named("deployers").is_empty());
        assert_eq!(labels.len(), 5);
        assert_eq!(metrics.names(), vec!["runs", "deploy"]);
    }

    #[test]
    fn dev_counts_builders_deployer_and_syncs() {
        let (metrics, labels) = run(RunMode::Dev, &pipeline());

        assert_eq!(
            metrics.names(),
            vec![
                "artifact/types",
                "artifact/types",
                "deployers",
                "sync/session/count",
                "runs",
                "dev"
            ]
        );

        let syncs = metrics.named("sync/session/count");
        assert_eq!(syncs[0].kind, InstrumentKind::Recorder);
        assert!((syncs[0].value - 4.0).abs() < f64::EPSILON);
        assert_eq!(labels.get(keys::DEPLOYER), Some(&string("kubectl")));
    }

    #[test]
    fn debug_and_run_skip_syncs() {
        for mode in [RunMode::Debug, RunMode::Run] {
            let (metrics, labels) = run(mode, &pipeline());

            assert_eq!(metrics.named("artifact/types").len(), 2);
            assert_eq!(metrics.named("deployers").len(), 1);
            assert!(metrics.named("sync/session/count").is_empty());
            assert_eq!(labels.len(), 6);
        }
    }

    #[test]
    fn duration_is_recorded_in_seconds() {
        let (metrics, _) = run(RunMode::Build, &pipeline());

        let durations = metrics.named("build");
        assert_eq!(durations.len(), 1);
        assert_eq!(durations[0].kind, InstrumentKind::Recorder);
        assert!((durations[0].value - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tally_groups_by_builder() {
        let artifacts = vec![bazel("a"), docker("b"), bazel("c"), jib("d"), bazel("e")];
        let counts = tally_builders(&artifacts);

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&ArtifactKind::Bazel], 3);
        assert_eq!(counts[&ArtifactKind::Docker], 1);
        assert_eq!(counts[&ArtifactKind::Jib], 1);
    }

    #[test]
    fn tally_of_no_artifacts_is_empty() {
        assert!(tally_builders(&[]).is_empty());
    }

    #[test]
    fn count_deployer_uses_configured_variant() {
        let metrics = Arc::new(RecordingMetrics::new());
        let deployer = Deployer::Kpt(KptDeploy {
            dir: "pkg".to_string(),
        });

        let labels = finalizer(Arc::clone(&metrics)).count_deployer(Some(&deployer));

        assert_eq!(labels.to_string(), "deployer=kpt");
        assert_eq!(metrics.named("deployers").len(), 1);
    }

    #[test]
    fn render_with_mock_sink_touches_two_instruments() {
        let mut mock = MockMetricsPort::new();
        mock.expect_add()
            .withf(|instrument, value, _| instrument.name == "runs" && *value == 1)
            .times(1)
            .return_const(());
        mock.expect_record()
            .withf(|instrument, _, labels| {
                instrument.name == "render" && labels.get(keys::COMMAND).is_some()
            })
            .times(1)
            .return_const(());

        let pipeline = pipeline();
        let finalizer = RunFinalizer::new(Arc::new(mock), BuildInfo::current("0.0.0"));
        let mut out = Vec::new();
        finalizer
            .finalize(
                &mut out,
                &RunReport::new(RunMode::Render, &pipeline, Duration::ZERO),
            )
            .unwrap();
    }

    #[test]
    fn current_build_info_uses_host_platform() {
        let info = BuildInfo::current("9.9.9");
        assert_eq!(info.os, std::env::consts::OS);
        assert_eq!(info.arch, std::env::consts::ARCH);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn artifact_strategy() -> impl Strategy<Value = Artifact> {
            prop_oneof![
                Just(docker("d")),
                Just(jib("j")),
                Just(bazel("b")),
            ]
        }

        proptest! {
            #[test]
            fn builder_counts_cover_every_artifact(
                artifacts in prop::collection::vec(artifact_strategy(), 0..24)
            ) {
                let counts = tally_builders(&artifacts);
                prop_assert_eq!(counts.values().sum::<u64>(), artifacts.len() as u64);
                prop_assert!(counts.values().all(|count| *count > 0));
            }

            #[test]
            fn one_builder_emission_per_distinct_kind(
                artifacts in prop::collection::vec(artifact_strategy(), 0..24)
            ) {
                let mut pipeline = PipelineConfig::default();
                pipeline.build.artifacts = artifacts;
                let (metrics, _) = run(RunMode::Build, &pipeline);

                let distinct = tally_builders(pipeline.artifacts()).len();
                prop_assert_eq!(metrics.named("artifact/types").len(), distinct);
            }
        }
    }
}
