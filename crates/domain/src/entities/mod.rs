//! Domain entities - Objects with identity and lifecycle

mod instrument;
mod pipeline;
mod user_preferences;

pub use instrument::{Instrument, InstrumentKind, instruments};
pub use pipeline::{
    Artifact, ArtifactBuilder, BazelArtifact, BuildConfig, BuildpackArtifact, CustomArtifact,
    Deployer, DockerArtifact, HelmDeploy, JibArtifact, KanikoArtifact, KptDeploy, KubectlDeploy,
    KustomizeDeploy, PipelineConfig,
};
pub use user_preferences::UserPreferences;
