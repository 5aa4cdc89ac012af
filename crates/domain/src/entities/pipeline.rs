//! Pipeline configuration
//!
//! The pipeline file names one builder table per artifact and at most one
//! deployer table. Both are validated while parsing: a record with zero or
//! several variant tables is rejected instead of silently picking one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ArtifactKind, DeployerKind};

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

/// Build with a local Docker daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerArtifact {
    /// Dockerfile path relative to the artifact context
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,

    /// Build arguments
    #[serde(default)]
    pub build_args: BTreeMap<String, String>,
}

/// Build a Bazel target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BazelArtifact {
    /// Target producing the image tarball
    pub target: String,
}

/// Build with a user-supplied script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomArtifact {
    /// Command invoked to build the image
    #[serde(default)]
    pub build_command: Option<String>,
}

/// Build with Cloud Native Buildpacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackArtifact {
    /// Builder image
    pub builder: String,
}

/// Build a Java project with Jib
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JibArtifact {
    /// Module to build in multi-module projects
    #[serde(default)]
    pub project: Option<String>,
}

/// Build in-cluster with Kaniko
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanikoArtifact {
    /// Dockerfile path relative to the artifact context
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
}

/// The single builder of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBuilder {
    Docker(DockerArtifact),
    Bazel(BazelArtifact),
    Custom(CustomArtifact),
    Buildpacks(BuildpackArtifact),
    Jib(JibArtifact),
    Kaniko(KanikoArtifact),
}

impl ArtifactBuilder {
    /// Classification used for labelling
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        match self {
            Self::Docker(_) => ArtifactKind::Docker,
            Self::Bazel(_) => ArtifactKind::Bazel,
            Self::Custom(_) => ArtifactKind::Custom,
            Self::Buildpacks(_) => ArtifactKind::Buildpacks,
            Self::Jib(_) => ArtifactKind::Jib,
            Self::Kaniko(_) => ArtifactKind::Kaniko,
        }
    }
}

/// Artifact as written in the pipeline file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtifact {
    image: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    docker: Option<DockerArtifact>,
    #[serde(default)]
    bazel: Option<BazelArtifact>,
    #[serde(default)]
    custom: Option<CustomArtifact>,
    #[serde(default)]
    buildpacks: Option<BuildpackArtifact>,
    #[serde(default)]
    jib: Option<JibArtifact>,
    #[serde(default)]
    kaniko: Option<KanikoArtifact>,
}

/// An image produced by the build phase
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawArtifact")]
pub struct Artifact {
    /// Image name
    pub image: String,
    /// Build context directory
    pub context: String,
    /// How the image is built
    pub builder: ArtifactBuilder,
}

impl Artifact {
    /// Create an artifact built from the current directory
    pub fn new(image: impl Into<String>, builder: ArtifactBuilder) -> Self {
        Self {
            image: image.into(),
            context: ".".to_string(),
            builder,
        }
    }

    /// Builder classification
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.builder.kind()
    }
}

impl TryFrom<RawArtifact> for Artifact {
    type Error = DomainError;

    fn try_from(raw: RawArtifact) -> Result<Self, Self::Error> {
        let owner = format!("artifact '{}'", raw.image);
        let builder = exactly_one(
            owner,
            "builder",
            &ArtifactKind::labels(),
            [
                raw.docker.map(ArtifactBuilder::Docker),
                raw.bazel.map(ArtifactBuilder::Bazel),
                raw.custom.map(ArtifactBuilder::Custom),
                raw.buildpacks.map(ArtifactBuilder::Buildpacks),
                raw.jib.map(ArtifactBuilder::Jib),
                raw.kaniko.map(ArtifactBuilder::Kaniko),
            ],
            |builder| builder.kind().label(),
        )?;

        Ok(Self {
            image: raw.image,
            context: raw.context.unwrap_or_else(|| ".".to_string()),
            builder,
        })
    }
}

/// Deploy with Helm charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmDeploy {
    /// Release names
    #[serde(default)]
    pub releases: Vec<String>,
}

/// Deploy with kpt packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KptDeploy {
    /// Package directory
    pub dir: String,
}

/// Deploy raw manifests with kubectl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubectlDeploy {
    /// Manifest globs
    #[serde(default)]
    pub manifests: Vec<String>,
}

/// Deploy kustomizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KustomizeDeploy {
    /// Kustomization directories
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeploy {
    #[serde(default)]
    helm: Option<HelmDeploy>,
    #[serde(default)]
    kpt: Option<KptDeploy>,
    #[serde(default)]
    kubectl: Option<KubectlDeploy>,
    #[serde(default)]
    kustomize: Option<KustomizeDeploy>,
}

/// The single deployer of a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawDeploy")]
pub enum Deployer {
    Helm(HelmDeploy),
    Kpt(KptDeploy),
    Kubectl(KubectlDeploy),
    Kustomize(KustomizeDeploy),
}

impl Deployer {
    /// Classification used for labelling
    #[must_use]
    pub const fn kind(&self) -> DeployerKind {
        match self {
            Self::Helm(_) => DeployerKind::Helm,
            Self::Kpt(_) => DeployerKind::Kpt,
            Self::Kubectl(_) => DeployerKind::Kubectl,
            Self::Kustomize(_) => DeployerKind::Kustomize,
        }
    }
}

impl TryFrom<RawDeploy> for Deployer {
    type Error = DomainError;

    fn try_from(raw: RawDeploy) -> Result<Self, Self::Error> {
        exactly_one(
            "deploy".to_string(),
            "deployer",
            &DeployerKind::labels(),
            [
                raw.helm.map(Deployer::Helm),
                raw.kpt.map(Deployer::Kpt),
                raw.kubectl.map(Deployer::Kubectl),
                raw.kustomize.map(Deployer::Kustomize),
            ],
            |deployer| deployer.kind().label(),
        )
    }
}

/// Pick the only populated variant or explain what is wrong
fn exactly_one<T, const N: usize>(
    owner: String,
    kind: &'static str,
    expected: &[&str],
    candidates: [Option<T>; N],
    label: impl Fn(&T) -> &'static str,
) -> Result<T, DomainError> {
    let mut present: Vec<T> = candidates.into_iter().flatten().collect();
    if present.len() > 1 {
        let found: Vec<&str> = present.iter().map(label).collect();
        return Err(DomainError::ambiguous_variant(owner, kind, &found));
    }
    present
        .pop()
        .ok_or_else(|| DomainError::missing_variant(owner, kind, expected))
}

/// Build section of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Images to build
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// A parsed and validated pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Build section
    #[serde(default)]
    pub build: BuildConfig,

    /// Deploy section; pipelines that only build may omit it
    #[serde(default)]
    pub deploy: Option<Deployer>,
}

impl PipelineConfig {
    /// Parse a pipeline from TOML
    pub fn from_toml(source: &str) -> Result<Self, DomainError> {
        toml::from_str(source).map_err(|e| DomainError::InvalidPipeline(e.message().to_string()))
    }

    /// Artifacts in declaration order
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.build.artifacts
    }

    /// Deployer classification, if a deploy section is present
    #[must_use]
    pub fn deployer_kind(&self) -> Option<DeployerKind> {
        self.deploy.as_ref().map(Deployer::kind)
    }
}
