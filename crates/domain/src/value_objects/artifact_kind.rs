//! Artifact builder classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build system used to produce an artifact
///
/// Ordering follows declaration order and is used to emit per-builder
/// counts in a stable sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Docker,
    Bazel,
    Custom,
    Buildpacks,
    Jib,
    Kaniko,
}

impl ArtifactKind {
    /// Every builder, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Docker,
        Self::Bazel,
        Self::Custom,
        Self::Buildpacks,
        Self::Jib,
        Self::Kaniko,
    ];

    /// Label value and configuration table name
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Bazel => "bazel",
            Self::Custom => "custom",
            Self::Buildpacks => "buildpacks",
            Self::Jib => "jib",
            Self::Kaniko => "kaniko",
        }
    }

    /// Labels of every builder
    #[must_use]
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::label).collect()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
