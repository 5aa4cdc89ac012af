//! Deployer classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deploy system used to roll out a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployerKind {
    Helm,
    Kpt,
    Kubectl,
    Kustomize,
}

impl DeployerKind {
    /// Every deployer, in declaration order
    pub const ALL: [Self; 4] = [Self::Helm, Self::Kpt, Self::Kubectl, Self::Kustomize];

    /// Label value and configuration table name
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Helm => "helm",
            Self::Kpt => "kpt",
            Self::Kubectl => "kubectl",
            Self::Kustomize => "kustomize",
        }
    }

    /// Labels of every deployer
    #[must_use]
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::label).collect()
    }
}

impl fmt::Display for DeployerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
