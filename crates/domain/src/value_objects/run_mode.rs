//! Run mode value object
//!
//! The top-level action declared for the current invocation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Top-level action of a CLI invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Build and deploy once
    Run,
    /// Build artifacts only
    Build,
    /// Continuous build/deploy/sync loop
    Dev,
    /// Render manifests without deploying
    Render,
    /// Deploy previously built artifacts
    Deploy,
    /// Dev loop with debugging enabled
    Debug,
}

impl RunMode {
    /// Every run mode, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Run,
        Self::Build,
        Self::Dev,
        Self::Render,
        Self::Deploy,
        Self::Debug,
    ];

    /// Lowercase command name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Build => "build",
            Self::Dev => "dev",
            Self::Render => "render",
            Self::Deploy => "deploy",
            Self::Debug => "debug",
        }
    }

    /// Whether finishing this mode counts artifact builders
    #[must_use]
    pub const fn counts_builders(&self) -> bool {
        matches!(self, Self::Run | Self::Build | Self::Dev | Self::Debug)
    }

    /// Whether finishing this mode counts the deployer
    #[must_use]
    pub const fn counts_deployer(&self) -> bool {
        matches!(self, Self::Run | Self::Dev | Self::Deploy | Self::Debug)
    }

    /// Whether finishing this mode records the dev-loop sync count
    #[must_use]
    pub const fn records_syncs(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownRunMode(s.to_string()))
    }
}
