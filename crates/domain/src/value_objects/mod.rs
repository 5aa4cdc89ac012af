//! Value Objects - Immutable, identity-less domain primitives

mod artifact_kind;
mod deployer_kind;
mod label;
mod run_mode;

pub use artifact_kind::ArtifactKind;
pub use deployer_kind::DeployerKind;
pub use label::{Label, LabelSet, LabelValue, keys};
pub use run_mode::RunMode;
