//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// A configuration record declares none of its variant tables
    #[error("{owner} declares no {kind}; expected one of: {expected}")]
    MissingVariant {
        owner: String,
        kind: &'static str,
        expected: String,
    },

    /// A configuration record declares more than one variant table
    #[error("{owner} declares several {kind}s ({found}); only one is allowed")]
    AmbiguousVariant {
        owner: String,
        kind: &'static str,
        found: String,
    },

    /// The pipeline file could not be parsed
    #[error("Invalid pipeline configuration: {0}")]
    InvalidPipeline(String),

    /// Unknown run mode name
    #[error("Unknown run mode: {0}")]
    UnknownRunMode(String),
}

impl DomainError {
    /// Create a missing variant error
    pub fn missing_variant(owner: impl Into<String>, kind: &'static str, expected: &[&str]) -> Self {
        Self::MissingVariant {
            owner: owner.into(),
            kind,
            expected: expected.join(", "),
        }
    }

    /// Create an ambiguous variant error
    pub fn ambiguous_variant(owner: impl Into<String>, kind: &'static str, found: &[&str]) -> Self {
        Self::AmbiguousVariant {
            owner: owner.into(),
            kind,
            found: found.join(", "),
        }
    }
}
