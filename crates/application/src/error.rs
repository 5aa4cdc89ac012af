//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Writing user-facing output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Reading or writing the user configuration failed
    #[error("User configuration error: {0}")]
    UserConfig(String),
}
