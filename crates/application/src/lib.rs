//! Application layer - Use cases and orchestration
//!
//! Contains the run finalizer, the metrics prompt and the port definitions
//! that telemetry adapters implement.

pub mod error;
pub mod ports;
pub mod services;
#[cfg(test)]
pub mod testing;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
