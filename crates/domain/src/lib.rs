//! Domain layer for devtrail
//!
//! Contains run modes, label sets, instrument descriptors, the pipeline
//! configuration model and domain errors.
//! This layer has no knowledge of exporters or telemetry backends.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
