//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod metrics_port;
mod user_config_port;

#[cfg(test)]
pub use metrics_port::MockMetricsPort;
pub use metrics_port::MetricsPort;
#[cfg(test)]
pub use user_config_port::MockUserConfigPort;
pub use user_config_port::UserConfigPort;
