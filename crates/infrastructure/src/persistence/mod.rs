//! Persistence module
//!
//! TOML-file storage for per-user telemetry preferences.

mod error;
mod user_config_store;

pub use error::ConfigStoreError;
pub use user_config_store::TomlUserConfigStore;
