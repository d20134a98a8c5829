//! Versioned service configuration: file, environment overrides and schema.

pub mod config;
pub mod logging;
pub mod store;

pub use config::*;
pub use logging::*;
pub use store::*;
