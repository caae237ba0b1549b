//! Client configuration: server location, timing and diagnostics.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, LoggingConfig, ServerConfig, TimingConfig};
