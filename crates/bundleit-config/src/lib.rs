//! Configuration for the bundleit pipeline.
//!
//! This crate handles:
//! - The JSON configuration file
//! - Overrides supplied by the CLI (flags and environment)
//! - Resolution into one immutable [`PipelineConfig`]

pub mod error;
pub mod file;
pub mod overrides;
pub mod pipeline;

pub use error::{ConfigError, ConfigResult};
pub use file::ConfigFile;
pub use overrides::Overrides;
pub use pipeline::{AppCompatibility, Endpoint, PipelineConfig};
