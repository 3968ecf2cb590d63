//! Configuration system for the Regolith terrain viewer.
//!
//! Settings persist to disk as a RON file in the platform configuration
//! directory. Command-line flags parsed with clap override the file, and a
//! reload check reports when the file changed underneath a running viewer.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, PlanetConfig, ProjectionSetting, ServerConfig,
    StreamingConfig, default_config_dir,
};
pub use error::ConfigError;
