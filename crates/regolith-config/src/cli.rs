//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, ProjectionSetting};

/// Regolith viewer command-line arguments.
///
/// CLI values override settings loaded from `regolith.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "regolith", about = "Streams planetary elevation data into terrain meshes")]
pub struct CliArgs {
    /// Planet identifier (Mars, Moon, Mercury).
    #[arg(long)]
    pub planet: Option<String>,

    /// Render the planet as a flat map instead of a globe.
    #[arg(long)]
    pub flat: bool,

    /// Elevation server base URL.
    #[arg(long)]
    pub server: Option<String>,

    /// Use procedural elevation instead of contacting the server.
    #[arg(long)]
    pub offline: bool,

    /// Number of loader threads.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Number of simulated camera steps to run.
    #[arg(long, default_value_t = 12)]
    pub steps: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref planet) = args.planet {
            self.planet.name = planet.clone();
        }
        if args.flat {
            self.planet.projection = ProjectionSetting::Flat;
        }
        if let Some(ref url) = args.server {
            self.server.base_url = url.trim_end_matches('/').to_string();
        }
        if args.offline {
            self.server.offline = true;
        }
        if let Some(workers) = args.workers {
            self.streaming.worker_threads = workers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
