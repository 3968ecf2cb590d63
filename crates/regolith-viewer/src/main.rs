//! Regolith terrain streaming viewer.
//!
//! Configuration is loaded from `regolith.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p regolith-viewer -- --offline` to stream procedural terrain,
//! or point `--server` at an elevation service.

mod error;
mod orbit;
mod session;

use std::process::ExitCode;

use clap::Parser;
use regolith_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

pub(crate) use error::ViewerError;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone().map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // The file as written stays the baseline for hot reload; overrides apply on top.
    let on_disk = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config
        .debug
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join("logs"));
    regolith_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        planet = %config.planet.name,
        projection = ?config.planet.projection,
        offline = config.server.offline,
        steps = args.steps,
        "starting regolith"
    );

    let watch = session::ConfigWatch {
        dir: config_dir,
        on_disk,
    };
    match session::run(config, Some(watch), args.steps) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                failures = summary.failures,
                ready = summary.chunks.ready,
                visible = summary.chunks.visible,
                epoch = summary.chunks.epoch,
                meshes = summary.scene.meshes,
                added = summary.scene.added,
                removed = summary.scene.removed,
                "session finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
