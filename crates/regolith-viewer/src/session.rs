//! One viewing session: planet selection, streaming, and the scripted flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regolith_config::{Config, ProjectionSetting};
use regolith_elevation::{ElevationSource, HttpElevationSource, NoiseElevationSource, PlanetCatalog};
use regolith_geo::{PlanetProfile, Projection};
use regolith_streaming::{
    Camera, ChunkManager, ChunkStats, MeshRegistry, Ray, SceneMeshes, SceneStats,
    StreamingOptions,
};
use tracing::{info, warn};

use crate::ViewerError;
use crate::orbit::Orbit;

/// Seed of the offline terrain generator.
const OFFLINE_SEED: u32 = 0x5EED;

/// What a finished session streamed.
#[derive(Debug)]
pub struct SessionSummary {
    pub steps: u32,
    pub failures: usize,
    pub chunks: ChunkStats,
    pub scene: SceneStats,
}

pub fn projection_for(setting: ProjectionSetting) -> Projection {
    match setting {
        ProjectionSetting::Flat => Projection::Flat,
        ProjectionSetting::Spherical => Projection::Spherical,
    }
}

/// Resolve the configured planet and the elevation source serving it.
pub fn connect(config: &Config) -> Result<(PlanetProfile, Arc<dyn ElevationSource>), ViewerError> {
    let requested = &config.planet.name;
    if config.server.offline {
        let profile = PlanetProfile::by_name(requested)
            .ok_or_else(|| ViewerError::UnknownPlanet(requested.clone()))?;
        info!(planet = %profile.name, "using procedural elevation");
        let source = NoiseElevationSource::new(profile.clone(), OFFLINE_SEED);
        return Ok((profile, Arc::new(source)));
    }

    let timeout = Duration::from_secs(u64::from(config.server.timeout_seconds));
    let source = HttpElevationSource::new(config.server.base_url.as_str(), timeout)?;
    let available = PlanetCatalog::new(source.clone()).fetch_available()?;
    let names: Vec<&str> = available.iter().map(|p| p.name.as_str()).collect();
    info!(server = %source.base_url(), available = ?names, "planet catalog");

    let profile = available
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| ViewerError::PlanetUnavailable {
            requested: requested.clone(),
            available: names.join(", "),
        })?;
    Ok((profile, Arc::new(source)))
}

/// The config file as last read from disk, polled for edits during a session.
///
/// Kept apart from the effective config so command-line overrides survive
/// until the file itself changes.
pub struct ConfigWatch {
    pub dir: PathBuf,
    pub on_disk: Config,
}

/// Fly `steps` poses around the planet, streaming terrain at each one.
///
/// With a [`ConfigWatch`], the config file is re-read every step and a changed
/// projection or planet is applied on the fly.
pub fn run(
    config: Config,
    mut watch: Option<ConfigWatch>,
    steps: u32,
) -> Result<SessionSummary, ViewerError> {
    let (profile, source) = connect(&config)?;
    let projection = projection_for(config.planet.projection);
    let options = StreamingOptions {
        worker_threads: config.streaming.worker_threads,
        queue_capacity: config.streaming.queue_capacity,
    };
    let mut manager = ChunkManager::new(profile, projection, source, options)?;
    let mut scene = SceneMeshes::new();

    let throttle = Duration::from_millis(config.camera.view_change_throttle_ms);
    let load_timeout = Duration::from_secs(u64::from(config.server.timeout_seconds).max(1));
    let mut notifier = manager.view_notifier(throttle);
    let mut orbit = Orbit::new(manager.profile(), projection, &config.camera, steps);
    let clock = Instant::now();
    let mut failures = 0;

    for step in 0..steps {
        if let Some(watch) = watch.as_mut() {
            match watch.on_disk.reload(&watch.dir) {
                Ok(Some(updated)) => {
                    let camera = orbit.camera(step);
                    apply_config_change(&mut manager, &watch.on_disk, &updated, &camera, &mut scene);
                    orbit =
                        Orbit::new(manager.profile(), manager.projection(), &updated.camera, steps);
                    watch.on_disk = updated;
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "ignoring unreadable config"),
            }
        }

        let camera = orbit.camera(step);
        // Simulated time: one throttle interval per step.
        notifier.observe(&camera, clock + throttle * step);
        failures += manager.update(&camera, &mut scene).len();
        failures += manager.wait_idle(&mut scene, load_timeout).len();

        let stats = manager.stats();
        info!(
            step,
            visible = stats.visible,
            stride = stats.stride,
            ready = stats.ready,
            meshes = scene.len(),
            "orbit step"
        );
        let ray = Ray::new(camera.position, camera.forward());
        if let Some(hit) = manager.raycast_loaded(&ray) {
            info!(step, chunk = %hit.key, location = %manager.pick(hit.point), "looking at");
        }
    }

    Ok(SessionSummary {
        steps,
        failures,
        chunks: manager.stats(),
        scene: scene.stats(),
    })
}

fn apply_config_change(
    manager: &mut ChunkManager,
    old: &Config,
    new: &Config,
    camera: &Camera,
    registry: &mut dyn MeshRegistry,
) {
    if !new.planet.name.eq_ignore_ascii_case(&old.planet.name) {
        match PlanetProfile::by_name(&new.planet.name) {
            Some(profile) => manager.set_planet(profile, camera, registry),
            None => warn!(planet = %new.planet.name, "unknown planet in config, keeping current"),
        }
    }
    if new.planet.projection != old.planet.projection {
        manager.set_projection(projection_for(new.planet.projection), camera, registry);
    }
}
