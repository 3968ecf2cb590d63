//! Scripted camera path used in place of an interactive controller.

use std::f32::consts::TAU;

use glam::Vec3;
use regolith_config::CameraConfig;
use regolith_geo::{PlanetProfile, Projection};
use regolith_streaming::Camera;

/// Latitude of the spherical orbit, tilted off the equator.
const ORBIT_TILT: f32 = 0.35;

/// A closed flight path around (or across) the planet.
pub struct Orbit {
    base: Camera,
    projection: Projection,
    steps: u32,
    radius: f32,
    map_width: f32,
    map_height: f32,
    altitude: f32,
}

impl Orbit {
    pub fn new(profile: &PlanetProfile, projection: Projection, camera: &CameraConfig, steps: u32) -> Self {
        let units = |pixels: u32| {
            (f64::from(pixels) * profile.meters_per_pixel / profile.meters_per_render_unit) as f32
        };
        Self {
            base: Camera {
                fov_y: camera.fov_y_degrees.to_radians(),
                near: camera.near,
                far: camera.far,
                ..Camera::default()
            },
            projection,
            steps: steps.max(1),
            radius: profile.radius_render_units() as f32,
            map_width: units(profile.pixels_width),
            map_height: units(profile.pixels_height),
            altitude: camera.start_altitude_units,
        }
    }

    /// Camera pose at `step`.
    pub fn camera(&self, step: u32) -> Camera {
        let t = (step % self.steps) as f32 / self.steps as f32;
        let (eye, target, up) = match self.projection {
            Projection::Spherical => {
                let distance = self.radius + self.altitude;
                let angle = t * TAU;
                let eye = Vec3::new(
                    angle.cos() * ORBIT_TILT.cos(),
                    angle.sin() * ORBIT_TILT.cos(),
                    ORBIT_TILT.sin(),
                ) * distance;
                (eye, Vec3::ZERO, Vec3::Z)
            }
            Projection::Flat => {
                // Sweep west to east along the middle row, looking down and ahead.
                let x = (t + 0.5 / self.steps as f32) * self.map_width;
                let eye = Vec3::new(x, self.altitude, self.map_height * 0.5);
                let target = Vec3::new(eye.x + self.altitude * 0.5, 0.0, eye.z);
                (eye, target, Vec3::NEG_Z)
            }
        };
        let mut camera = self.base.clone();
        camera.position = eye;
        camera.look_at(target, up);
        camera
    }
}
