//! Procedural elevation for running without a server.
//!
//! Heights come from multi-octave simplex noise evaluated on the unit sphere,
//! so the raster wraps seamlessly at the date line and stays continuous at
//! the poles.

use glam::DVec3;
use noise::{NoiseFn, Simplex};
use regolith_geo::{PlanetProfile, Projection, builtin_profiles};

use crate::{ElevationRequest, ElevationSource, FetchError, NO_DATA};

/// Deterministic fBm elevation over a planet profile.
pub struct NoiseElevationSource {
    noise: Simplex,
    profile: PlanetProfile,
    octaves: u32,
    base_frequency: f64,
    amplitude_m: f64,
    /// Latitude (radians from the equator) past which samples are missing.
    coverage_limit: f64,
}

impl NoiseElevationSource {
    /// Create a source with terrain-like defaults (±~8 km relief).
    pub fn new(profile: PlanetProfile, seed: u32) -> Self {
        Self {
            noise: Simplex::new(seed),
            profile,
            octaves: 6,
            base_frequency: 2.0,
            amplitude_m: 4000.0,
            coverage_limit: std::f64::consts::FRAC_PI_2,
        }
    }

    /// Report [`NO_DATA`] poleward of `degrees` latitude, emulating datasets
    /// whose orbit never covered the polar caps.
    pub fn with_coverage_limit(mut self, degrees: f64) -> Self {
        self.coverage_limit = degrees.to_radians();
        self
    }

    /// Elevation in meters at raster pixel `(x, z)` of this source's planet.
    pub fn sample(&self, x: u32, z: u32) -> i16 {
        self.sample_on(&self.profile, x, z)
    }

    fn sample_on(&self, profile: &PlanetProfile, x: u32, z: u32) -> i16 {
        if x > profile.pixels_width || z > profile.pixels_height {
            return NO_DATA;
        }
        let radius = profile.radius_meters;
        let planar = DVec3::new(
            x as f64 * profile.meters_per_pixel,
            0.0,
            z as f64 * profile.meters_per_pixel,
        );
        let latitude = planar.z / radius - std::f64::consts::FRAC_PI_2;
        if latitude.abs() > self.coverage_limit {
            return NO_DATA;
        }
        let unit = Projection::Spherical.project(planar, radius) / radius;

        let mut total = 0.0;
        let mut frequency = self.base_frequency;
        let mut amplitude = self.amplitude_m;
        for _ in 0..self.octaves {
            let p = unit * frequency;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        total.clamp(f64::from(NO_DATA) + 1.0, f64::from(i16::MAX)) as i16
    }
}

impl ElevationSource for NoiseElevationSource {
    fn fetch(&self, request: &ElevationRequest) -> Result<Vec<i16>, FetchError> {
        request.validate()?;
        // Other built-in planets are served too, so a planet switch keeps working offline.
        let other;
        let profile = if request.dataset == self.profile.dataset {
            &self.profile
        } else {
            other = builtin_profiles()
                .into_iter()
                .find(|p| p.dataset == request.dataset)
                .ok_or_else(|| {
                    FetchError::InvalidRequest(format!("unknown dataset {:?}", request.dataset))
                })?;
            &other
        };
        let mut out = Vec::with_capacity(request.sample_count());
        for row in 0..request.rows() as u32 {
            for col in 0..request.columns() as u32 {
                out.push(self.sample_on(
                    profile,
                    request.x + col * request.stride,
                    request.z + row * request.stride,
                ));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(x: u32, z: u32) -> ElevationRequest {
        ElevationRequest {
            dataset: "mola".into(),
            x,
            z,
            width: 64,
            height: 64,
            stride: 16,
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = NoiseElevationSource::new(PlanetProfile::mars(), 7);
        let b = NoiseElevationSource::new(PlanetProfile::mars(), 7);
        let r = request(5760, 8000);
        assert_eq!(a.fetch(&r).unwrap(), b.fetch(&r).unwrap());
    }

    #[test]
    fn test_full_coverage_has_no_sentinels_inside_raster() {
        let source = NoiseElevationSource::new(PlanetProfile::mars(), 1);
        let samples = source.fetch(&request(0, 11_000)).unwrap();
        assert_eq!(samples.len(), 16);
        assert!(samples.iter().all(|&s| s != NO_DATA));
    }

    #[test]
    fn test_longitude_wraps_seamlessly() {
        let profile = PlanetProfile::mars();
        let source = NoiseElevationSource::new(profile.clone(), 3);
        let west = i32::from(source.sample(0, 9000));
        let east = i32::from(source.sample(profile.pixels_width, 9000));
        assert!((west - east).abs() <= 1, "{west} vs {east}");
    }

    #[test]
    fn test_serves_other_builtin_datasets() {
        let source = NoiseElevationSource::new(PlanetProfile::mars(), 1);
        let mut lola = request(80_000, 20_000);
        lola.dataset = "lola".into();
        assert!(source.fetch(&lola).unwrap().iter().all(|&s| s != NO_DATA));

        let mut unknown = request(0, 0);
        unknown.dataset = "vesta".into();
        assert!(matches!(source.fetch(&unknown), Err(FetchError::InvalidRequest(_))));
    }

    #[test]
    fn test_coverage_limit_masks_poles() {
        let source = NoiseElevationSource::new(PlanetProfile::mars(), 1).with_coverage_limit(80.0);
        assert_eq!(source.sample(100, 0), NO_DATA);
        assert_ne!(source.sample(100, 23_040 / 2), NO_DATA);
    }
}
