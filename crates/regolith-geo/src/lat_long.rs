//! Geographic coordinates recovered from planar or rendering-space points.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use glam::DVec3;

/// Latitude and longitude in radians plus altitude in meters above the
/// reference sphere.
///
/// Latitude grows with the raster row (`z`), so positive values lie in the
/// southern hemisphere; longitude grows with the raster column (`x`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLongAlt {
    /// Latitude in radians, `[-π/2, π/2]`.
    pub latitude: f64,
    /// Longitude in radians, `[-π, π)`.
    pub longitude: f64,
    /// Altitude in meters relative to the reference radius.
    pub altitude: f64,
}

impl LatLongAlt {
    /// Create from raw components.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Geographic coordinates of a planar point (x/z arc lengths in meters
    /// from the raster origin, y elevation in meters).
    pub fn from_planar(point: DVec3, radius: f64) -> Self {
        Self {
            latitude: point.z / radius - FRAC_PI_2,
            longitude: point.x / radius - PI,
            altitude: point.y,
        }
    }

    /// Inverse of [`LatLongAlt::from_planar`].
    pub fn to_planar(self, radius: f64) -> DVec3 {
        DVec3::new(
            (self.longitude + PI) * radius,
            self.altitude,
            (self.latitude + FRAC_PI_2) * radius,
        )
    }

    /// Latitude in degrees.
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude.to_degrees()
    }

    /// Longitude in degrees.
    pub fn longitude_degrees(&self) -> f64 {
        self.longitude.to_degrees()
    }

    /// Component-wise comparison with separate angular and altitude tolerances.
    pub fn approx_eq(&self, other: &Self, angle_eps: f64, altitude_eps: f64) -> bool {
        (self.latitude - other.latitude).abs() <= angle_eps
            && (self.longitude - other.longitude).abs() <= angle_eps
            && (self.altitude - other.altitude).abs() <= altitude_eps
    }
}

impl fmt::Display for LatLongAlt {
    /// Hemisphere notation, e.g. `12.5000° S, 33.1000° W, 1200 m`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude_degrees();
        let lon = self.longitude_degrees();
        let ns = if lat > 0.0 { 'S' } else { 'N' };
        let ew = if lon > 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}° {ns}, {:.4}° {ew}, {:.0} m",
            lat.abs(),
            lon.abs(),
            self.altitude
        )
    }
}
