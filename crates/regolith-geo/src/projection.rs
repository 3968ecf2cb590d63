//! Planar ⇄ rendering-space projections.
//!
//! Planar points carry arc lengths in meters measured from the raster origin
//! in `x` (columns, longitude) and `z` (rows, latitude), and elevation in `y`.
//! Two projections are provided:
//! - **Flat**: identity; the raster is laid out on the XZ plane.
//! - **Spherical**: the raster is wrapped around a sphere centered at the
//!   origin, longitude winding around the Z axis and latitude tilting
//!   towards it.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;

use crate::LatLongAlt;

/// Selects how planar elevation samples are placed in rendering space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// Identity mapping onto the XZ plane.
    Flat,
    /// Wrap around a sphere of `radius + elevation`.
    #[default]
    Spherical,
}

impl Projection {
    /// Map a planar point into rendering space.
    #[inline]
    #[must_use]
    pub fn project(self, point: DVec3, radius: f64) -> DVec3 {
        match self {
            Projection::Flat => point,
            Projection::Spherical => {
                let latitude = point.z / radius - FRAC_PI_2;
                let longitude = point.x / radius - PI;
                sphere_point(latitude, longitude, radius + point.y)
            }
        }
    }

    /// Exact inverse of [`Projection::project`].
    #[inline]
    #[must_use]
    pub fn unproject(self, point: DVec3, radius: f64) -> DVec3 {
        match self {
            Projection::Flat => point,
            Projection::Spherical => self.lat_long_alt(point, radius).to_planar(radius),
        }
    }

    /// Recover geographic coordinates from a rendering-space point.
    ///
    /// Both projections report the same values for the same planar input, so
    /// callers never need to know which one is active.
    #[must_use]
    pub fn lat_long_alt(self, point: DVec3, radius: f64) -> LatLongAlt {
        match self {
            Projection::Flat => LatLongAlt::from_planar(point, radius),
            Projection::Spherical => {
                let distance = point.length();
                if distance <= f64::EPSILON {
                    // Planet center: direction undefined.
                    return LatLongAlt::new(0.0, 0.0, -radius);
                }
                LatLongAlt {
                    latitude: (point.z / distance).clamp(-1.0, 1.0).asin(),
                    longitude: point.y.atan2(point.x),
                    altitude: distance - radius,
                }
            }
        }
    }

    /// Returns `true` for projections that curve the surface, which is
    /// where horizon occlusion matters.
    pub fn is_curved(self) -> bool {
        matches!(self, Projection::Spherical)
    }
}

/// Standard spherical-to-Cartesian conversion.
#[inline]
fn sphere_point(latitude: f64, longitude: f64, radius: f64) -> DVec3 {
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_lon, cos_lon) = longitude.sin_cos();
    DVec3::new(
        radius * cos_lat * cos_lon,
        radius * cos_lat * sin_lon,
        radius * sin_lat,
    )
}
