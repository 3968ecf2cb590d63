//! Planet geometry: per-body raster constants and the planar ⇄ rendering-space projections.

mod lat_long;
mod profile;
mod projection;

pub use lat_long::LatLongAlt;
pub use profile::{
    CHUNK_SIZE_PIXELS, GLOBAL_STRIDE, METERS_PER_RENDER_UNIT, PlanetProfile, builtin_profiles,
};
pub use projection::Projection;
