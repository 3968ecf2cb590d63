//! Elevation data access: the fetch contract consumed by the terrain builder,
//! plus server, in-memory, and procedural implementations of it.

mod catalog;
mod http;
mod procedural;
mod raster;
mod request;

pub use catalog::{PlanetCatalog, parse_catalog};
pub use http::HttpElevationSource;
pub use procedural::NoiseElevationSource;
pub use raster::RasterElevationSource;
pub use request::{ElevationRequest, ElevationSource, FetchError, NO_DATA};
