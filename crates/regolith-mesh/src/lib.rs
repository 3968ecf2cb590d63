//! Terrain meshing: elevation sample grids to indexed triangle meshes, plus
//! the low-poly chunk proxies used for culling.

mod error;
mod grid;
mod mesh;

pub use error::GridError;
pub use grid::{ElevationGridBuilder, GridWindow};
pub use mesh::{IndexBuffer, TerrainMesh};
