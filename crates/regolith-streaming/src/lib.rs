//! Chunked terrain streaming: decides which chunks are visible, at what
//! sample stride, and drives background loads into a mesh registry.

mod camera;
mod chunk;
mod frustum;
mod loader;
mod lod;
mod manager;
mod notifier;
mod raycast;
mod registry;

pub use camera::Camera;
pub use chunk::{ChunkKey, ChunkRecord, ChunkState};
pub use frustum::{Aabb, Frustum};
pub use loader::{ChunkLoader, LoadJob, LoadOutcome, LoaderError, StreamingOptions};
pub use lod::{lod_factor, sample_stride};
pub use manager::{ChunkManager, ChunkStats, LoadFailure, RayHit};
pub use notifier::ViewChangeNotifier;
pub use raycast::{Ray, intersect_mesh, intersect_triangle};
pub use registry::{MeshId, MeshRegistry, SceneMeshes, SceneStats};
