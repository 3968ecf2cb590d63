//! Per-chunk bookkeeping.

use std::fmt;
use std::sync::Arc;

use regolith_mesh::TerrainMesh;

use crate::MeshId;

/// Chunk grid coordinate: column `x`, row `z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: u32,
    pub z: u32,
}

impl ChunkKey {
    pub fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Load state of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ChunkState {
    /// Nothing requested, or the last request failed or was discarded.
    #[default]
    Empty,
    /// A load is in flight. A previously registered mesh may still be shown.
    Loading,
    /// The registered mesh matches the last requested stride.
    Ready,
    /// Ready, but at a stride the latest visibility pass no longer wants,
    /// or kept after a failed replacement.
    Stale,
}

/// A registered mesh and the stride it was sampled at.
#[derive(Clone, Debug)]
pub(crate) struct LoadedMesh {
    pub(crate) id: MeshId,
    pub(crate) stride: u32,
    pub(crate) mesh: Arc<TerrainMesh>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub(crate) stride: u32,
    pub(crate) epoch: u64,
}

/// Everything the manager knows about one chunk.
#[derive(Clone, Debug, Default)]
pub struct ChunkRecord {
    pub(crate) state: ChunkState,
    pub(crate) loaded: Option<LoadedMesh>,
    pub(crate) in_flight: Option<InFlight>,
    /// Drop the in-flight result instead of registering it.
    pub(crate) dispose_pending: bool,
    /// Selected by the latest visibility pass.
    pub(crate) wanted: bool,
    pub(crate) desired_stride: u32,
    /// Wanted, but the loader queue was full when the load was requested.
    pub(crate) deferred: bool,
}

impl ChunkRecord {
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Id of the currently registered mesh, if any.
    pub fn mesh_id(&self) -> Option<MeshId> {
        self.loaded.as_ref().map(|l| l.id)
    }

    /// Stride of the currently registered mesh, if any.
    pub fn mesh_stride(&self) -> Option<u32> {
        self.loaded.as_ref().map(|l| l.stride)
    }

    pub fn mesh(&self) -> Option<&Arc<TerrainMesh>> {
        self.loaded.as_ref().map(|l| &l.mesh)
    }

    /// Stride of the in-flight load, if any.
    pub fn loading_stride(&self) -> Option<u32> {
        self.in_flight.map(|f| f.stride)
    }

    pub fn is_dispose_pending(&self) -> bool {
        self.dispose_pending
    }

    /// Waiting for space in the loader queue.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }
}
