//! The rendering side's view of terrain meshes.

use std::sync::Arc;

use regolith_mesh::TerrainMesh;
use rustc_hash::FxHashMap;

/// Opaque handle of a registered mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

/// Receives mesh registrations from the chunk manager.
///
/// Every id passed to `add_mesh` is eventually passed to `remove_mesh`
/// exactly once, unless the registry is dropped first.
pub trait MeshRegistry {
    fn add_mesh(&mut self, id: MeshId, mesh: Arc<TerrainMesh>);
    fn remove_mesh(&mut self, id: MeshId);
}

/// Snapshot of [`SceneMeshes`] counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub added: u64,
    pub removed: u64,
}

/// In-memory mesh registry standing in for a scene graph.
#[derive(Debug, Default)]
pub struct SceneMeshes {
    meshes: FxHashMap<MeshId, Arc<TerrainMesh>>,
    added: u64,
    removed: u64,
}

impl SceneMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn get(&self, id: MeshId) -> Option<&Arc<TerrainMesh>> {
        self.meshes.get(&id)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<MeshId> {
        let mut ids: Vec<_> = self.meshes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Arc<TerrainMesh>> {
        self.meshes.values()
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            meshes: self.meshes.len(),
            vertices: self.meshes.values().map(|m| m.vertex_count()).sum(),
            triangles: self.meshes.values().map(|m| m.triangle_count()).sum(),
            added: self.added,
            removed: self.removed,
        }
    }
}

impl MeshRegistry for SceneMeshes {
    fn add_mesh(&mut self, id: MeshId, mesh: Arc<TerrainMesh>) {
        if self.meshes.insert(id, mesh).is_some() {
            tracing::warn!(?id, "mesh id registered twice");
        }
        self.added += 1;
    }

    fn remove_mesh(&mut self, id: MeshId) {
        if self.meshes.remove(&id).is_some() {
            self.removed += 1;
        } else {
            tracing::warn!(?id, "removing a mesh that is not registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut scene = SceneMeshes::new();
        scene.add_mesh(MeshId(2), Arc::new(TerrainMesh::empty()));
        scene.add_mesh(MeshId(1), Arc::new(TerrainMesh::empty()));
        assert_eq!(scene.ids(), vec![MeshId(1), MeshId(2)]);

        scene.remove_mesh(MeshId(2));
        scene.remove_mesh(MeshId(7));
        let stats = scene.stats();
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.added, 2);
        assert_eq!(stats.removed, 1);
        assert!(scene.contains(MeshId(1)));
    }
}
