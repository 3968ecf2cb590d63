//! Indexed triangle mesh in rendering space.

use glam::Vec3;

/// Triangle index storage, sized to the vertex count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices, used whenever every vertex is addressable by a `u16`.
    U16(Vec<u16>),
    /// 32-bit indices for larger meshes.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Pick the narrowest index width able to address `vertex_count` vertices.
    pub fn for_vertex_count(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            IndexBuffer::U32(indices)
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    /// Returns `true` if there are no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index at position `i`, widened to `u32`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn get(&self, i: usize) -> u32 {
        match self {
            IndexBuffer::U16(v) => u32::from(v[i]),
            IndexBuffer::U32(v) => v[i],
        }
    }

    /// Size of one index in bytes.
    pub fn stride_bytes(&self) -> usize {
        match self {
            IndexBuffer::U16(_) => 2,
            IndexBuffer::U32(_) => 4,
        }
    }

    /// Raw index bytes for upload (zero-copy).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(v) => bytemuck::cast_slice(v),
            IndexBuffer::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// A terrain mesh: positions in rendering units and a triangle list.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: IndexBuffer,
}

impl TerrainMesh {
    /// A mesh with no geometry.
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            indices: IndexBuffer::U16(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex position as a vector.
    pub fn position(&self, index: u32) -> Vec3 {
        Vec3::from_array(self.positions[index as usize])
    }

    /// Corner positions of triangle `t`, in winding order.
    pub fn triangle(&self, t: usize) -> [Vec3; 3] {
        let base = t * 3;
        [
            self.position(self.indices.get(base)),
            self.position(self.indices.get(base + 1)),
            self.position(self.indices.get(base + 2)),
        ]
    }

    /// Iterate over all triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.triangle_count()).map(|t| self.triangle(t))
    }

    /// Axis-aligned bounds of all positions, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Returns `true` if every index addresses an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        (0..self.indices.len()).all(|i| (self.indices.get(i) as usize) < self.positions.len())
    }

    /// Position data as a byte slice for GPU upload (zero-copy).
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Index data as a byte slice for GPU upload (zero-copy).
    pub fn index_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }
}

impl Default for TerrainMesh {
    fn default() -> Self {
        Self::empty()
    }
}
