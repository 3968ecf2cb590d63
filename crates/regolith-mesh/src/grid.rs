//! Elevation grid to triangle mesh.
//!
//! A window of strided raster samples becomes a regular grid of vertices,
//! each projected into rendering space. Samples equal to [`NO_DATA`] are
//! holes: the triangles touching them are bridged to the next valid sample of
//! the same row where possible, and the hole vertices are then compacted out.

use glam::{DVec3, Vec3};
use regolith_elevation::{ElevationRequest, ElevationSource, NO_DATA};
use regolith_geo::{PlanetProfile, Projection};

use crate::{GridError, IndexBuffer, TerrainMesh};

/// A strided rectangle of raster pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridWindow {
    /// First pixel column.
    pub x: u32,
    /// First pixel row.
    pub z: u32,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl GridWindow {
    pub fn new(x: u32, z: u32, width: u32, height: u32, stride: u32) -> Self {
        Self {
            x,
            z,
            width,
            height,
            stride,
        }
    }

    /// Vertices per row.
    pub fn columns(&self) -> usize {
        (self.width / self.stride.max(1)) as usize
    }

    /// Vertex rows.
    pub fn rows(&self) -> usize {
        (self.height / self.stride.max(1)) as usize
    }

    pub fn sample_count(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Check that width and height are positive multiples of the stride.
    pub fn validate(&self) -> Result<(), GridError> {
        let aligned = self.stride > 0
            && self.width > 0
            && self.height > 0
            && self.width % self.stride == 0
            && self.height % self.stride == 0;
        if aligned {
            Ok(())
        } else {
            Err(GridError::InvalidWindow {
                width: self.width,
                height: self.height,
                stride: self.stride,
            })
        }
    }

    /// The elevation request covering this window.
    pub fn request(&self, dataset: &str) -> ElevationRequest {
        ElevationRequest {
            dataset: dataset.to_string(),
            x: self.x,
            z: self.z,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

/// Builds terrain meshes and chunk proxies for one planet under one projection.
#[derive(Clone, Debug)]
pub struct ElevationGridBuilder {
    profile: PlanetProfile,
    projection: Projection,
}

impl ElevationGridBuilder {
    pub fn new(profile: PlanetProfile, projection: Projection) -> Self {
        Self {
            profile,
            projection,
        }
    }

    pub fn profile(&self) -> &PlanetProfile {
        &self.profile
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Fetch the window from `source` (one request, no retry) and mesh it.
    pub fn build_grid(
        &self,
        source: &dyn ElevationSource,
        window: &GridWindow,
    ) -> Result<TerrainMesh, GridError> {
        window.validate()?;
        let samples = source.fetch(&window.request(&self.profile.dataset))?;
        self.build_from_samples(window, &samples)
    }

    /// Mesh an already fetched, row-major sample grid.
    pub fn build_from_samples(
        &self,
        window: &GridWindow,
        samples: &[i16],
    ) -> Result<TerrainMesh, GridError> {
        window.validate()?;
        let expected = window.sample_count();
        if samples.len() != expected {
            return Err(GridError::MalformedGrid {
                expected,
                actual: samples.len(),
            });
        }

        let columns = window.columns();
        let rows = window.rows();

        // Vertex pass.
        let mut positions = Vec::with_capacity(expected);
        for row in 0..rows {
            for col in 0..columns {
                let elevation = samples[row * columns + col];
                let px = window.x as f64 + (col as u32 * window.stride) as f64;
                let pz = window.z as f64 + (row as u32 * window.stride) as f64;
                positions.push(self.vertex(px, f64::from(elevation), pz).to_array());
            }
        }

        // Index pass.
        let valid = |i: usize| samples[i] != NO_DATA;
        // Bridging only looks further along the row; a sentinel with nothing
        // valid to its right (e.g. in the last column) drops the triangle.
        let resolve = |col: usize, row: usize| -> Option<u32> {
            let start = row * columns;
            (col..columns)
                .map(|c| start + c)
                .find(|&i| valid(i))
                .map(|i| i as u32)
        };
        let mut indices: Vec<u32> = Vec::with_capacity((columns.saturating_sub(1)) * (rows.saturating_sub(1)) * 6);
        for row in 0..rows.saturating_sub(1) {
            for col in 0..columns.saturating_sub(1) {
                let tl = resolve(col, row);
                let tr = resolve(col + 1, row);
                let bl = resolve(col, row + 1);
                let br = resolve(col + 1, row + 1);
                for triangle in [[tl, bl, tr], [tr, bl, br]] {
                    if let [Some(a), Some(b), Some(c)] = triangle
                        && a != b
                        && b != c
                        && a != c
                    {
                        indices.extend_from_slice(&[a, b, c]);
                    }
                }
            }
        }

        // Compaction pass.
        let mut remap = vec![u32::MAX; positions.len()];
        let mut compacted = Vec::with_capacity(positions.len());
        for (i, position) in positions.into_iter().enumerate() {
            if valid(i) {
                remap[i] = compacted.len() as u32;
                compacted.push(position);
            }
        }
        for index in &mut indices {
            *index = remap[*index as usize];
        }

        tracing::trace!(
            x = window.x,
            z = window.z,
            stride = window.stride,
            vertices = compacted.len(),
            triangles = indices.len() / 3,
            "built terrain grid"
        );

        let vertex_count = compacted.len();
        Ok(TerrainMesh {
            positions: compacted,
            indices: IndexBuffer::for_vertex_count(indices, vertex_count),
        })
    }

    /// Low-poly stand-in for a chunk: its four footprint corners at zero
    /// elevation, as two triangles.
    pub fn build_chunk_bound_proxy(&self, chunk_x: u32, chunk_z: u32) -> TerrainMesh {
        let size = f64::from(self.profile.chunk_size_pixels);
        let x0 = f64::from(chunk_x) * size;
        let z0 = f64::from(chunk_z) * size;
        let corners = [(x0, z0), (x0 + size, z0), (x0, z0 + size), (x0 + size, z0 + size)];
        TerrainMesh {
            positions: corners
                .iter()
                .map(|&(px, pz)| self.vertex(px, 0.0, pz).to_array())
                .collect(),
            // TL=0 TR=1 BL=2 BR=3, same winding as the grid.
            indices: IndexBuffer::U16(vec![0, 2, 1, 1, 2, 3]),
        }
    }

    /// Projected center of a chunk's footprint at zero elevation.
    pub fn midpoint(&self, chunk_x: u32, chunk_z: u32) -> Vec3 {
        let size = f64::from(self.profile.chunk_size_pixels);
        self.vertex(
            (f64::from(chunk_x) + 0.5) * size,
            0.0,
            (f64::from(chunk_z) + 0.5) * size,
        )
    }

    /// Place raster pixel `(px, pz)` at `elevation` meters in rendering space.
    fn vertex(&self, px: f64, elevation: f64, pz: f64) -> Vec3 {
        let mpp = self.profile.meters_per_pixel;
        let planar = DVec3::new(px * mpp, elevation, pz * mpp);
        let projected = self.projection.project(planar, self.profile.radius_meters);
        (projected / self.profile.meters_per_render_unit).as_vec3()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use regolith_elevation::{FetchError, RasterElevationSource};

    use super::*;

    const S: i16 = NO_DATA;

    fn flat_builder() -> ElevationGridBuilder {
        ElevationGridBuilder::new(PlanetProfile::mars(), Projection::Flat)
    }

    /// Up-facing when `(b - a) × (c - a)` points along +Y on a flat grid.
    fn winding_y(t: [Vec3; 3]) -> f32 {
        (t[1] - t[0]).cross(t[2] - t[0]).y
    }

    struct CountingSource {
        inner: RasterElevationSource,
        calls: AtomicUsize,
    }

    impl ElevationSource for CountingSource {
        fn fetch(&self, request: &ElevationRequest) -> Result<Vec<i16>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(request)
        }
    }

    struct FailingSource;

    impl ElevationSource for FailingSource {
        fn fetch(&self, _: &ElevationRequest) -> Result<Vec<i16>, FetchError> {
            Err(FetchError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_full_grid_triangle_count() {
        let builder = flat_builder();
        for (w, h) in [(2usize, 2usize), (5, 3), (7, 7)] {
            let window = GridWindow::new(0, 0, w as u32 * 16, h as u32 * 16, 16);
            let samples = vec![100; w * h];
            let mesh = builder.build_from_samples(&window, &samples).unwrap();
            assert_eq!(mesh.vertex_count(), w * h);
            assert_eq!(mesh.triangle_count(), 2 * (w - 1) * (h - 1));
            assert!(mesh.indices_in_range());
        }
    }

    #[test]
    fn test_build_grid_fetches_once_and_scales_elevation() {
        let source = CountingSource {
            inner: RasterElevationSource::from_fn(256, 256, |x, z| ((x + z) * 10) as i16),
            calls: AtomicUsize::new(0),
        };
        let builder = flat_builder();
        let window = GridWindow::new(0, 0, 128, 128, 32);
        let mesh = builder.build_grid(&source, &window).unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.triangle_count(), 18);

        let mpp = PlanetProfile::mars().meters_per_pixel as f32;
        for row in 0..4u32 {
            for col in 0..4u32 {
                let p = mesh.position(row * 4 + col);
                let elevation = ((col * 32 + row * 32) * 10) as f32;
                assert!((p.y - elevation / 10_000.0).abs() < 1e-6);
                assert!((p.x - (col * 32) as f32 * mpp / 10_000.0).abs() < 1e-4);
                assert!((p.z - (row * 32) as f32 * mpp / 10_000.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_flat_grid_winding_faces_up() {
        let window = GridWindow::new(0, 0, 64, 48, 16);
        let mesh = flat_builder()
            .build_from_samples(&window, &[0; 12])
            .unwrap();
        assert!(mesh.triangles().all(|t| winding_y(t) > 0.0));
    }

    #[test]
    fn test_sentinels_are_compacted_out() {
        #[rustfmt::skip]
        let samples = [
            10, S,  12, 13,
            S,  21, 22, S,
            30, 31, S,  33,
        ];
        let window = GridWindow::new(0, 0, 64, 48, 16);
        let mesh = flat_builder().build_from_samples(&window, &samples).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.indices_in_range());
        assert!(mesh.triangle_count() > 0);
        for p in &mesh.positions {
            assert!(p[1] > 0.0, "sentinel vertex leaked: {p:?}");
        }
        for t in mesh.triangles() {
            assert!(t[0] != t[1] && t[1] != t[2] && t[0] != t[2]);
            assert!(winding_y(t) > 0.0);
        }
    }

    #[test]
    fn test_ragged_row_start_is_bridged() {
        #[rustfmt::skip]
        let samples = [
            1, 1, 1, 1,
            S, S, S, 1,
        ];
        let window = GridWindow::new(0, 0, 64, 32, 16);
        let mesh = flat_builder().build_from_samples(&window, &samples).unwrap();
        // Fan from the single valid bottom vertex to every top edge.
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.triangle_count(), 3);
        assert!(mesh.triangles().all(|t| winding_y(t) > 0.0));
    }

    #[test]
    fn test_last_column_sentinel_drops_its_triangles() {
        #[rustfmt::skip]
        let samples = [
            1, 1, S,
            1, 1, 1,
        ];
        let window = GridWindow::new(0, 0, 48, 32, 16);
        let mesh = flat_builder().build_from_samples(&window, &samples).unwrap();
        // Nothing to the right of the sentinel, so only the left quad remains.
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn test_all_sentinel_window_is_empty() {
        let window = GridWindow::new(0, 0, 64, 64, 16);
        let mesh = flat_builder().build_from_samples(&window, &[S; 16]).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_malformed_sample_count() {
        let window = GridWindow::new(0, 0, 64, 64, 16);
        let err = flat_builder().build_from_samples(&window, &[0; 15]).unwrap_err();
        assert!(matches!(
            err,
            GridError::MalformedGrid {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_invalid_window() {
        let window = GridWindow::new(0, 0, 100, 64, 16);
        let err = flat_builder().build_grid(&FailingSource, &window).unwrap_err();
        assert!(matches!(err, GridError::InvalidWindow { .. }));
    }

    #[test]
    fn test_fetch_failure_yields_no_mesh() {
        let window = GridWindow::new(0, 0, 64, 64, 16);
        let err = flat_builder().build_grid(&FailingSource, &window).unwrap_err();
        assert!(matches!(err, GridError::Fetch(FetchError::Unavailable(_))));
    }

    #[test]
    fn test_bound_proxy_lies_on_sphere() {
        let builder = ElevationGridBuilder::new(PlanetProfile::mars(), Projection::Spherical);
        let proxy = builder.build_chunk_bound_proxy(3, 2);
        assert_eq!(proxy.vertex_count(), 4);
        assert_eq!(proxy.triangle_count(), 2);
        let radius = PlanetProfile::mars().radius_render_units() as f32;
        for p in &proxy.positions {
            assert!((Vec3::from_array(*p).length() - radius).abs() < 1e-3);
        }
        assert!((builder.midpoint(3, 2).length() - radius).abs() < 1e-3);
    }

    #[test]
    fn test_flat_proxy_and_midpoint() {
        let builder = flat_builder();
        let proxy = builder.build_chunk_bound_proxy(1, 0);
        let chunk = PlanetProfile::mars().meters_per_chunk() as f32 / 10_000.0;
        let (min, max) = proxy.bounds().unwrap();
        assert!((min.x - chunk).abs() < 1e-3 && (max.x - 2.0 * chunk).abs() < 1e-3);
        assert!(min.z.abs() < 1e-6 && (max.z - chunk).abs() < 1e-3);
        let mid = builder.midpoint(1, 0);
        assert!((mid.x - 1.5 * chunk).abs() < 1e-3);
        assert!(proxy.triangles().all(|t| winding_y(t) > 0.0));
    }
}
