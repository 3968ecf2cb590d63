//! Chunk manager: visibility, level of detail and the load/replace/dispose
//! lifecycle of every chunk of the active planet.
//!
//! All chunk state lives on the thread that owns the manager. Loads run on a
//! [`ChunkLoader`] pool; their outcomes are applied in [`ChunkManager::poll`],
//! which is the only place meshes enter the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};
use glam::Vec3;
use regolith_elevation::ElevationSource;
use regolith_geo::{LatLongAlt, PlanetProfile, Projection};
use regolith_mesh::{ElevationGridBuilder, GridError, GridWindow, TerrainMesh};

use crate::chunk::{InFlight, LoadedMesh};
use crate::{
    Aabb, Camera, ChunkKey, ChunkLoader, ChunkRecord, ChunkState, Frustum, LoadJob, LoadOutcome,
    LoaderError, MeshId, MeshRegistry, Ray, StreamingOptions, ViewChangeNotifier, intersect_mesh,
    sample_stride,
};

/// A chunk load that failed. The chunk is back to [`ChunkState::Empty`], or
/// [`ChunkState::Stale`] if it still shows an older mesh.
#[derive(Debug)]
pub struct LoadFailure {
    pub key: ChunkKey,
    pub stride: u32,
    pub error: GridError,
}

/// Nearest intersection with a loaded chunk mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub key: ChunkKey,
    /// Parametric distance along the ray.
    pub distance: f32,
    pub point: Vec3,
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub total: usize,
    pub empty: usize,
    pub loading: usize,
    pub ready: usize,
    pub stale: usize,
    /// Chunks waiting for space in the loader queue.
    pub deferred: usize,
    /// Chunks selected by the latest visibility pass.
    pub visible: usize,
    /// Stride chosen by the latest visibility pass.
    pub stride: u32,
    pub epoch: u64,
}

/// Proxy mesh and its precomputed bounds for one chunk.
struct ChunkBounds {
    proxy: TerrainMesh,
    aabb: Option<Aabb>,
    midpoint: Vec3,
}

pub struct ChunkManager {
    builder: Arc<ElevationGridBuilder>,
    loader: ChunkLoader,
    records: Vec<ChunkRecord>,
    bounds: Vec<ChunkBounds>,
    epoch: u64,
    next_mesh_id: u64,
    view_sender: Sender<()>,
    view_changes: Receiver<()>,
    /// Run a visibility pass on the next `update` even without a notification.
    dirty: bool,
    visible: usize,
    stride: u32,
}

impl ChunkManager {
    pub fn new(
        profile: PlanetProfile,
        projection: Projection,
        source: Arc<dyn ElevationSource>,
        options: StreamingOptions,
    ) -> Result<Self, LoaderError> {
        let loader = ChunkLoader::new(source, options)?;
        let (view_sender, view_changes) = bounded(1);
        let builder = Arc::new(ElevationGridBuilder::new(profile, projection));
        let mut manager = Self {
            stride: builder.profile().global_stride,
            builder,
            loader,
            records: Vec::new(),
            bounds: Vec::new(),
            epoch: 0,
            next_mesh_id: 0,
            view_sender,
            view_changes,
            dirty: true,
            visible: 0,
        };
        manager.reset_records();
        manager.rebuild_bounds();
        Ok(manager)
    }

    pub fn profile(&self) -> &PlanetProfile {
        self.builder.profile()
    }

    pub fn projection(&self) -> Projection {
        self.builder.projection()
    }

    /// Current epoch; bumped by every reload.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// A throttled notifier feeding this manager's view-change channel.
    pub fn view_notifier(&self, min_interval: Duration) -> ViewChangeNotifier {
        ViewChangeNotifier::new(self.view_sender.clone(), min_interval)
    }

    pub fn record(&self, key: ChunkKey) -> Option<&ChunkRecord> {
        self.index_of(key).map(|i| &self.records[i])
    }

    /// The culling proxy of a chunk.
    pub fn bound_proxy(&self, key: ChunkKey) -> Option<&TerrainMesh> {
        self.index_of(key).map(|i| &self.bounds[i].proxy)
    }

    /// Per-frame entry point: re-evaluate visibility if the view changed,
    /// then apply finished loads.
    pub fn update(
        &mut self,
        camera: &Camera,
        registry: &mut dyn MeshRegistry,
    ) -> Vec<LoadFailure> {
        let notified = self.view_changes.try_iter().count() > 0;
        if notified || self.dirty {
            self.dirty = false;
            self.visibility_pass(camera, registry);
        }
        self.poll(registry)
    }

    /// Swap the projection and reload everything under it.
    pub fn set_projection(
        &mut self,
        projection: Projection,
        camera: &Camera,
        registry: &mut dyn MeshRegistry,
    ) {
        let profile = self.builder.profile().clone();
        self.builder = Arc::new(ElevationGridBuilder::new(profile, projection));
        self.reload(camera, registry);
    }

    /// Switch to another planet and reload everything for it.
    pub fn set_planet(
        &mut self,
        profile: PlanetProfile,
        camera: &Camera,
        registry: &mut dyn MeshRegistry,
    ) {
        let projection = self.builder.projection();
        let resized = profile.chunk_width() != self.profile().chunk_width()
            || profile.chunk_height() != self.profile().chunk_height();
        self.builder = Arc::new(ElevationGridBuilder::new(profile, projection));
        if resized {
            // In-flight results for the old grid are recognised by epoch.
            for record in &mut self.records {
                if let Some(loaded) = record.loaded.take() {
                    registry.remove_mesh(loaded.id);
                }
            }
            self.reset_records();
        }
        self.reload(camera, registry);
    }

    /// Rebuild the chunk proxies, dispose every loaded mesh and reload the
    /// visible set. Loads still in flight are discarded when they finish.
    pub fn reload(&mut self, camera: &Camera, registry: &mut dyn MeshRegistry) {
        self.epoch += 1;
        self.rebuild_bounds();
        let mut disposed = 0;
        for record in &mut self.records {
            if let Some(loaded) = record.loaded.take() {
                registry.remove_mesh(loaded.id);
                disposed += 1;
            }
            record.dispose_pending = false;
            if record.state != ChunkState::Loading {
                record.state = ChunkState::Empty;
            }
        }
        tracing::info!(
            planet = %self.profile().name,
            projection = ?self.projection(),
            epoch = self.epoch,
            disposed,
            "reloading terrain"
        );
        self.dirty = false;
        self.visibility_pass(camera, registry);
    }

    /// Request chunk `(x, z)` at `stride`.
    ///
    /// No-op if a load for the chunk is already in flight or the chunk is
    /// ready at that stride. Returns `true` if a job was submitted.
    pub fn load(&mut self, x: u32, z: u32, stride: u32) -> bool {
        let key = ChunkKey::new(x, z);
        let Some(index) = self.index_of(key) else {
            return false;
        };
        let record = &mut self.records[index];
        match record.state {
            ChunkState::Loading => {
                record.deferred = false;
                return false;
            }
            ChunkState::Ready if record.mesh_stride() == Some(stride) => {
                record.deferred = false;
                return false;
            }
            ChunkState::Ready => record.state = ChunkState::Stale,
            ChunkState::Empty | ChunkState::Stale => {}
        }

        let job = LoadJob {
            key,
            stride,
            epoch: self.epoch,
            window: self.chunk_window(x, z, stride),
            builder: Arc::clone(&self.builder),
        };
        match self.loader.submit(job) {
            Ok(()) => {
                let record = &mut self.records[index];
                record.state = ChunkState::Loading;
                record.deferred = false;
                record.in_flight = Some(InFlight {
                    stride,
                    epoch: self.epoch,
                });
                tracing::debug!(%key, stride, epoch = self.epoch, "chunk load submitted");
                true
            }
            Err(_) => {
                // Resubmitted from `poll` once workers free up queue slots.
                self.records[index].deferred = true;
                tracing::debug!(%key, stride, "load queue full, deferring chunk");
                false
            }
        }
    }

    /// The raster window loaded for a chunk at `stride`: the chunk footprint,
    /// extended by one stride towards the previous column and row so adjacent
    /// meshes share an edge, and by one stride past the raster's last column
    /// and row.
    pub fn chunk_window(&self, x: u32, z: u32, stride: u32) -> GridWindow {
        let profile = self.profile();
        let size = profile.chunk_size_pixels;
        let mut window = GridWindow::new(x * size, z * size, size, size, stride);
        if x > 0 {
            window.x -= stride;
            window.width += stride;
        }
        if z > 0 {
            window.z -= stride;
            window.height += stride;
        }
        if x + 1 == profile.chunk_width() {
            window.width += stride;
        }
        if z + 1 == profile.chunk_height() {
            window.height += stride;
        }
        window
    }

    /// Apply every finished load, then resubmit deferred chunks. Returns the
    /// failures among the finished loads.
    pub fn poll(&mut self, registry: &mut dyn MeshRegistry) -> Vec<LoadFailure> {
        let mut failures = Vec::new();
        for outcome in self.loader.drain() {
            if let Some(failure) = self.apply_outcome(outcome, registry) {
                failures.push(failure);
            }
        }
        self.submit_deferred();
        failures
    }

    /// Poll until no chunk is loading or `timeout` elapses.
    pub fn wait_idle(
        &mut self,
        registry: &mut dyn MeshRegistry,
        timeout: Duration,
    ) -> Vec<LoadFailure> {
        let deadline = Instant::now() + timeout;
        let mut failures = self.poll(registry);
        while !self.is_idle() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
            failures.extend(self.poll(registry));
        }
        failures
    }

    /// Returns `true` if no load is in flight or waiting for queue space.
    pub fn is_idle(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.in_flight.is_none() && !r.deferred)
    }

    /// Geographic coordinates of a rendering-space point.
    pub fn pick(&self, point: Vec3) -> LatLongAlt {
        let profile = self.profile();
        let meters = point.as_dvec3() * profile.meters_per_render_unit;
        self.projection().lat_long_alt(meters, profile.radius_meters)
    }

    /// Nearest hit on any loaded chunk mesh.
    pub fn raycast_loaded(&self, ray: &Ray) -> Option<RayHit> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let loaded = record.loaded.as_ref()?;
                let distance = intersect_mesh(ray, &loaded.mesh)?;
                Some(RayHit {
                    key: self.key_of(index),
                    distance,
                    point: ray.at(distance),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn stats(&self) -> ChunkStats {
        let mut stats = ChunkStats {
            total: self.records.len(),
            visible: self.visible,
            stride: self.stride,
            epoch: self.epoch,
            ..ChunkStats::default()
        };
        for record in &self.records {
            match record.state {
                ChunkState::Empty => stats.empty += 1,
                ChunkState::Loading => stats.loading += 1,
                ChunkState::Ready => stats.ready += 1,
                ChunkState::Stale => stats.stale += 1,
            }
            if record.deferred {
                stats.deferred += 1;
            }
        }
        stats
    }

    fn visibility_pass(&mut self, camera: &Camera, registry: &mut dyn MeshRegistry) {
        let start = Instant::now();
        let visible = self.visible_chunks(camera);
        let stride = sample_stride(self.profile(), visible.len());
        self.visible = visible.len();
        self.stride = stride;

        let mut wanted = vec![false; self.records.len()];
        for &index in &visible {
            wanted[index] = true;
        }

        let mut disposed = 0;
        for (index, record) in self.records.iter_mut().enumerate() {
            record.wanted = wanted[index];
            if record.wanted {
                record.desired_stride = stride;
                record.dispose_pending = false;
            } else if record.state == ChunkState::Loading {
                record.deferred = false;
                record.dispose_pending = true;
            } else {
                record.deferred = false;
                if let Some(loaded) = record.loaded.take() {
                    registry.remove_mesh(loaded.id);
                    disposed += 1;
                }
                record.state = ChunkState::Empty;
            }
        }

        let mut requested = 0;
        for &index in &visible {
            let key = self.key_of(index);
            if self.load(key.x, key.z, stride) {
                requested += 1;
            }
        }

        tracing::debug!(
            visible = visible.len(),
            stride,
            requested,
            disposed,
            elapsed_us = start.elapsed().as_micros() as u64,
            "visibility pass"
        );
    }

    /// Indices of chunks inside the frustum and, on curved projections, not
    /// hidden behind other chunks.
    fn visible_chunks(&self, camera: &Camera) -> Vec<usize> {
        let frustum = Frustum::from_view_projection(&camera.view_projection_matrix());
        let occlusion = self.projection().is_curved();
        (0..self.bounds.len())
            .filter(|&index| {
                self.bounds[index]
                    .aabb
                    .is_some_and(|aabb| frustum.is_visible(&aabb))
            })
            .filter(|&index| !occlusion || !self.is_occluded(index, camera.position))
            .collect()
    }

    /// Cast a ray from `eye` through the chunk's midpoint against every proxy.
    /// The chunk is occluded if the first proxy hit belongs to another chunk
    /// and lies before the midpoint.
    fn is_occluded(&self, index: usize, eye: Vec3) -> bool {
        let ray = Ray::through(eye, self.bounds[index].midpoint);
        if ray.direction.length_squared() <= f32::EPSILON {
            return false;
        }
        let nearest = self
            .bounds
            .iter()
            .enumerate()
            .filter_map(|(other, bounds)| intersect_mesh(&ray, &bounds.proxy).map(|t| (other, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match nearest {
            None => false,
            Some((other, t)) => other != index && t < 1.0,
        }
    }

    fn apply_outcome(
        &mut self,
        outcome: LoadOutcome,
        registry: &mut dyn MeshRegistry,
    ) -> Option<LoadFailure> {
        let LoadOutcome {
            key,
            stride,
            epoch,
            result,
            elapsed_us,
        } = outcome;
        let expected = Some(InFlight { stride, epoch });
        let index = self
            .index_of(key)
            .filter(|&i| self.records[i].in_flight == expected)?;

        let record = &mut self.records[index];
        record.in_flight = None;

        if epoch != self.epoch {
            record.state = ChunkState::Empty;
            record.dispose_pending = false;
            let (wanted, desired) = (record.wanted, record.desired_stride);
            tracing::debug!(%key, epoch, current = self.epoch, "discarding load from previous epoch");
            if wanted {
                self.load(key.x, key.z, desired);
            }
            return None;
        }

        if record.dispose_pending {
            record.dispose_pending = false;
            record.state = ChunkState::Empty;
            if let Some(old) = record.loaded.take() {
                registry.remove_mesh(old.id);
            }
            tracing::debug!(%key, "discarding load for a chunk that left the view");
            return None;
        }

        match result {
            Ok(mesh) => {
                let id = MeshId(self.next_mesh_id);
                self.next_mesh_id += 1;
                let mesh = Arc::new(mesh);
                tracing::debug!(
                    %key,
                    stride,
                    triangles = mesh.triangle_count(),
                    elapsed_us,
                    "chunk ready"
                );
                registry.add_mesh(id, Arc::clone(&mesh));

                let record = &mut self.records[index];
                let previous = record.loaded.replace(LoadedMesh { id, stride, mesh });
                if let Some(old) = previous {
                    registry.remove_mesh(old.id);
                }
                record.state = ChunkState::Ready;
                let (wanted, desired) = (record.wanted, record.desired_stride);
                if wanted && desired != stride {
                    self.load(key.x, key.z, desired);
                }
                None
            }
            Err(error) => {
                record.state = if record.loaded.is_some() {
                    ChunkState::Stale
                } else {
                    ChunkState::Empty
                };
                tracing::warn!(%key, stride, %error, "chunk load failed");
                Some(LoadFailure { key, stride, error })
            }
        }
    }

    /// Resubmit chunks that found the loader queue full, stopping as soon as
    /// it fills up again.
    fn submit_deferred(&mut self) {
        for index in 0..self.records.len() {
            let record = &mut self.records[index];
            if !record.deferred {
                continue;
            }
            if !record.wanted {
                record.deferred = false;
                continue;
            }
            let stride = record.desired_stride;
            let key = self.key_of(index);
            if !self.load(key.x, key.z, stride) && self.records[index].deferred {
                break;
            }
        }
    }

    fn reset_records(&mut self) {
        let profile = self.builder.profile();
        let count = (profile.chunk_width() * profile.chunk_height()) as usize;
        self.records = vec![ChunkRecord::default(); count];
    }

    fn rebuild_bounds(&mut self) {
        let profile = self.builder.profile();
        let mut bounds = Vec::with_capacity(self.records.len());
        for z in 0..profile.chunk_height() {
            for x in 0..profile.chunk_width() {
                let proxy = self.builder.build_chunk_bound_proxy(x, z);
                let aabb = proxy.bounds().map(|(min, max)| Aabb::new(min, max));
                bounds.push(ChunkBounds {
                    proxy,
                    aabb,
                    midpoint: self.builder.midpoint(x, z),
                });
            }
        }
        self.bounds = bounds;
    }

    fn index_of(&self, key: ChunkKey) -> Option<usize> {
        let profile = self.profile();
        let (width, height) = (profile.chunk_width(), profile.chunk_height());
        (key.x < width && key.z < height).then(|| (key.z * width + key.x) as usize)
    }

    fn key_of(&self, index: usize) -> ChunkKey {
        let width = self.profile().chunk_width() as usize;
        ChunkKey::new((index % width) as u32, (index / width) as u32)
    }
}
