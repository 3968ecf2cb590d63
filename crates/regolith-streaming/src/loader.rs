//! Background chunk loading.
//!
//! A fixed pool of named worker threads pulls [`LoadJob`]s from a bounded
//! queue, performs the single elevation fetch and the mesh build, and sends a
//! [`LoadOutcome`] back. Outcomes are applied by whoever owns the chunk
//! records; workers never touch shared chunk state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use regolith_elevation::ElevationSource;
use regolith_mesh::{ElevationGridBuilder, GridError, GridWindow, TerrainMesh};

use crate::ChunkKey;

/// Thread pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamingOptions {
    /// Worker threads; `0` picks a count from the CPU cores.
    pub worker_threads: usize,
    /// Maximum queued jobs before submissions are rejected.
    pub queue_capacity: usize,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            queue_capacity: 256,
        }
    }
}

impl StreamingOptions {
    /// Resolved worker count, leaving headroom for the render and main threads.
    pub fn thread_count(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            num_cpus::get().saturating_sub(2).max(1)
        }
    }
}

/// A request to fetch and mesh one chunk window.
#[derive(Clone, Debug)]
pub struct LoadJob {
    pub key: ChunkKey,
    pub stride: u32,
    /// Manager epoch at submission.
    pub epoch: u64,
    pub window: GridWindow,
    pub builder: Arc<ElevationGridBuilder>,
}

/// The result of a [`LoadJob`].
#[derive(Debug)]
pub struct LoadOutcome {
    pub key: ChunkKey,
    pub stride: u32,
    pub epoch: u64,
    pub result: Result<TerrainMesh, GridError>,
    /// Fetch plus build time in microseconds.
    pub elapsed_us: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to spawn chunk loader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Worker pool executing [`LoadJob`]s against one elevation source.
pub struct ChunkLoader {
    job_sender: Sender<LoadJob>,
    outcome_receiver: Receiver<LoadOutcome>,
    in_flight: Arc<AtomicUsize>,
    threads: usize,
}

impl ChunkLoader {
    pub fn new(
        source: Arc<dyn ElevationSource>,
        options: StreamingOptions,
    ) -> Result<Self, LoaderError> {
        let (job_sender, job_receiver) = bounded::<LoadJob>(options.queue_capacity.max(1));
        let (outcome_sender, outcome_receiver) = unbounded::<LoadOutcome>();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let threads = options.thread_count();

        for index in 0..threads {
            let receiver = job_receiver.clone();
            let sender = outcome_sender.clone();
            let source = Arc::clone(&source);
            let in_flight = Arc::clone(&in_flight);

            std::thread::Builder::new()
                .name(format!("chunk-loader-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let start = Instant::now();
                        let result = job.builder.build_grid(source.as_ref(), &job.window);
                        let outcome = LoadOutcome {
                            key: job.key,
                            stride: job.stride,
                            epoch: job.epoch,
                            result,
                            elapsed_us: start.elapsed().as_micros() as u64,
                        };
                        in_flight.fetch_sub(1, Ordering::AcqRel);
                        if sender.send(outcome).is_err() {
                            break;
                        }
                    }
                })?;
        }
        tracing::debug!(threads, capacity = options.queue_capacity, "chunk loader started");

        Ok(Self {
            job_sender,
            outcome_receiver,
            in_flight,
            threads,
        })
    }

    /// Queue a job. Returns the job back if the queue is full.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, job: LoadJob) -> Result<(), LoadJob> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.job_sender.try_send(job).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            match e {
                TrySendError::Full(job) | TrySendError::Disconnected(job) => job,
            }
        })
    }

    /// Drain all finished outcomes without blocking.
    pub fn drain(&self) -> Vec<LoadOutcome> {
        self.outcome_receiver.try_iter().collect()
    }

    /// Jobs queued or executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use regolith_elevation::RasterElevationSource;
    use regolith_geo::{PlanetProfile, Projection};

    use super::*;

    fn job(x: u32, epoch: u64) -> LoadJob {
        let profile = PlanetProfile::with_chunking("T", "t", 10.0, 256, 128, 1000.0, 64, 16);
        LoadJob {
            key: ChunkKey::new(x, 0),
            stride: 16,
            epoch,
            window: GridWindow::new(x * 64, 0, 64, 64, 16),
            builder: Arc::new(ElevationGridBuilder::new(profile, Projection::Flat)),
        }
    }

    fn collect(loader: &ChunkLoader, n: usize) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while outcomes.len() < n && Instant::now() < deadline {
            outcomes.extend(loader.drain());
            std::thread::sleep(Duration::from_millis(2));
        }
        outcomes
    }

    #[test]
    fn test_outcomes_carry_job_identity() {
        let source = Arc::new(RasterElevationSource::from_fn(256, 128, |_, _| 5));
        let options = StreamingOptions {
            worker_threads: 2,
            queue_capacity: 8,
        };
        let loader = ChunkLoader::new(source, options).unwrap();
        assert_eq!(loader.threads(), 2);
        for x in 0..4 {
            assert!(loader.submit(job(x, 7)).is_ok());
        }

        let mut outcomes = collect(&loader, 4);
        outcomes.sort_by_key(|o| o.key);
        assert_eq!(outcomes.len(), 4);
        for (x, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.key, ChunkKey::new(x as u32, 0));
            assert_eq!(outcome.epoch, 7);
            let mesh = outcome.result.as_ref().unwrap();
            assert_eq!(mesh.triangle_count(), 18);
        }
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn test_default_thread_count_is_positive() {
        assert!(StreamingOptions::default().thread_count() >= 1);
    }
}
