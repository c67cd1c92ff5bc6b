//! Background decode pool warming the shared content cache.
//!
//! - Bounded worker pool decoding file-backed items for neighbouring pages
//! - Generation counter so a selection change invalidates queued work
//! - Workers insert straight into the shared cache; controllers then hit
//!   it on `request_load` without touching their source

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::Receiver;
use tracing::{debug, trace, warn};

use crate::cache::{CacheKey, SharedContentCache};
use crate::image_loader;

/// Default number of decode workers.
const DEFAULT_WORKERS: usize = 2;

/// Maximum number of decode workers.
const MAX_WORKERS: usize = 4;

/// Maximum pending requests before new ones are dropped.
const MAX_QUEUE_SIZE: usize = 256;

struct PrefetchWorkItem {
    path: PathBuf,
    generation: u64,
}

/// Warms the content cache for slideshow items near the current page.
pub struct Prefetcher {
    request_tx: flume::Sender<PrefetchWorkItem>,
    generation: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    cache: SharedContentCache,
}

impl Prefetcher {
    pub fn new(cache: SharedContentCache) -> Self {
        Self::with_workers(cache, DEFAULT_WORKERS)
    }

    pub fn with_workers(cache: SharedContentCache, workers: usize) -> Self {
        let num_workers = workers.clamp(1, MAX_WORKERS);
        let (request_tx, request_rx) = flume::bounded::<PrefetchWorkItem>(MAX_QUEUE_SIZE);
        let generation = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let rx = request_rx.clone();
            let generation = Arc::clone(&generation);
            let shutdown = Arc::clone(&shutdown);
            let cache = Arc::clone(&cache);
            let handle = thread::Builder::new()
                .name(format!("prefetch-worker-{}", worker_id))
                .spawn(move || worker_loop(rx, generation, shutdown, cache))
                .expect("Failed to spawn prefetch worker");
            handles.push(handle);
        }

        debug!(num_workers, "Started prefetch pool");

        Self {
            request_tx,
            generation,
            shutdown,
            workers: handles,
            cache,
        }
    }

    /// Replace the pending work set with the given paths. A newer call
    /// invalidates anything still queued from an older one.
    pub fn queue(&self, paths: Vec<PathBuf>) -> usize {
        if paths.is_empty() {
            return 0;
        }

        let generation = self
            .generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);

        let mut submitted = 0;
        for path in paths {
            if self.cache.lock().contains(&CacheKey::File(path.clone())) {
                continue;
            }
            match self.request_tx.try_send(PrefetchWorkItem { path, generation }) {
                Ok(()) => submitted += 1,
                Err(flume::TrySendError::Full(_)) => {
                    warn!("prefetch queue full, dropping remaining requests");
                    break;
                }
                Err(flume::TrySendError::Disconnected(_)) => break,
            }
        }
        submitted
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("Prefetch pool shutdown complete");
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn worker_loop(
    rx: Receiver<PrefetchWorkItem>,
    generation: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    cache: SharedContentCache,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let work = match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(work) => work,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        };

        if work.generation != generation.load(Ordering::Acquire) {
            trace!("skipping stale prefetch for {:?}", work.path);
            continue;
        }

        let key = CacheKey::File(work.path.clone());
        if cache.lock().contains(&key) {
            continue;
        }

        let decoded = match image_loader::open_image(&work.path) {
            Ok(image) => image,
            Err(err) => {
                debug!("prefetch decode failed for {:?}: {:#}", work.path, err);
                continue;
            }
        };

        // Selection may have moved on while we decoded.
        if work.generation != generation.load(Ordering::Acquire) {
            continue;
        }

        cache.lock().insert(key, Arc::new(decoded));
    }
}
