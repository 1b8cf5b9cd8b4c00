//! Fetch, cache, display pipeline for grid cells
//!
//! A cache hit is returned synchronously. A miss spawns a tokio task that
//! fetches the photo, decodes it off the async workers, stores it in the cache
//! and sends a [`LoadedPhoto`] back to the UI side over an unbounded channel.
//! Duplicate requests for a photo already in flight are folded into the
//! existing fetch, and fetches for cells that scrolled offscreen can be
//! cancelled.

use crate::cache::{PhotoCache, PhotoData};
use image::DynamicImage;
use log::{debug, info, warn};
use rover_api::{MarsRoverClient, PhotoReference};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

/// Settings for [`PhotoPipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of photo downloads running at once
    pub max_concurrent_fetches: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 5,
        }
    }
}

/// Message sent from background fetch tasks to the UI side
#[derive(Debug, Clone)]
pub struct LoadedPhoto {
    /// Grid index the photo was requested for
    pub index: usize,
    pub photo_id: i64,
    pub data: PhotoData,
    /// Already decoded; only photos that decode are ever sent
    pub image: DynamicImage,
}

struct InFlight {
    ticket: u64,
    /// Every cell waiting for this photo
    indices: BTreeSet<usize>,
    handle: JoinHandle<()>,
}

/// State shared between the pipeline and its fetch tasks
struct Shared {
    client: Arc<MarsRoverClient>,
    cache: Arc<PhotoCache>,
    in_flight: Mutex<HashMap<i64, InFlight>>,
    idle: Notify,
    sender: UnboundedSender<LoadedPhoto>,
}

impl Shared {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<i64, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_if_idle(&self, in_flight: &HashMap<i64, InFlight>) {
        if in_flight.is_empty() {
            self.idle.notify_waiters();
        }
    }

    /// Drop the entry for `photo_id` if it still belongs to `ticket`
    fn finish(&self, photo_id: i64, ticket: u64) {
        let mut in_flight = self.lock_in_flight();
        if in_flight.get(&photo_id).is_some_and(|e| e.ticket == ticket) {
            in_flight.remove(&photo_id);
        }
        self.notify_if_idle(&in_flight);
    }
}

pub struct PhotoPipeline {
    shared: Arc<Shared>,
    runtime: Handle,
    semaphore: Arc<Semaphore>,
    next_ticket: AtomicU64,
}

impl PhotoPipeline {
    /// Create a pipeline spawning onto `runtime`; the receiver is the UI side
    pub fn new(
        client: Arc<MarsRoverClient>,
        cache: Arc<PhotoCache>,
        config: &PipelineConfig,
        runtime: Handle,
    ) -> (Self, UnboundedReceiver<LoadedPhoto>) {
        let (sender, receiver) = unbounded_channel();
        let pipeline = Self {
            shared: Arc::new(Shared {
                client,
                cache,
                in_flight: Mutex::new(HashMap::new()),
                idle: Notify::new(),
                sender,
            }),
            runtime,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            next_ticket: AtomicU64::new(0),
        };
        (pipeline, receiver)
    }

    pub fn cache(&self) -> &Arc<PhotoCache> {
        &self.shared.cache
    }

    /// Request the photo for a grid cell.
    ///
    /// Returns the cached bytes on a hit. On a miss, starts a fetch (or adds
    /// `index` to the one already running for this photo) and returns `None`;
    /// the result arrives later as one [`LoadedPhoto`] per requesting index.
    pub fn request(&self, index: usize, photo: &PhotoReference) -> Option<PhotoData> {
        if let Some(data) = self.shared.cache.get(photo.id) {
            return Some(data);
        }
        self.fetch(index, photo);
        None
    }

    /// Start a fetch for `photo` without consulting the cache
    pub fn fetch(&self, index: usize, photo: &PhotoReference) {
        let mut in_flight = self.shared.lock_in_flight();
        if let Some(entry) = in_flight.get_mut(&photo.id) {
            debug!(
                "Photo {} already in flight, adding index {}",
                photo.id, index
            );
            entry.indices.insert(index);
            return;
        }

        debug!(
            "Photo cache MISS for {} at index {} - spawning fetch task",
            photo.id, index
        );

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        // The entry is inserted before the lock is released, so the task
        // always finds it unless it was cancelled.
        let handle = self.runtime.spawn(Self::fetch_task(
            Arc::clone(&self.shared),
            Arc::clone(&self.semaphore),
            photo.clone(),
            ticket,
        ));
        in_flight.insert(
            photo.id,
            InFlight {
                ticket,
                indices: BTreeSet::from([index]),
                handle,
            },
        );
    }

    async fn fetch_task(
        shared: Arc<Shared>,
        semaphore: Arc<Semaphore>,
        photo: PhotoReference,
        ticket: u64,
    ) {
        let photo_id = photo.id;
        let result = match semaphore.acquire_owned().await {
            Ok(_permit) => shared.client.fetch_photo_data(&photo).await,
            Err(_) => return,
        };

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch photo {}: {}", photo_id, e);
                shared.finish(photo_id, ticket);
                return;
            }
        };

        // Decoding and the disk write both block, keep them off the async
        // workers and outside the in-flight lock
        let cache = Arc::clone(&shared.cache);
        let stored = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
            let data = Arc::new(bytes);
            cache.store_on_disk(photo_id, &data);
            Ok::<_, String>((data, image))
        })
        .await;

        let (data, image) = match stored {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(e)) => {
                warn!("Photo {} is not a decodable image, not caching: {}", photo_id, e);
                shared.finish(photo_id, ticket);
                return;
            }
            Err(e) => {
                warn!("Decode task for photo {} failed: {}", photo_id, e);
                shared.finish(photo_id, ticket);
                return;
            }
        };

        let mut in_flight = shared.lock_in_flight();
        let indices = match in_flight.get(&photo_id) {
            Some(entry) if entry.ticket == ticket => entry.indices.clone(),
            _ => {
                debug!("Fetch for photo {} was cancelled", photo_id);
                return;
            }
        };

        shared.cache.put_memory(photo_id, Arc::clone(&data));
        for index in indices {
            let loaded = LoadedPhoto {
                index,
                photo_id,
                data: Arc::clone(&data),
                image: image.clone(),
            };
            if shared.sender.send(loaded).is_err() {
                debug!("Display receiver dropped, discarding photo {}", photo_id);
                break;
            }
        }

        in_flight.remove(&photo_id);
        shared.notify_if_idle(&in_flight);
    }

    /// Drop offscreen indices from in-flight fetches; abort fetches left with
    /// no visible index
    pub fn cancel_offscreen(&self, visible: &HashSet<usize>) -> usize {
        let mut in_flight = self.shared.lock_in_flight();
        let mut offscreen = Vec::new();
        for (id, entry) in in_flight.iter_mut() {
            entry.indices.retain(|index| visible.contains(index));
            if entry.indices.is_empty() {
                offscreen.push(*id);
            }
        }

        for id in &offscreen {
            if let Some(entry) = in_flight.remove(id) {
                entry.handle.abort();
            }
        }
        self.shared.notify_if_idle(&in_flight);

        if !offscreen.is_empty() {
            debug!("Cancelled {} offscreen photo fetches", offscreen.len());
        }
        offscreen.len()
    }

    /// Abort every in-flight fetch
    pub fn cancel_all(&self) -> usize {
        let mut in_flight = self.shared.lock_in_flight();
        let cancelled = in_flight.len();
        for (_, entry) in in_flight.drain() {
            entry.handle.abort();
        }
        self.shared.notify_if_idle(&in_flight);

        if cancelled > 0 {
            info!("Cancelled {} photo fetches", cancelled);
        }
        cancelled
    }

    /// Number of fetches currently running or waiting for a permit
    pub fn in_flight(&self) -> usize {
        self.shared.lock_in_flight().len()
    }

    pub fn is_in_flight(&self, photo_id: i64) -> bool {
        self.shared.lock_in_flight().contains_key(&photo_id)
    }

    /// Wait until no fetch is in flight
    pub async fn drain(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for PhotoPipeline {
    fn drop(&mut self) {
        for (_, entry) in self.shared.lock_in_flight().drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
