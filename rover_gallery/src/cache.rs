//! Photo cache keyed by photo ID
//!
//! Two tiers: a bounded in-memory cache weighted by payload size, and an
//! optional on-disk directory with one JPG file per photo. Disk failures are
//! logged and treated as misses.

use moka::sync::Cache;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Shared, immutable photo bytes
pub type PhotoData = Arc<Vec<u8>>;

/// Settings for [`PhotoCache`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on the total size of in-memory payloads
    pub capacity_bytes: u64,
    /// Drop in-memory entries not read for this long
    pub time_to_idle: Option<Duration>,
    /// Directory for the on-disk tier (disabled when `None`)
    pub disk_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 64 * 1024 * 1024,
            time_to_idle: None,
            disk_dir: None,
        }
    }
}

/// On-disk photo store: one `<photo id>.jpg` per photo in a single directory.
///
/// Files are written to a temporary name in the same directory and renamed
/// into place, so a reader never sees a partially written photo.
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) the store rooted at `root`
    pub fn new(root: &Path) -> Self {
        match std::fs::create_dir_all(root) {
            Ok(()) => log::info!("Photo cache directory: {:?}", root),
            Err(e) => log::warn!("Photo cache directory {:?} unavailable: {}", root, e),
        }
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, photo_id: i64) -> PathBuf {
        self.root.join(format!("{}.jpg", photo_id))
    }

    pub fn contains(&self, photo_id: i64) -> bool {
        self.file_for(photo_id).is_file()
    }

    pub fn get(&self, photo_id: i64) -> Option<Vec<u8>> {
        let bytes = std::fs::read(self.file_for(photo_id)).ok()?;
        log::debug!("Disk cache hit for photo {} ({} bytes)", photo_id, bytes.len());
        Some(bytes)
    }

    /// Atomically replace the stored photo
    pub fn insert(&self, photo_id: i64, bytes: &[u8]) {
        if let Err(e) = self.write_atomic(photo_id, bytes) {
            log::warn!("Failed to store photo {} on disk: {}", photo_id, e);
        }
    }

    fn write_atomic(&self, photo_id: i64, bytes: &[u8]) -> std::io::Result<()> {
        let mut staged = tempfile::NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged
            .persist(self.file_for(photo_id))
            .map_err(|e| e.error)?;
        log::debug!("Stored photo {} on disk", photo_id);
        Ok(())
    }

    pub fn remove(&self, photo_id: i64) {
        match std::fs::remove_file(self.file_for(photo_id)) {
            Ok(()) => log::debug!("Removed photo {} from disk", photo_id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove photo {} from disk: {}", photo_id, e),
        }
    }
}

/// Memory cache with an optional disk tier behind it
pub struct PhotoCache {
    memory: Cache<i64, PhotoData>,
    disk: Option<DiskCache>,
}

impl Default for PhotoCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl PhotoCache {
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.capacity_bytes)
            .weigher(|_id: &i64, data: &PhotoData| -> u32 {
                data.len().try_into().unwrap_or(u32::MAX)
            });
        if let Some(idle) = config.time_to_idle {
            builder = builder.time_to_idle(idle);
        }

        Self {
            memory: builder.build(),
            disk: config.disk_dir.as_deref().map(DiskCache::new),
        }
    }

    /// Look up a photo, promoting disk hits into memory
    pub fn get(&self, photo_id: i64) -> Option<PhotoData> {
        if let Some(data) = self.memory.get(&photo_id) {
            log::debug!("Memory cache hit for photo {}", photo_id);
            return Some(data);
        }

        let bytes = self.disk.as_ref()?.get(photo_id)?;
        let data = Arc::new(bytes);
        self.memory.insert(photo_id, Arc::clone(&data));
        Some(data)
    }

    /// Store a photo in memory and, when enabled, on disk
    pub fn put(&self, photo_id: i64, data: PhotoData) {
        self.store_on_disk(photo_id, &data);
        self.put_memory(photo_id, data);
    }

    pub fn put_memory(&self, photo_id: i64, data: PhotoData) {
        self.memory.insert(photo_id, data);
    }

    /// Write through to the disk tier only (blocking; no-op without one)
    pub fn store_on_disk(&self, photo_id: i64, data: &[u8]) {
        if let Some(disk) = &self.disk {
            disk.insert(photo_id, data);
        }
    }

    /// Forget a photo in both tiers
    pub fn remove(&self, photo_id: i64) {
        self.memory.invalidate(&photo_id);
        if let Some(disk) = &self.disk {
            disk.remove(photo_id);
        }
    }

    pub fn contains(&self, photo_id: i64) -> bool {
        self.memory.contains_key(&photo_id)
            || self.disk.as_ref().is_some_and(|d| d.contains(photo_id))
    }

    /// Number of in-memory entries (settles after pending maintenance runs)
    pub fn entry_count(&self) -> u64 {
        self.memory.run_pending_tasks();
        self.memory.entry_count()
    }

    /// Total in-memory payload size in bytes
    pub fn weighted_size(&self) -> u64 {
        self.memory.run_pending_tasks();
        self.memory.weighted_size()
    }

    /// Drop every in-memory entry; the disk tier is left alone
    pub fn invalidate_all(&self) {
        self.memory.invalidate_all();
    }

    pub fn disk(&self) -> Option<&DiskCache> {
        self.disk.as_ref()
    }
}
