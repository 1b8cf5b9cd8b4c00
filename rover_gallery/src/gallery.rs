//! Gallery screen model
//!
//! Loads a rover once, selects one of its sols and exposes that sol's photos
//! as grid cells. Cell images come from the [`PhotoPipeline`]; completed
//! fetches are applied in [`PhotoGallery::poll_loaded`], on the thread that
//! owns the grid.

use crate::cache::PhotoCache;
use crate::error::{GalleryError, Result};
use crate::grid::PhotoGrid;
use crate::pipeline::{LoadedPhoto, PhotoPipeline, PipelineConfig};
use image::DynamicImage;
use log::{debug, info, warn};
use rover_api::{MarsRover, MarsRoverClient, PhotoReference, SolDescription};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

/// Which rover and sol to open
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub rover: String,
    /// Position in the rover's sol listing
    pub sol_index: usize,
    /// Open this sol number instead of `sol_index`
    pub sol: Option<u32>,
    pub pipeline: PipelineConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            rover: "curiosity".to_string(),
            sol_index: 100,
            sol: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// What a grid cell shows right now
pub struct CellContent<'a> {
    pub photo: &'a PhotoReference,
    /// Present when the photo was already cached
    pub image: Option<DynamicImage>,
}

pub struct PhotoGallery {
    client: Arc<MarsRoverClient>,
    pipeline: PhotoPipeline,
    receiver: UnboundedReceiver<LoadedPhoto>,
    rover: MarsRover,
    sol_index: usize,
    photos: Vec<PhotoReference>,
}

impl PhotoGallery {
    /// Fetch the rover and the photos of the configured sol, then reload `grid`
    pub async fn load<G: PhotoGrid>(
        client: Arc<MarsRoverClient>,
        cache: Arc<PhotoCache>,
        config: &GalleryConfig,
        grid: &mut G,
    ) -> Result<Self> {
        let rover = client.fetch_mars_rover(&config.rover).await?;
        info!(
            "Loaded rover {} ({} sols with photos, max sol {})",
            rover.name,
            rover.sol_descriptions.len(),
            rover.max_sol
        );

        let (pipeline, receiver) = PhotoPipeline::new(
            Arc::clone(&client),
            cache,
            &config.pipeline,
            Handle::current(),
        );

        let mut gallery = Self {
            client,
            pipeline,
            receiver,
            rover,
            sol_index: config.sol_index,
            photos: Vec::new(),
        };
        match config.sol {
            Some(sol) => gallery.select_sol_number(sol, grid).await?,
            None => gallery.select_sol(config.sol_index, grid).await?,
        }
        Ok(gallery)
    }

    /// Like [`select_sol`](Self::select_sol), by sol number rather than
    /// listing position
    pub async fn select_sol_number<G: PhotoGrid>(&mut self, sol: u32, grid: &mut G) -> Result<()> {
        let index = self
            .rover
            .sol_index_of(sol)
            .ok_or(GalleryError::SolNotFound {
                sol,
                max_sol: self.rover.max_sol,
            })?;
        self.select_sol(index, grid).await
    }

    /// Switch to another sol: re-fetch the photo list and reload the grid.
    ///
    /// On error the current photo list is kept.
    pub async fn select_sol<G: PhotoGrid>(&mut self, sol_index: usize, grid: &mut G) -> Result<()> {
        let sol = self
            .rover
            .sol_description(sol_index)
            .ok_or(GalleryError::NoSolDescription {
                index: sol_index,
                available: self.rover.sol_descriptions.len(),
            })?
            .sol;

        let photos = self.client.fetch_photos(&self.rover, sol).await?;
        info!(
            "Sol {} ({}): {} photos",
            sol,
            self.rover.name,
            photos.len()
        );

        self.pipeline.cancel_all();
        // Updates still queued belong to the previous photo list
        while self.receiver.try_recv().is_ok() {}

        self.sol_index = sol_index;
        self.photos = photos;
        grid.reload(self.photos.len());
        Ok(())
    }

    pub fn rover(&self) -> &MarsRover {
        &self.rover
    }

    pub fn sol_description(&self) -> Option<&SolDescription> {
        self.rover.sol_description(self.sol_index)
    }

    pub fn photos(&self) -> &[PhotoReference] {
        &self.photos
    }

    pub fn pipeline(&self) -> &PhotoPipeline {
        &self.pipeline
    }

    /// Grid size
    pub fn item_count(&self) -> usize {
        self.photos.len()
    }

    /// Content for the cell at `index`, starting a fetch if the photo is not
    /// cached. A cached photo that no longer decodes is evicted and fetched
    /// again.
    pub fn cell_content(&self, index: usize) -> Option<CellContent<'_>> {
        let photo = self.photos.get(index)?;
        let data = self.pipeline.request(index, photo);
        let image = data.and_then(|data| match decode(photo.id, &data) {
            Some(image) => Some(image),
            None => {
                warn!("Discarding unreadable cached photo {}, refetching", photo.id);
                self.pipeline.cache().remove(photo.id);
                self.pipeline.fetch(index, photo);
                None
            }
        });
        Some(CellContent { photo, image })
    }

    /// Cancel fetches for cells that are no longer visible
    pub fn scrolled<G: PhotoGrid>(&self, grid: &G) -> usize {
        self.pipeline.cancel_offscreen(&grid.visible_indices())
    }

    /// Apply finished fetches to the grid without blocking.
    ///
    /// An update is applied only if its cell is still visible and still holds
    /// the same photo. Returns the number of cells updated.
    pub fn poll_loaded<G: PhotoGrid>(&mut self, grid: &mut G) -> usize {
        let visible = grid.visible_indices();
        let mut applied = 0;

        while let Ok(loaded) = self.receiver.try_recv() {
            if !visible.contains(&loaded.index) {
                debug!(
                    "Photo {} arrived for offscreen index {}, skipping",
                    loaded.photo_id, loaded.index
                );
                continue;
            }
            if self.photos.get(loaded.index).map(|p| p.id) != Some(loaded.photo_id) {
                debug!("Photo {} no longer at index {}", loaded.photo_id, loaded.index);
                continue;
            }
            grid.show_image(loaded.index, loaded.image);
            applied += 1;
        }

        applied
    }

    /// Wait for in-flight fetches, then apply them
    pub async fn settle<G: PhotoGrid>(&mut self, grid: &mut G) -> usize {
        self.pipeline.drain().await;
        self.poll_loaded(grid)
    }
}

fn decode(photo_id: i64, data: &[u8]) -> Option<DynamicImage> {
    match image::load_from_memory(data) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Failed to decode photo {}: {}", photo_id, e);
            None
        }
    }
}
