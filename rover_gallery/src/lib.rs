//! Rover Gallery - Mars rover photo grid with on-device caching
//!
//! Loads a rover manifest once, lists the photos for a selected sol and feeds
//! grid cells through a fetch, cache, display pipeline.

pub mod cache;
pub mod error;
pub mod gallery;
pub mod grid;
pub mod pipeline;

pub use cache::{CacheConfig, DiskCache, PhotoCache, PhotoData};
pub use error::{GalleryError, Result};
pub use gallery::{CellContent, GalleryConfig, PhotoGallery};
pub use grid::{HeadlessGrid, PhotoGrid};
pub use pipeline::{LoadedPhoto, PhotoPipeline, PipelineConfig};
