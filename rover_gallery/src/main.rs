//! Rover Gallery - Mars rover photo browser
//!
//! Opens a rover's photos for one sol and walks a viewport over the grid,
//! fetching and caching the photos of visible cells.

use clap::Parser;
use rover_api::{ClientConfig, MarsRoverClient, DEFAULT_API_KEY, DEFAULT_BASE_URL};
use rover_gallery::{
    CacheConfig, GalleryConfig, HeadlessGrid, PhotoCache, PhotoGallery, PhotoGrid, PipelineConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Mars rover photo gallery - fetches, caches and displays rover photos per sol
#[derive(Parser, Debug)]
#[command(name = "rover_gallery")]
#[command(version, about, long_about = None)]
struct Args {
    /// Rover to open (curiosity, opportunity, spirit, perseverance)
    #[arg(short, long, default_value = "curiosity")]
    rover: String,

    /// Position in the rover's sol listing to open
    #[arg(short, long, default_value_t = 100)]
    sol_index: usize,

    /// Sol number to open; takes precedence over --sol-index
    #[arg(long)]
    sol: Option<u32>,

    /// API key for api.nasa.gov
    #[arg(long, env = "NASA_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Base URL of the Mars Rover Photos API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of grid cells visible at once
    #[arg(long, default_value_t = 12)]
    visible: usize,

    /// Number of viewport pages to scroll through
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Write displayed photos into this directory as PNG files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the on-disk photo cache
    #[arg(long, default_value_t = default_cache_dir())]
    cache_dir: String,

    /// Keep photos in memory only
    #[arg(long, default_value_t = false)]
    no_disk_cache: bool,

    /// In-memory cache capacity in megabytes
    #[arg(long, default_value_t = 64)]
    cache_capacity_mb: u64,

    /// Maximum concurrent photo downloads
    #[arg(long, default_value_t = 5)]
    max_concurrent: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

/// Returns the default cache path: ~/.cache/rover_gallery/photos
fn default_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rover_gallery")
        .join("photos")
        .to_string_lossy()
        .to_string()
}

/// Megabytes to bytes, clamped instead of overflowing
fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Starting rover_gallery...");

    let client = match MarsRoverClient::new(ClientConfig {
        base_url: args.base_url.clone(),
        api_key: args.api_key.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        ..ClientConfig::default()
    }) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };

    let cache = Arc::new(PhotoCache::new(&CacheConfig {
        capacity_bytes: megabytes(args.cache_capacity_mb),
        time_to_idle: None,
        disk_dir: (!args.no_disk_cache).then(|| PathBuf::from(&args.cache_dir)),
    }));

    let mut grid = HeadlessGrid::new(args.visible.max(1));
    if let Some(dir) = &args.output {
        grid = grid.with_output_dir(dir.clone());
    }

    let config = GalleryConfig {
        rover: args.rover.clone(),
        sol_index: args.sol_index,
        sol: args.sol,
        pipeline: PipelineConfig {
            max_concurrent_fetches: args.max_concurrent,
        },
    };

    let mut gallery = match PhotoGallery::load(client, cache, &config, &mut grid).await {
        Ok(gallery) => gallery,
        Err(e) => {
            log::error!("Failed to open gallery for {}: {}", args.rover, e);
            std::process::exit(1);
        }
    };

    if let Some(sol) = gallery.sol_description() {
        log::info!(
            "Showing {} photos from sol {} ({}), cameras: {}",
            gallery.item_count(),
            sol.sol,
            sol.earth_date,
            sol.cameras.join(", ")
        );
    }

    run_viewport(&mut gallery, &mut grid, args.pages).await;

    log::info!(
        "Displayed {} of {} photos ({} cached in memory)",
        grid.shown().len(),
        gallery.item_count(),
        gallery.pipeline().cache().entry_count()
    );
}

/// Scroll a page at a time, requesting every visible cell and waiting for the
/// fetches before moving on
async fn run_viewport(gallery: &mut PhotoGallery, grid: &mut HeadlessGrid, pages: usize) {
    let page_len = grid.visible_range().len().max(1);

    for page in 0..pages {
        grid.scroll_to(page * page_len);
        let range = grid.visible_range();
        if range.is_empty() {
            break;
        }

        let cancelled = gallery.scrolled(&*grid);
        log::info!(
            "Page {}: cells {}..{} ({} offscreen fetches cancelled)",
            page + 1,
            range.start,
            range.end,
            cancelled
        );

        for index in range {
            if let Some(cell) = gallery.cell_content(index) {
                log::debug!(
                    "Cell {}: photo {} by {}",
                    index,
                    cell.photo.id,
                    cell.photo.camera.full_name
                );
                if let Some(image) = cell.image {
                    grid.show_image(index, image);
                }
            }
        }

        let applied = gallery.settle(grid).await;
        log::info!("Page {}: {} photos loaded from network", page + 1, applied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megabytes_saturates() {
        assert_eq!(megabytes(64), 64 * 1024 * 1024);
        assert_eq!(megabytes(0), 0);
        assert_eq!(megabytes(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_sol_option() {
        let args = Args::try_parse_from(["rover_gallery", "--sol", "1000"]).unwrap();
        assert_eq!(args.sol, Some(1000));
        assert_eq!(args.sol_index, 100);

        let args = Args::try_parse_from(["rover_gallery", "-s", "3"]).unwrap();
        assert_eq!(args.sol, None);
        assert_eq!(args.sol_index, 3);
    }
}
