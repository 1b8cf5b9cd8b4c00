//! Grid the gallery renders into
//!
//! The gallery only needs to know which cells are visible and how to hand a
//! decoded image to a cell; everything else belongs to the front end.

use image::DynamicImage;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use std::path::PathBuf;

/// Front-end grid of photo cells
pub trait PhotoGrid {
    /// Indices of the cells currently on screen
    fn visible_indices(&self) -> HashSet<usize>;

    /// The photo list changed; discard cell contents and resize
    fn reload(&mut self, item_count: usize);

    /// Display an image in a cell
    fn show_image(&mut self, index: usize, image: DynamicImage);
}

/// Grid without a screen: a scrolling viewport that records displayed images
/// and optionally writes them out as PNG files
#[derive(Debug, Default)]
pub struct HeadlessGrid {
    item_count: usize,
    first_visible: usize,
    viewport_len: usize,
    /// Displayed images as (width, height), by cell index
    shown: BTreeMap<usize, (u32, u32)>,
    output_dir: Option<PathBuf>,
}

impl HeadlessGrid {
    pub fn new(viewport_len: usize) -> Self {
        Self {
            viewport_len,
            ..Self::default()
        }
    }

    /// Save displayed images into `dir` as `cell_NNNN.png`
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::warn!("Failed to create output directory {:?}: {}", dir, e);
        }
        self.output_dir = Some(dir);
        self
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Move the viewport so that `first` is the top cell
    pub fn scroll_to(&mut self, first: usize) {
        self.first_visible = first.min(self.item_count);
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.first_visible + self.viewport_len).min(self.item_count);
        self.first_visible..end
    }

    pub fn shown(&self) -> &BTreeMap<usize, (u32, u32)> {
        &self.shown
    }

    pub fn is_shown(&self, index: usize) -> bool {
        self.shown.contains_key(&index)
    }
}

impl PhotoGrid for HeadlessGrid {
    fn visible_indices(&self) -> HashSet<usize> {
        self.visible_range().collect()
    }

    fn reload(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.first_visible = 0;
        self.shown.clear();
    }

    fn show_image(&mut self, index: usize, image: DynamicImage) {
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("cell_{:04}.png", index));
            match image.save(&path) {
                Ok(()) => log::debug!("Wrote cell {} to {:?}", index, path),
                Err(e) => log::warn!("Failed to write cell {} image: {}", index, e),
            }
        }
        self.shown.insert(index, (image.width(), image.height()));
    }
}
