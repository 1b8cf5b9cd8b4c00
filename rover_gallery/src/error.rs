//! Error types for rover_gallery

use rover_api::RoverError;
use thiserror::Error;

/// Unified error type for gallery operations
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Rover API request failed
    #[error(transparent)]
    Api(#[from] RoverError),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Manifest has no sol description at the requested position
    #[error("No sol description at index {index} ({available} available)")]
    NoSolDescription { index: usize, available: usize },
    /// Rover took no photos on the requested sol
    #[error("No photos on sol {sol} (max sol {max_sol})")]
    SolNotFound { sol: u32, max_sol: u32 },
}

/// Result alias for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;
