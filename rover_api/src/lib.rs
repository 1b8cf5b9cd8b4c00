//! Rover API - shared types for the Mars Rover Photos API
//!
//! Rover manifests, sol descriptions, photo references, the error type and an
//! async client used by the gallery.

pub mod client;
pub mod error;
pub mod models;

pub use client::{ClientConfig, MarsRoverClient, DEFAULT_API_KEY, DEFAULT_BASE_URL};
pub use error::{Result, RoverError};
pub use models::{Camera, MarsRover, PhotoReference, PhotoRover, SolDescription};
