//! Mars Rover Photos API data types
//!
//! Rover manifests and photo listings as returned by the API. Dates are parsed
//! into `NaiveDate`. Photo counters and `max_sol` default to zero so that
//! records which omit them still deserialize.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rover metadata from the manifest endpoint
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MarsRover {
    pub name: String,
    pub launch_date: NaiveDate,
    pub landing_date: NaiveDate,
    pub status: String,
    #[serde(default)]
    pub max_sol: u32,
    pub max_date: NaiveDate,
    #[serde(default)]
    pub total_photos: u64,
    /// One entry per sol that has photos, normally in ascending sol order
    #[serde(rename = "photos", default)]
    pub sol_descriptions: Vec<SolDescription>,
}

/// Summary of the photos taken on a single sol
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SolDescription {
    pub sol: u32,
    pub earth_date: NaiveDate,
    #[serde(default)]
    pub total_photos: u64,
    #[serde(default)]
    pub cameras: Vec<String>,
}

/// Manifest envelope: `{"photo_manifest": {...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ManifestResponse {
    pub photo_manifest: MarsRover,
}

/// Photo listing envelope: `{"photos": [...]}`
#[derive(Debug, Deserialize)]
pub(crate) struct PhotosResponse {
    #[serde(default)]
    pub photos: Vec<PhotoReference>,
}

/// Camera that took a photo
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Camera {
    pub id: u32,
    /// Short name, e.g. "FHAZ"
    pub name: String,
    #[serde(default)]
    pub rover_id: Option<u32>,
    pub full_name: String,
}

/// Rover summary embedded in each photo
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PhotoRover {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub landing_date: Option<NaiveDate>,
    #[serde(default)]
    pub launch_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A single photo: where it lives and when/how it was taken
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PhotoReference {
    pub id: i64,
    pub sol: u32,
    pub camera: Camera,
    #[serde(rename = "img_src")]
    pub image_url: String,
    pub earth_date: NaiveDate,
    pub rover: PhotoRover,
}

impl MarsRover {
    /// Sol description at a position in the manifest listing
    pub fn sol_description(&self, index: usize) -> Option<&SolDescription> {
        self.sol_descriptions.get(index)
    }

    /// Listing position of a sol number; the listing is not assumed sorted
    pub fn sol_index_of(&self, sol: u32) -> Option<usize> {
        self.sol_descriptions.iter().position(|d| d.sol == sol)
    }

    /// Sol description for a specific sol number
    pub fn find_sol(&self, sol: u32) -> Option<&SolDescription> {
        self.sol_index_of(sol)
            .and_then(|index| self.sol_description(index))
    }
}

impl PhotoReference {
    /// Image URL with `http://` upgraded to `https://`
    pub fn secure_image_url(&self) -> String {
        match self.image_url.strip_prefix("http://") {
            Some(rest) => format!("https://{}", rest),
            None => self.image_url.clone(),
        }
    }
}
