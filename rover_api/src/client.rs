//! Mars Rover Photos API client
//!
//! Uses async reqwest for non-blocking HTTP requests. The base URL is part of
//! the configuration so tests can point the client at a mock server.

use crate::error::{Result, RoverError};
use crate::models::{ManifestResponse, MarsRover, PhotoReference, PhotosResponse};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/mars-photos/api/v1";
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

const USER_AGENT: &str = "RoverGallery/1.0";

/// Connection settings for [`MarsRoverClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Rewrite `http://` photo URLs to `https://` before fetching
    pub upgrade_insecure_image_urls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            timeout: Duration::from_secs(30),
            upgrade_insecure_image_urls: true,
        }
    }
}

/// Async client for rover manifests, photo listings and photo bytes
#[derive(Debug, Clone)]
pub struct MarsRoverClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl MarsRoverClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fetch a rover's manifest (metadata plus per-sol descriptions)
    pub async fn fetch_mars_rover(&self, name: &str) -> Result<MarsRover> {
        let url = self.endpoint(&format!(
            "manifests/{}",
            urlencoding::encode(&name.to_lowercase())
        ));

        log::info!("Fetching manifest for rover: {}", name);

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await?;
                let manifest: ManifestResponse = serde_json::from_str(&body)?;
                Ok(manifest.photo_manifest)
            }
            StatusCode::NOT_FOUND => Err(RoverError::RoverNotFound(name.to_string())),
            status => Err(RoverError::HttpStatus(status)),
        }
    }

    /// Fetch the photo references a rover took on a given sol
    pub async fn fetch_photos(&self, rover: &MarsRover, sol: u32) -> Result<Vec<PhotoReference>> {
        let url = self.endpoint(&format!(
            "rovers/{}/photos",
            urlencoding::encode(&rover.name.to_lowercase())
        ));

        log::info!("Fetching photos for {} on sol {}", rover.name, sol);

        let sol = sol.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("sol", sol.as_str()), ("api_key", self.config.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RoverError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let listing: PhotosResponse = serde_json::from_str(&body)?;
        log::debug!(
            "Received {} photo references for {} on sol {}",
            listing.photos.len(),
            rover.name,
            sol
        );
        Ok(listing.photos)
    }

    /// URL the photo bytes are fetched from
    pub fn photo_url(&self, photo: &PhotoReference) -> String {
        if self.config.upgrade_insecure_image_urls {
            photo.secure_image_url()
        } else {
            photo.image_url.clone()
        }
    }

    /// Fetch raw image bytes for a photo
    pub async fn fetch_photo_data(&self, photo: &PhotoReference) -> Result<Vec<u8>> {
        let url = self.photo_url(photo);
        let parsed = reqwest::Url::parse(&url).map_err(|_| RoverError::InvalidUrl(url.clone()))?;

        log::debug!("Fetching photo {} from URL: {}", photo.id, url);

        let response = self.http.get(parsed).send().await?;

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(RoverError::PhotoFetchFailed {
                url,
                status: response.status(),
            })
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
