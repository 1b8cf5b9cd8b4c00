//! Tests for the Mars Rover API client
//!
//! Note: Tests against the live API require network access and are marked with #[ignore]

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{ClientConfig, MarsRoverClient};
use crate::error::RoverError;
use crate::models::{MarsRover, PhotoReference};

/// Helper: client pointed at a mock server
fn test_client(base_url: &str) -> MarsRoverClient {
    MarsRoverClient::new(ClientConfig {
        base_url: base_url.to_string(),
        api_key: "TEST_KEY".to_string(),
        upgrade_insecure_image_urls: false,
        ..ClientConfig::default()
    })
    .unwrap()
}

fn manifest_json() -> serde_json::Value {
    serde_json::json!({
        "photo_manifest": {
            "name": "Curiosity",
            "landing_date": "2012-08-06",
            "launch_date": "2011-11-26",
            "status": "active",
            "max_sol": 4102,
            "max_date": "2024-02-19",
            "total_photos": 695670,
            "photos": [
                { "sol": 0, "earth_date": "2012-08-06", "total_photos": 3702, "cameras": ["FHAZ"] },
                { "sol": 1, "earth_date": "2012-08-07", "total_photos": 16, "cameras": ["MAST"] }
            ]
        }
    })
}

fn photo_json(id: i64, img_src: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "sol": 1,
        "camera": { "id": 22, "name": "MAST", "rover_id": 5, "full_name": "Mast Camera" },
        "img_src": img_src,
        "earth_date": "2012-08-07",
        "rover": { "id": 5, "name": "Curiosity", "landing_date": "2012-08-06", "launch_date": "2011-11-26", "status": "active" }
    })
}

fn curiosity() -> MarsRover {
    serde_json::from_value(manifest_json()["photo_manifest"].clone()).unwrap()
}

// ── fetch_mars_rover ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_rover_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifests/curiosity"))
        .and(query_param("api_key", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_json()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let rover = client.fetch_mars_rover("Curiosity").await.unwrap();

    assert_eq!(rover.name, "Curiosity");
    assert_eq!(rover.sol_descriptions.len(), 2);
    assert_eq!(rover.sol_descriptions[1].sol, 1);
}

#[tokio::test]
async fn fetch_rover_404_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifests/nonexistent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let result = client.fetch_mars_rover("nonexistent").await;

    match result {
        Err(RoverError::RoverNotFound(name)) => assert_eq!(name, "nonexistent"),
        other => panic!("Expected RoverError::RoverNotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_rover_server_error_returns_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifests/curiosity"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let result = client.fetch_mars_rover("curiosity").await;

    match result {
        Err(RoverError::HttpStatus(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("Expected RoverError::HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_rover_malformed_body_returns_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifests/curiosity"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"photo_manifest\": 42}"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let result = client.fetch_mars_rover("curiosity").await;

    assert!(matches!(result, Err(RoverError::Parse(_))));
}

// ── fetch_photos ─────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_photos_sends_sol_and_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rovers/curiosity/photos"))
        .and(query_param("sol", "1"))
        .and(query_param("api_key", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "photos": [
                photo_json(10, "http://example.com/10.jpg"),
                photo_json(11, "http://example.com/11.jpg")
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let photos = client.fetch_photos(&curiosity(), 1).await.unwrap();

    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0].id, 10);
    assert_eq!(photos[1].camera.name, "MAST");
}

#[tokio::test]
async fn fetch_photos_empty_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rovers/curiosity/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "photos": [] })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let photos = client.fetch_photos(&curiosity(), 2).await.unwrap();

    assert!(photos.is_empty());
}

#[tokio::test]
async fn fetch_photos_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rovers/curiosity/photos"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let result = client.fetch_photos(&curiosity(), 1).await;

    assert!(matches!(result, Err(RoverError::HttpStatus(s)) if s.as_u16() == 403));
}

// ── fetch_photo_data ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_photo_data_success() {
    let mock_server = MockServer::start().await;
    let image_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];

    Mock::given(method("GET"))
        .and(path("/images/10.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes.clone()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let photo: PhotoReference = serde_json::from_value(photo_json(
        10,
        &format!("{}/images/10.jpg", mock_server.uri()),
    ))
    .unwrap();

    let bytes = client.fetch_photo_data(&photo).await.unwrap();
    assert_eq!(bytes, image_bytes);
}

#[tokio::test]
async fn fetch_photo_data_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/images/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let url = format!("{}/images/missing.jpg", mock_server.uri());
    let photo: PhotoReference = serde_json::from_value(photo_json(99, &url)).unwrap();

    match client.fetch_photo_data(&photo).await {
        Err(RoverError::PhotoFetchFailed { url: failed, status }) => {
            assert_eq!(failed, url);
            assert_eq!(status.as_u16(), 404);
        }
        other => panic!("Expected RoverError::PhotoFetchFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_photo_data_invalid_url() {
    let client = test_client("http://127.0.0.1:1");
    let photo: PhotoReference = serde_json::from_value(photo_json(1, "not a url")).unwrap();

    let result = client.fetch_photo_data(&photo).await;
    assert!(matches!(result, Err(RoverError::InvalidUrl(_))));
}

#[test]
fn photo_url_respects_upgrade_setting() {
    let photo: PhotoReference =
        serde_json::from_value(photo_json(1, "http://mars.jpl.nasa.gov/a.JPG")).unwrap();

    let plain = test_client("http://localhost");
    assert_eq!(plain.photo_url(&photo), "http://mars.jpl.nasa.gov/a.JPG");

    let upgrading = MarsRoverClient::new(ClientConfig::default()).unwrap();
    assert_eq!(upgrading.photo_url(&photo), "https://mars.jpl.nasa.gov/a.JPG");
}

#[test]
fn endpoint_trims_trailing_slash() {
    let client = test_client("http://localhost:8080/api/");
    assert_eq!(
        client.endpoint("manifests/curiosity"),
        "http://localhost:8080/api/manifests/curiosity"
    );
}

// Integration tests (require network access)
#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn fetch_curiosity_manifest_integration() {
    let client = MarsRoverClient::new(ClientConfig::default()).unwrap();

    let rover = client.fetch_mars_rover("curiosity").await.unwrap();
    assert_eq!(rover.name, "Curiosity");
    assert!(!rover.sol_descriptions.is_empty());
}
