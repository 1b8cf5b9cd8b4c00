//! Error types for rover_api

use thiserror::Error;

/// Unified error type for Mars Rover API operations
#[derive(Debug, Error)]
pub enum RoverError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// No manifest for the requested rover
    #[error("Rover not found: {0}")]
    RoverNotFound(String),
    /// Failed to fetch photo bytes from URL
    #[error("Failed to fetch photo from: {url} ({status})")]
    PhotoFetchFailed {
        url: String,
        status: reqwest::StatusCode,
    },
    /// Photo reference carries an unusable image URL
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

/// Result alias for rover_api operations
pub type Result<T> = std::result::Result<T, RoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = RoverError::RoverNotFound("spirit".to_string());
        assert_eq!(err.to_string(), "Rover not found: spirit");

        let err = RoverError::HttpStatus(reqwest::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "HTTP error: 429 Too Many Requests");

        let err = RoverError::PhotoFetchFailed {
            url: "https://example.com/a.jpg".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        assert!(err.to_string().contains("https://example.com/a.jpg"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: RoverError = json_err.into();
        assert!(matches!(err, RoverError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
