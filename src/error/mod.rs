// src/error/mod.rs
//! Error taxonomy for the feature overlay.
//!
//! None of these errors are fatal: the overlay degrades to "no update" or
//! "no hit" and keeps running.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OverlayError {
    /// Transport error, non-success status or an API-level error object
    #[error("Fetch Failure: {0}")]
    FetchFailure(String),

    /// Payload or record with an unexpected shape
    #[error("Malformed Response: {0}")]
    MalformedResponse(String),

    /// Polygon with fewer than three vertices
    #[error("Degenerate Geometry: {0}")]
    DegenerateGeometry(String),

    /// Bounding box whose south/north or west/east edges are inverted
    #[error("Invalid Bounds: {0}")]
    InvalidBounds(String),

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),

    /// The controller was built outside a tokio runtime
    #[error("Runtime Unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::MalformedResponse(format!("JSON deserialization error: {}", err))
    }
}

impl From<reqwest::Error> for OverlayError {
    fn from(err: reqwest::Error) -> Self {
        OverlayError::FetchFailure(format!("HTTP client error: {}", err))
    }
}

impl From<url::ParseError> for OverlayError {
    fn from(err: url::ParseError) -> Self {
        OverlayError::ConfigError(format!("Invalid URL: {}", err))
    }
}

impl OverlayError {
    /// Whether the next refresh cycle can be expected to succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            OverlayError::FetchFailure(_) => true, // next viewport event retries naturally
            OverlayError::MalformedResponse(_) => true,
            OverlayError::DegenerateGeometry(_) => false, // same record will be degenerate again
            OverlayError::InvalidBounds(_) => false,
            OverlayError::ConfigError(_) => false,
            OverlayError::RuntimeUnavailable(_) => false,
        }
    }

    /// Whether this error only affects a single record of a batch.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            OverlayError::MalformedResponse(_)
                | OverlayError::DegenerateGeometry(_)
                | OverlayError::InvalidBounds(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_is_recoverable() {
        assert!(OverlayError::FetchFailure("timeout".into()).is_recoverable());
        assert!(!OverlayError::ConfigError("bad url".into()).is_recoverable());
    }

    #[test]
    fn test_record_level_classification() {
        assert!(OverlayError::DegenerateGeometry("2 points".into()).is_record_level());
        assert!(OverlayError::InvalidBounds("south > north".into()).is_record_level());
        assert!(!OverlayError::FetchFailure("503".into()).is_record_level());
    }

    #[test]
    fn test_json_error_maps_to_malformed_response() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let mapped: OverlayError = err.into();
        assert!(matches!(mapped, OverlayError::MalformedResponse(_)));
    }
}
