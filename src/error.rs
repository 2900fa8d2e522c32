// src/error.rs
//! Error types for the cycle map

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Style error: {0}")]
    Style(String),
    #[cfg(feature = "gui")]
    #[error("GUI error: {0}")]
    Gui(#[from] eframe::Error),
    #[error("Error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for MapError {
    fn from(error: anyhow::Error) -> Self {
        MapError::Other(error.to_string())
    }
}

/// Reasons a location provider refuses a subscription
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{0} location permission is not granted")]
    PermissionDenied(&'static str),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider is already subscribed")]
    AlreadySubscribed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MapError::Style("layer references missing source".to_string());
        assert_eq!(err.to_string(), "Style error: layer references missing source");

        let err = ProviderError::PermissionDenied("fine");
        assert_eq!(err.to_string(), "fine location permission is not granted");
    }

    #[test]
    fn test_json_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: MapError = parse.unwrap_err().into();
        assert!(matches!(err, MapError::Json(_)));
    }
}
