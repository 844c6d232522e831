//! Error types for the viewer

use thiserror::Error;

/// Main error type for the viewer
#[derive(Debug, Error)]
pub enum Error {
    /// Conversion result is missing voxels or resolution
    #[error("Invalid map payload: {0}")]
    InvalidPayload(String),

    /// Converter process could not run or exited with a failure
    #[error("Conversion failed: {} - {message}", status_text(.status))]
    ConversionTransportFailure {
        status: Option<i32>,
        message: String,
    },

    #[error("Invalid projection mode provided: {0}")]
    InvalidProjectionMode(String),

    #[error("No map data loaded")]
    NoMapLoaded,

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

impl Error {
    /// Whether this error is a user-facing warning rather than a failure
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::NoMapLoaded | Error::InvalidProjectionMode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_message() {
        let err = Error::ConversionTransportFailure {
            status: Some(500),
            message: "bad octree".into(),
        };
        assert_eq!(err.to_string(), "Conversion failed: 500 - bad octree");

        let err = Error::ConversionTransportFailure {
            status: None,
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "Conversion failed: no status - not found");
    }

    #[test]
    fn test_warning_kinds() {
        assert!(Error::NoMapLoaded.is_warning());
        assert!(Error::InvalidProjectionMode("fisheye".into()).is_warning());
        assert!(!Error::InvalidPayload("x".into()).is_warning());
    }
}
