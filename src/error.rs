// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the tracking pipeline.

use std::fmt;

/// Result type alias for tracking operations.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Main error type for the tracking pipeline.
#[derive(Debug)]
pub enum TrackError {
    /// The frame source could not be opened or read.
    SourceError(String),
    /// Detector output does not match the expected keypoint layout.
    ShapeMismatch {
        /// Layout the extractor expects.
        expected: String,
        /// Layout actually received.
        actual: String,
    },
    /// The external detector failed for a frame.
    DetectorError(String),
    /// Error processing images.
    ImageError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// IO error with context (file not found, permission denied, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Trace serialization error.
    TraceError(String),
    /// Visualizer error.
    VisualizerError(String),
    /// Video encoding/decoding error.
    VideoError(String),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl TrackError {
    /// Whether the pipeline can skip the current frame and keep going.
    #[must_use]
    pub const fn is_frame_recoverable(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. } | Self::DetectorError(_))
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceError(msg) => write!(f, "Source error: {msg}"),
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {expected}, got {actual}")
            }
            Self::DetectorError(msg) => write!(f, "Detector error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::TraceError(msg) => write!(f, "Trace error: {msg}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for TrackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for TrackError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        Self::TraceError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrackError::SourceError("missing.mp4".to_string());
        assert_eq!(err.to_string(), "Source error: missing.mp4");

        let err = TrackError::ShapeMismatch {
            expected: "(N, 17, 2)".to_string(),
            actual: "(1, 16, 2)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected (N, 17, 2), got (1, 16, 2)"
        );
    }

    #[test]
    fn test_frame_recoverable() {
        let shape = TrackError::ShapeMismatch {
            expected: String::new(),
            actual: String::new(),
        };
        assert!(shape.is_frame_recoverable());
        assert!(TrackError::DetectorError("timeout".into()).is_frame_recoverable());
        assert!(!TrackError::SourceError("gone".into()).is_frame_recoverable());
    }

    #[test]
    fn test_io_source_is_kept() {
        use std::error::Error;
        let err = TrackError::from(std::io::Error::other("disk full"));
        assert!(err.source().is_some());
    }
}
