//! Error types for the heatmap renderer.
//!
//! Rendering itself never fails: degenerate input produces a transparent
//! frame and an unloaded background defers the frame. These errors cover the
//! edges of the crate (configuration, color parsing, image I/O).

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for heatmap operations.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Configuration Errors ===
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid gradient stop position: {0}")]
    InvalidStopPosition(String),

    // === Image Errors ===
    #[error("Failed to decode background image: {0}")]
    ImageDecode(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    // === Infrastructure Errors ===
    #[error("IO error: {0}")]
    Io(String),
}

impl HeatmapError {
    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        HeatmapError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error came from user-supplied configuration rather than I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HeatmapError::InvalidConfig { .. }
                | HeatmapError::ConfigParse(_)
                | HeatmapError::InvalidColor(_)
                | HeatmapError::InvalidStopPosition(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::ConfigParse(format!("JSON error: {}", err))
    }
}

impl From<image::ImageError> for HeatmapError {
    fn from(err: image::ImageError) -> Self {
        HeatmapError::ImageDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_classification() {
        assert!(HeatmapError::invalid_config("radius", "must be finite").is_config_error());
        assert!(HeatmapError::InvalidColor("nope".into()).is_config_error());
        assert!(!HeatmapError::Io("disk".into()).is_config_error());
    }

    #[test]
    fn test_error_messages() {
        let err = HeatmapError::invalid_config("blur", "must be finite");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'blur': must be finite"
        );
    }
}
