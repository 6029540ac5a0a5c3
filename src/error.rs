//! Error types for the capture pipeline

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a schedule
#[derive(Error, Debug)]
pub enum Error {
    /// The schedule has no rows to capture
    #[error("Nothing to capture: the schedule has no rows")]
    EmptyReport,

    /// No rasterizer capability was supplied to the pipeline
    #[error("Rasterizer is not available")]
    MissingRasterizer,

    /// The rasterizer failed during a pass
    #[error("Rasterizer failed: {0}")]
    RasterizerError(String),

    /// A canvas allocation would exceed the platform limit
    #[error("Canvas of {width}x{height} exceeds the {limit}px raster cap")]
    AllocationOverflow { width: u32, height: u32, limit: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodeError(String),

    /// Handing the image to the download sink failed
    #[error("Export failed: {0}")]
    ExportError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Text shown to the user through the notification collaborator.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::EmptyReport => "No exams to screenshot. Please add courses first.",
            Error::MissingRasterizer => {
                "Screenshot failed - missing library. Please refresh the page and try again."
            }
            _ => "Error taking screenshot. Please try again.",
        }
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::EncodeError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_follow_taxonomy() {
        assert!(Error::EmptyReport.user_message().starts_with("No exams"));
        assert!(Error::MissingRasterizer.user_message().contains("missing library"));
        let overflow = Error::AllocationOverflow { width: 1, height: 9000, limit: 4096 };
        assert_eq!(overflow.user_message(), "Error taking screenshot. Please try again.");
        assert!(overflow.to_string().contains("9000"));
    }
}
