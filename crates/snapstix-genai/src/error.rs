//! Error types for image generation.

use snapstix_protocol::ImageError;

/// Errors returned by image generators. No partial results accompany them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Source image is not a valid tagged encoding.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The model answered without a usable image part.
    #[error("empty response: {0}")]
    EmptyResponse(String),
    /// Transport or service error, passed through.
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
    /// No API key available for the provider.
    #[error("missing api key: set {0}")]
    MissingApiKey(String),
}

impl From<ImageError> for GenerationError {
    fn from(err: ImageError) -> Self {
        GenerationError::InvalidInput(err.to_string())
    }
}
