//! Image generator interface used by the brew orchestrator.

use crate::error::GenerationError;
use async_trait::async_trait;

/// Single-attempt image generation boundary.
///
/// Implementations must not retry internally or mutate shared state.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one sticker image for `expression` from a source data url.
    ///
    /// Returns the result as a directly renderable data url.
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError>;
}
