//! Error types for the core crate.

use snapstix_collection::StorageError;
use snapstix_config::ConfigError;
use snapstix_genai::GenerationError;
use thiserror::Error;

/// Errors returned by brew operations. Per-slot failures are not errors;
/// they are reported through slot state and the batch outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrewError {
    /// Source photo is not a valid image data url.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A batch or a retry is already in flight.
    #[error("a brew is already in progress")]
    Busy,
    /// Slot index outside the pack.
    #[error("unknown slot: {0}")]
    UnknownSlot(usize),
    /// Only failed slots can be retried.
    #[error("slot {0} has not failed")]
    NotRetriable(usize),
    /// No batch has run yet, so there is nothing to retry against.
    #[error("no source photo from a previous batch")]
    NoSource,
}

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// No collection path configured and no platform data directory found.
    #[error("could not resolve a collection directory")]
    NoCollectionPath,
}
