//! Errors raised while reading SnapStix config layers.

use thiserror::Error;

/// Failure loading a `snapstix.json5` layer or validating the merged result.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer file (user, project, cwd or runtime) could not be read.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// A layer is not valid JSON5.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged layers do not decode into `SnapstixConfig`.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// Unknown key or wrong type, reported as `layer:dotted.path`.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Cross-field check failed, e.g. an empty expression list.
    #[error("invalid config: {0}")]
    Invalid(String),
}
