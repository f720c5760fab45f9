//! Loading source photos from disk.

use log::debug;
use snapstix_protocol::EncodedImage;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceImageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    /// The file extension is not a supported image type.
    #[error("unsupported image type: {0}")]
    Unsupported(String),
    #[error("image file is empty: {0}")]
    Empty(String),
}

/// Read an image file into a data url, typing it by extension.
pub fn read_source_image(path: impl AsRef<Path>) -> Result<String, SourceImageError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let mime_type = EncodedImage::mime_for_extension(extension)
        .ok_or_else(|| SourceImageError::Unsupported(display.clone()))?;
    let bytes = std::fs::read(path).map_err(|source| SourceImageError::Read {
        path: display.clone(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(SourceImageError::Empty(display));
    }
    debug!(
        "loaded source image (path={}, mime={}, bytes={})",
        display,
        mime_type,
        bytes.len()
    );
    Ok(EncodedImage::from_bytes(mime_type, &bytes).to_data_url())
}
