//! Download and share collaborators for finished stickers.

use log::{debug, info};
use snapstix_protocol::{ImageError, Sticker};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title attached to shared stickers.
pub const SHARE_TITLE: &str = "SnapStix Sticker";

#[derive(Debug, Error)]
pub enum ExportError {
    /// Sticker image could not be decoded.
    #[error("invalid sticker image: {0}")]
    Decode(#[from] ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ShareError {
    /// No share mechanism on this platform.
    #[error("sharing is not supported on this platform")]
    Unsupported,
    #[error("share failed: {0}")]
    Failed(String),
}

/// File name a sticker is saved under.
pub fn sticker_file_name(sticker: &Sticker) -> String {
    let extension = sticker
        .result()
        .map(|image| image.extension().to_string())
        .unwrap_or_else(|_| "png".to_string());
    format!("snapstix-{}.{extension}", sticker.id)
}

/// Decode the sticker image and write it into `dir`.
pub fn export_sticker(sticker: &Sticker, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let bytes = sticker.result()?.decode_bytes()?;
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(sticker_file_name(sticker));
    fs::write(&path, &bytes)?;
    info!(
        "exported sticker (id={}, path={}, bytes={})",
        sticker.id,
        path.display(),
        bytes.len()
    );
    Ok(path)
}

/// Payload handed to a platform share mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub text: String,
}

impl ShareRequest {
    pub fn for_sticker(sticker: &Sticker) -> Result<Self, ExportError> {
        let image = sticker.result()?;
        Ok(Self {
            file_name: sticker_file_name(sticker),
            bytes: image.decode_bytes()?,
            mime_type: image.mime_type,
            title: SHARE_TITLE.to_string(),
            text: format!("Check out my sticker: {}", sticker.label),
        })
    }
}

/// Platform share mechanism.
pub trait ShareTarget: Send + Sync {
    fn share(&self, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Share target for platforms without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedShareTarget;

impl ShareTarget for UnsupportedShareTarget {
    fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        debug!("share unsupported (file_name={})", request.file_name);
        Err(ShareError::Unsupported)
    }
}
