//! Tagged image encodings exchanged with the image model and the gallery.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Mime type used when the model omits one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

static DATA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/]+={0,2})$")
        .expect("valid data url pattern")
});

/// Errors returned while parsing or decoding image encodings.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Input is not a `data:image/...;base64,` URL.
    #[error("invalid image data url: {0}")]
    InvalidDataUrl(String),
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Image payload plus its mime tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    /// Mime type, always `image/*`.
    pub mime_type: String,
    /// Base64 payload without the data url prefix.
    pub data: String,
}

impl EncodedImage {
    /// Build an encoding from raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parse a `data:image/<subtype>;base64,<payload>` URL.
    pub fn parse_data_url(value: &str) -> Result<Self, ImageError> {
        let Some(caps) = DATA_URL.captures(value.trim()) else {
            return Err(ImageError::InvalidDataUrl(preview(value)));
        };
        Ok(Self {
            mime_type: caps[1].to_ascii_lowercase(),
            data: caps[2].to_string(),
        })
    }

    /// Render as a data url suitable for direct display.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the base64 payload.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, ImageError> {
        Ok(STANDARD.decode(self.data.as_bytes())?)
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &str {
        let subtype = self
            .mime_type
            .strip_prefix("image/")
            .unwrap_or(self.mime_type.as_str());
        match subtype {
            "jpeg" => "jpg",
            "svg+xml" => "svg",
            other => other,
        }
    }

    /// Guess a mime type from a file extension.
    pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            "heic" => Some("image/heic"),
            _ => None,
        }
    }
}

/// Short, log-safe prefix of an arbitrary input.
fn preview(value: &str) -> String {
    const MAX: usize = 32;
    let head: String = value.chars().take(MAX).collect();
    if value.chars().count() > MAX {
        format!("{head}...")
    } else {
        head
    }
}
