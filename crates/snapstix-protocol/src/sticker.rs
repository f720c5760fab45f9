//! Sticker records and the expression variants requested per pack.

use crate::image::{EncodedImage, ImageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Theme used in labels when the user leaves it blank.
pub const DEFAULT_LABEL_THEME: &str = "Cartoon";

/// One finished sticker plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    /// Unique sticker identifier.
    pub id: String,
    /// Source photo as a data url; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    /// Generated image as a data url.
    pub result_image: String,
    /// Human-readable theme and expression.
    #[serde(rename = "prompt")]
    pub label: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Sticker {
    /// Create a sticker for a slot, stamping id and creation time.
    pub fn new(
        slot: usize,
        source_image: Option<String>,
        result_image: String,
        label: String,
    ) -> Self {
        let created_at = Utc::now().timestamp_millis();
        Self {
            id: format!("stix-{created_at}-{slot}-{}", Uuid::new_v4().simple()),
            source_image,
            result_image,
            label,
            created_at,
        }
    }

    /// Copy without the source photo.
    pub fn without_source(&self) -> Self {
        Self {
            source_image: None,
            ..self.clone()
        }
    }

    /// Parsed result image.
    pub fn result(&self) -> Result<EncodedImage, ImageError> {
        EncodedImage::parse_data_url(&self.result_image)
    }

    /// Creation time as a UTC timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.created_at)
    }
}

/// Build the label stored with a sticker.
pub fn sticker_label(theme: &str, expression: &str) -> String {
    let theme = theme.trim();
    let theme = if theme.is_empty() {
        DEFAULT_LABEL_THEME
    } else {
        theme
    };
    format!("{theme} ({expression})")
}

/// Expression variant requested for one slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Expression {
    /// Emotion label sent to the model.
    pub label: String,
    /// Display glyph.
    #[serde(default)]
    pub emoji: String,
}

impl Expression {
    pub fn new(label: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            emoji: emoji.into(),
        }
    }
}

/// The five expressions brewed in a default pack, in slot order.
pub fn default_expressions() -> Vec<Expression> {
    vec![
        Expression::new("Happy", "😊"),
        Expression::new("Shocked", "😲"),
        Expression::new("Cool", "😎"),
        Expression::new("Heart-eyes", "😍"),
        Expression::new("Winking", "😉"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn label_falls_back_to_default_theme() {
        assert_eq!(sticker_label("  ", "Cool"), "Cartoon (Cool)");
        assert_eq!(sticker_label("Space Cat", "Happy"), "Space Cat (Happy)");
    }

    #[test]
    fn ids_are_unique_within_a_slot() {
        let a = Sticker::new(0, None, "data:image/png;base64,AA==".to_string(), "a".into());
        let b = Sticker::new(0, None, "data:image/png;base64,AA==".to_string(), "a".into());
        assert!(a.id.starts_with("stix-"));
        assert!(a.id != b.id);
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let sticker = Sticker {
            id: "stix-1".to_string(),
            source_image: None,
            result_image: "data:image/png;base64,AA==".to_string(),
            label: "Cartoon (Happy)".to_string(),
            created_at: 42,
        };
        assert_eq!(
            serde_json::to_value(&sticker).expect("serialize"),
            json!({
                "id": "stix-1",
                "resultImage": "data:image/png;base64,AA==",
                "prompt": "Cartoon (Happy)",
                "createdAt": 42
            })
        );
    }
}
