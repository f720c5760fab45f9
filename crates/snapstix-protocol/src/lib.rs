//! Shared types for SnapStix: stickers, image encodings, and brew events.

mod image;
mod sticker;

pub use image::{DEFAULT_IMAGE_MIME, EncodedImage, ImageError};
pub use sticker::{DEFAULT_LABEL_THEME, Expression, Sticker, default_expressions, sticker_label};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a brew batch.
pub type BatchId = Uuid;

/// Per-slot state within a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SlotState {
    /// Not started yet.
    #[default]
    Idle,
    /// Generation request in flight.
    Running,
    /// Sticker produced and added to the collection.
    Succeeded {
        sticker_id: String,
        result_image: String,
        label: String,
    },
    /// Generation failed; may be retried individually.
    Failed { label: String, reason: String },
    /// Manual retry in flight.
    Retrying { label: String },
}

impl SlotState {
    pub fn is_failed(&self) -> bool {
        matches!(self, SlotState::Failed { .. })
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, SlotState::Succeeded { .. })
    }

    /// True while a request for the slot is pending.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SlotState::Running | SlotState::Retrying { .. })
    }
}

/// Wrapper for events emitted while brewing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    /// Unique id for the event.
    pub id: Uuid,
    /// Batch the event belongs to.
    pub batch_id: BatchId,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: BrewEvent,
}

impl EventMsg {
    pub fn new(batch_id: BatchId, payload: BrewEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted by the brew orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum BrewEvent {
    /// A pack started brewing.
    BatchStarted { total: usize, theme: String },
    /// A slot request started.
    SlotStarted { slot: usize, label: String },
    /// A failed slot is being retried.
    SlotRetrying { slot: usize, label: String },
    /// A slot produced a sticker.
    SlotSucceeded {
        slot: usize,
        sticker_id: String,
        label: String,
    },
    /// A slot failed.
    SlotFailed {
        slot: usize,
        label: String,
        reason: String,
    },
    /// Aggregate batch progress.
    Progress {
        completed: usize,
        total: usize,
        percent: f32,
    },
    /// Every slot settled.
    BatchFinished {
        succeeded: usize,
        failed: usize,
        message: Option<String>,
    },
}

/// Sink interface for brew events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: EventMsg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn slot_state_serializes_with_state_tag() {
        let state = SlotState::Failed {
            label: "Cool".to_string(),
            reason: "empty response".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&state).expect("serialize"),
            json!({ "state": "failed", "label": "Cool", "reason": "empty response" })
        );
        assert!(state.is_failed());
        assert!(!state.is_in_flight());
    }

    #[test]
    fn brew_event_serializes_with_type_tag() {
        let event = BrewEvent::Progress {
            completed: 2,
            total: 5,
            percent: 40.0,
        };
        assert_eq!(
            serde_json::to_value(&event).expect("serialize"),
            json!({ "type": "progress", "payload": { "completed": 2, "total": 5, "percent": 40.0 } })
        );
    }
}
