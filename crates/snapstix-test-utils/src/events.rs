use parking_lot::Mutex;
use snapstix_protocol::{BrewEvent, EventMsg, EventSink};

/// Event sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EventMsg>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventMsg> {
        self.events.lock().clone()
    }

    pub fn payloads(&self) -> Vec<BrewEvent> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }

    /// Completed counts reported by progress events, in order.
    pub fn progress_counts(&self) -> Vec<usize> {
        self.payloads()
            .into_iter()
            .filter_map(|payload| match payload {
                BrewEvent::Progress { completed, .. } => Some(completed),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: EventMsg) {
        self.events.lock().push(event);
    }
}
