//! Terminal progress output for brew events.

use snapstix_protocol::{BrewEvent, EventMsg, EventSink, Expression};

/// Prints one line per brew event to stdout.
pub struct ProgressPrinter {
    expressions: Vec<Expression>,
}

impl ProgressPrinter {
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self { expressions }
    }

    fn emoji(&self, slot: usize) -> &str {
        self.expressions
            .get(slot)
            .map(|expression| expression.emoji.as_str())
            .unwrap_or_default()
    }
}

impl EventSink for ProgressPrinter {
    fn emit(&self, event: EventMsg) {
        match event.payload {
            BrewEvent::BatchStarted { total, theme } => {
                let theme = if theme.trim().is_empty() {
                    "a cartoon"
                } else {
                    theme.as_str()
                };
                println!("Brewing {total} stickers as {theme}...");
            }
            BrewEvent::SlotStarted { .. } => {}
            BrewEvent::SlotRetrying { slot, label } => {
                println!("  [{}] {} retrying {label}", slot + 1, self.emoji(slot));
            }
            BrewEvent::SlotSucceeded {
                slot,
                sticker_id,
                label,
            } => {
                println!(
                    "  [{}] {} {label} ready ({sticker_id})",
                    slot + 1,
                    self.emoji(slot)
                );
            }
            BrewEvent::SlotFailed {
                slot,
                label,
                reason,
            } => {
                println!(
                    "  [{}] {} {label} failed: {reason}",
                    slot + 1,
                    self.emoji(slot)
                );
            }
            BrewEvent::Progress {
                completed,
                total,
                percent,
            } => {
                println!("  progress {completed}/{total} ({percent:.0}%)");
            }
            BrewEvent::BatchFinished { .. } => {}
        }
    }
}
