//! Brew orchestrator: one pack of sticker variants per source photo.

use crate::error::BrewError;
use futures_util::future::join_all;
use log::{debug, info, warn};
use parking_lot::Mutex;
use snapstix_collection::CollectionStore;
use snapstix_genai::ImageGenerator;
use snapstix_protocol::{
    BatchId, BrewEvent, EncodedImage, EventMsg, EventSink, Expression, SlotState, Sticker,
    sticker_label,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default start offset between consecutive slots.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(800);

/// Aggregate error when no slot produced a sticker.
pub const ALL_FAILED_MESSAGE: &str = "AI was unable to brew any stickers. This theme might be triggering safety filters. Try a friendlier theme!";

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrewOptions {
    /// Slot `i` starts `i * stagger` after the batch.
    pub stagger: Duration,
}

impl Default for BrewOptions {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
        }
    }
}

/// How a batch settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every slot succeeded.
    Complete,
    /// Some slots failed and can be retried.
    Partial { failed: usize },
    /// No slot succeeded.
    AllFailed,
}

impl BatchOutcome {
    fn from_counts(failed: usize, total: usize) -> Self {
        if total > 0 && failed == total {
            BatchOutcome::AllFailed
        } else if failed > 0 {
            BatchOutcome::Partial { failed }
        } else {
            BatchOutcome::Complete
        }
    }

    /// User-facing aggregate message, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            BatchOutcome::Complete => None,
            BatchOutcome::Partial { failed } => Some(format!(
                "Almost there! {failed} sticker(s) hit a snag. Retry the failed slots individually."
            )),
            BatchOutcome::AllFailed => Some(ALL_FAILED_MESSAGE.to_string()),
        }
    }
}

/// Result of a settled batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub outcome: BatchOutcome,
    pub succeeded: usize,
    pub failed: usize,
    /// Final slot states, in expression order.
    pub slots: Vec<SlotState>,
}

/// Read-only view of orchestrator state.
#[derive(Debug, Clone, PartialEq)]
pub struct BrewSnapshot {
    pub slots: Vec<SlotState>,
    pub completed: usize,
    pub total: usize,
    /// Settled share of the current batch, 0 to 100.
    pub progress: f32,
    pub generating: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct BrewState {
    batch_id: BatchId,
    slots: Vec<SlotState>,
    completed: usize,
    generating: bool,
    /// Single-slot retries in flight.
    retrying: usize,
    error: Option<String>,
    /// Source and theme of the last batch, reused by retries.
    source: Option<String>,
    theme: String,
}

/// Runs sticker batches and single-slot retries.
///
/// Slot futures are joined on the caller's task, so state updates never
/// race. The state lock is never held across an await.
pub struct BrewOrchestrator {
    generator: Arc<dyn ImageGenerator>,
    collection: Arc<CollectionStore>,
    expressions: Vec<Expression>,
    options: BrewOptions,
    state: Mutex<BrewState>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl BrewOrchestrator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        collection: Arc<CollectionStore>,
        expressions: Vec<Expression>,
        options: BrewOptions,
    ) -> Self {
        info!(
            "initializing brew orchestrator (slots={}, stagger_ms={})",
            expressions.len(),
            options.stagger.as_millis()
        );
        let state = BrewState {
            batch_id: Uuid::nil(),
            slots: vec![SlotState::Idle; expressions.len()],
            completed: 0,
            generating: false,
            retrying: 0,
            error: None,
            source: None,
            theme: String::new(),
        };
        Self {
            generator,
            collection,
            expressions,
            options,
            state: Mutex::new(state),
            event_sink: None,
        }
    }

    /// Publish brew events to `sink`.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn collection(&self) -> &Arc<CollectionStore> {
        &self.collection
    }

    /// Brew one sticker per expression from `source_image`.
    ///
    /// Resolves once every slot has settled. Slot failures are reported in
    /// the returned outcome, never as an error.
    pub async fn brew_pack(
        &self,
        source_image: &str,
        theme: &str,
    ) -> Result<BatchReport, BrewError> {
        EncodedImage::parse_data_url(source_image)
            .map_err(|err| BrewError::InvalidInput(err.to_string()))?;

        let batch_id = Uuid::new_v4();
        let total = self.expressions.len();
        {
            let mut state = self.state.lock();
            if state.generating || state.retrying > 0 {
                return Err(BrewError::Busy);
            }
            state.batch_id = batch_id;
            state.slots = vec![SlotState::Idle; total];
            state.completed = 0;
            state.generating = true;
            state.error = None;
            state.source = Some(source_image.to_string());
            state.theme = theme.to_string();
        }
        let _generating = InFlight::Batch(&self.state);
        info!("brewing pack (batch_id={batch_id}, slots={total})");
        self.emit(
            batch_id,
            BrewEvent::BatchStarted {
                total,
                theme: theme.to_string(),
            },
        );

        let slots = self
            .expressions
            .iter()
            .enumerate()
            .map(|(index, expression)| {
                let delay = self.options.stagger * index as u32;
                self.run_slot(batch_id, index, expression, delay, source_image, theme)
            });
        let settled = join_all(slots).await;

        let failed = settled.iter().filter(|succeeded| !**succeeded).count();
        let succeeded = total - failed;
        let outcome = BatchOutcome::from_counts(failed, total);
        let message = outcome.message();
        let slots = {
            let mut state = self.state.lock();
            state.error = message.clone();
            state.generating = false;
            state.slots.clone()
        };
        info!("pack settled (batch_id={batch_id}, succeeded={succeeded}, failed={failed})");
        self.emit(
            batch_id,
            BrewEvent::BatchFinished {
                succeeded,
                failed,
                message,
            },
        );
        Ok(BatchReport {
            batch_id,
            outcome,
            succeeded,
            failed,
            slots,
        })
    }

    /// Retry one failed slot with the last batch's source and theme.
    ///
    /// Other slots and the aggregate error are left untouched.
    pub async fn retry_slot(&self, index: usize) -> Result<SlotState, BrewError> {
        let (batch_id, label, source, theme) = {
            let mut state = self.state.lock();
            if state.generating {
                return Err(BrewError::Busy);
            }
            let label = match state.slots.get(index) {
                None => return Err(BrewError::UnknownSlot(index)),
                Some(SlotState::Failed { label, .. }) => label.clone(),
                Some(_) => return Err(BrewError::NotRetriable(index)),
            };
            let Some(source) = state.source.clone() else {
                return Err(BrewError::NoSource);
            };
            state.slots[index] = SlotState::Retrying {
                label: label.clone(),
            };
            state.retrying += 1;
            (state.batch_id, label, source, state.theme.clone())
        };
        let _retrying = InFlight::Retry(&self.state);
        let expression = &self.expressions[index];
        info!("retrying slot (batch_id={batch_id}, slot={index}, expression={})", expression.label);
        self.emit(
            batch_id,
            BrewEvent::SlotRetrying {
                slot: index,
                label: label.clone(),
            },
        );

        let outcome = self
            .attempt(batch_id, index, expression, label, &source, &theme)
            .await;
        self.state.lock().slots[index] = outcome.clone();
        Ok(outcome)
    }

    pub fn snapshot(&self) -> BrewSnapshot {
        let state = self.state.lock();
        let total = state.slots.len();
        BrewSnapshot {
            slots: state.slots.clone(),
            completed: state.completed,
            total,
            progress: percent(state.completed, total),
            generating: state.generating,
            error: state.error.clone(),
        }
    }

    /// Run one batch slot; returns whether it produced a sticker.
    async fn run_slot(
        &self,
        batch_id: BatchId,
        index: usize,
        expression: &Expression,
        delay: Duration,
        source_image: &str,
        theme: &str,
    ) -> bool {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let label = sticker_label(theme, &expression.label);
        self.state.lock().slots[index] = SlotState::Running;
        debug!("slot started (batch_id={batch_id}, slot={index}, label={label})");
        self.emit(
            batch_id,
            BrewEvent::SlotStarted {
                slot: index,
                label: label.clone(),
            },
        );

        let outcome = self
            .attempt(batch_id, index, expression, label, source_image, theme)
            .await;
        let succeeded = outcome.is_succeeded();
        let (completed, total) = {
            let mut state = self.state.lock();
            state.slots[index] = outcome;
            state.completed += 1;
            (state.completed, state.slots.len())
        };
        self.emit(
            batch_id,
            BrewEvent::Progress {
                completed,
                total,
                percent: percent(completed, total),
            },
        );
        succeeded
    }

    /// One generation attempt; a success lands in the collection.
    async fn attempt(
        &self,
        batch_id: BatchId,
        index: usize,
        expression: &Expression,
        label: String,
        source_image: &str,
        theme: &str,
    ) -> SlotState {
        let result = self
            .generator
            .generate(source_image, theme, &expression.label)
            .await
            .and_then(|result| {
                EncodedImage::parse_data_url(&result)?;
                Ok(result)
            });
        match result {
            Ok(result_image) => {
                let sticker = Sticker::new(
                    index,
                    Some(source_image.to_string()),
                    result_image.clone(),
                    label.clone(),
                );
                let sticker_id = sticker.id.clone();
                self.collection.append(sticker);
                self.emit(
                    batch_id,
                    BrewEvent::SlotSucceeded {
                        slot: index,
                        sticker_id: sticker_id.clone(),
                        label: label.clone(),
                    },
                );
                SlotState::Succeeded {
                    sticker_id,
                    result_image,
                    label,
                }
            }
            Err(err) => {
                warn!(
                    "brew failed (batch_id={batch_id}, slot={index}, expression={}, error={err})",
                    expression.label
                );
                let reason = err.to_string();
                self.emit(
                    batch_id,
                    BrewEvent::SlotFailed {
                        slot: index,
                        label: label.clone(),
                        reason: reason.clone(),
                    },
                );
                SlotState::Failed { label, reason }
            }
        }
    }

    fn emit(&self, batch_id: BatchId, payload: BrewEvent) {
        if let Some(sink) = &self.event_sink {
            sink.emit(EventMsg::new(batch_id, payload));
        }
    }
}

fn percent(completed: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        completed as f32 / total as f32 * 100.0
    }
}

/// Clears the in-flight marker even if the brew future is dropped early.
enum InFlight<'a> {
    Batch(&'a Mutex<BrewState>),
    Retry(&'a Mutex<BrewState>),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        match self {
            InFlight::Batch(state) => state.lock().generating = false,
            InFlight::Retry(state) => {
                let mut state = state.lock();
                state.retrying = state.retrying.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn outcome_from_counts() {
        assert_eq!(BatchOutcome::from_counts(0, 5), BatchOutcome::Complete);
        assert_eq!(
            BatchOutcome::from_counts(2, 5),
            BatchOutcome::Partial { failed: 2 }
        );
        assert_eq!(BatchOutcome::from_counts(5, 5), BatchOutcome::AllFailed);
        assert_eq!(BatchOutcome::from_counts(0, 0), BatchOutcome::Complete);
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(BatchOutcome::Complete.message(), None);
        assert_eq!(
            BatchOutcome::Partial { failed: 2 }.message().as_deref(),
            Some("Almost there! 2 sticker(s) hit a snag. Retry the failed slots individually.")
        );
        assert_eq!(
            BatchOutcome::AllFailed.message().as_deref(),
            Some(ALL_FAILED_MESSAGE)
        );
    }

    #[test]
    fn percent_handles_empty_pack() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(2, 5), 40.0);
    }
}
