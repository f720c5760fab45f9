use async_trait::async_trait;
use parking_lot::Mutex;
use snapstix_genai::{GenerationError, ImageGenerator};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// A tiny valid source photo.
pub const SOURCE_DATA_URL: &str = "data:image/jpeg;base64,c291cmNlLXBob3Rv";
/// A tiny valid generated sticker.
pub const RESULT_DATA_URL: &str = "data:image/png;base64,c3RpY2tlcg==";

/// One recorded `generate` invocation.
#[derive(Debug, Clone)]
pub struct GenerationCall {
    pub source_image: String,
    pub theme: String,
    pub expression: String,
    pub started_at: Instant,
}

impl GenerationCall {
    fn new(source_image: &str, theme: &str, expression: &str) -> Self {
        Self {
            source_image: source_image.to_string(),
            theme: theme.to_string(),
            expression: expression.to_string(),
            started_at: Instant::now(),
        }
    }
}

/// Generator that always returns the same image.
#[derive(Default)]
pub struct FixedGenerator {
    result: String,
    calls: Mutex<Vec<GenerationCall>>,
}

impl FixedGenerator {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageGenerator for FixedGenerator {
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .push(GenerationCall::new(source_image, theme, expression));
        Ok(self.result.clone())
    }
}

/// Generator that always fails with the same error.
pub struct FailingGenerator {
    error: GenerationError,
}

impl FailingGenerator {
    pub fn new(error: GenerationError) -> Self {
        Self { error }
    }

    /// The failure a safety-filtered request produces.
    pub fn empty_response() -> Self {
        Self::new(GenerationError::EmptyResponse(
            "model did not return an image part".to_string(),
        ))
    }
}

#[async_trait]
impl ImageGenerator for FailingGenerator {
    async fn generate(
        &self,
        _source_image: &str,
        _theme: &str,
        _expression: &str,
    ) -> Result<String, GenerationError> {
        Err(self.error.clone())
    }
}

type Outcome = Result<String, GenerationError>;

/// Generator scripted per expression label.
///
/// One-shot outcomes queued with `once` are consumed first, then permanent
/// failures from `failing`, then the default result.
pub struct ScriptedGenerator {
    default: String,
    failures: HashMap<String, GenerationError>,
    queued: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl ScriptedGenerator {
    pub fn succeeding(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            failures: HashMap::new(),
            queued: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request for `expression`.
    pub fn failing(mut self, expression: impl Into<String>, error: GenerationError) -> Self {
        self.failures.insert(expression.into(), error);
        self
    }

    /// Queue a one-shot outcome for `expression`.
    pub fn once(self, expression: impl Into<String>, outcome: Outcome) -> Self {
        self.queued
            .lock()
            .entry(expression.into())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().clone()
    }

    /// Number of requests made for `expression`.
    pub fn calls_for(&self, expression: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.expression == expression)
            .count()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .push(GenerationCall::new(source_image, theme, expression));
        let queued = self
            .queued
            .lock()
            .get_mut(expression)
            .and_then(VecDeque::pop_front);
        if let Some(outcome) = queued {
            return outcome;
        }
        if let Some(error) = self.failures.get(expression) {
            return Err(error.clone());
        }
        Ok(self.default.clone())
    }
}

/// Generator whose requests block until the test releases them.
pub struct GatedGenerator {
    result: String,
    gate: Semaphore,
    calls: Mutex<Vec<GenerationCall>>,
}

impl GatedGenerator {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Let `count` pending or future requests complete.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    pub fn started(&self) -> usize {
        self.calls.lock().len()
    }

    /// Wait until at least `count` requests have started.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.started() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ImageGenerator for GatedGenerator {
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .push(GenerationCall::new(source_image, theme, expression));
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| GenerationError::UpstreamFailure(err.to_string()))?;
        permit.forget();
        Ok(self.result.clone())
    }
}

/// Generator with one gate per expression, so tests pick completion order.
pub struct KeyedGateGenerator {
    result: String,
    gates: HashMap<String, Semaphore>,
    outcomes: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl KeyedGateGenerator {
    pub fn new<I, S>(result: impl Into<String>, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            result: result.into(),
            gates: expressions
                .into_iter()
                .map(|expression| (expression.into(), Semaphore::new(0)))
                .collect(),
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Let the pending request for `expression` succeed.
    pub fn release(&self, expression: &str) {
        if let Some(gate) = self.gates.get(expression) {
            gate.add_permits(1);
        }
    }

    /// Let the pending request for `expression` fail with `error`.
    pub fn fail(&self, expression: &str, error: GenerationError) {
        self.outcomes
            .lock()
            .insert(expression.to_string(), Err(error));
        self.release(expression);
    }

    pub fn started(&self) -> usize {
        self.calls.lock().len()
    }

    /// Wait until at least `count` requests have started.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.started() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ImageGenerator for KeyedGateGenerator {
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .push(GenerationCall::new(source_image, theme, expression));
        if let Some(gate) = self.gates.get(expression) {
            let permit = gate
                .acquire()
                .await
                .map_err(|err| GenerationError::UpstreamFailure(err.to_string()))?;
            permit.forget();
        }
        let outcome = self.outcomes.lock().remove(expression);
        outcome.unwrap_or_else(|| Ok(self.result.clone()))
    }
}
