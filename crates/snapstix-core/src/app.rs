//! Application state: collection, generator and orchestrator wired from config.

use crate::brew::{BatchReport, BrewOptions, BrewOrchestrator};
use crate::error::{AppError, BrewError};
use log::info;
use snapstix_collection::{CollectionPolicy, CollectionStore, FileKeyValueStore, KeyValueStore};
use snapstix_config::SnapstixConfig;
use snapstix_genai::{GeminiImageClient, ImageGenerator};
use snapstix_protocol::{EventSink, SlotState, Sticker};
use std::sync::Arc;

/// Owned application state for one SnapStix session.
pub struct SnapStix {
    config: SnapstixConfig,
    collection: Arc<CollectionStore>,
    orchestrator: BrewOrchestrator,
}

impl SnapStix {
    /// Build with the Gemini client and the file-backed collection.
    pub fn new(config: SnapstixConfig) -> Result<Self, AppError> {
        Self::builder(config).build()
    }

    pub fn builder(config: SnapstixConfig) -> SnapStixBuilder {
        SnapStixBuilder::new(config)
    }

    pub async fn brew(&self, source_image: &str, theme: &str) -> Result<BatchReport, BrewError> {
        self.orchestrator.brew_pack(source_image, theme).await
    }

    pub async fn retry(&self, slot: usize) -> Result<SlotState, BrewError> {
        self.orchestrator.retry_slot(slot).await
    }

    /// Every sticker in the collection, newest first.
    pub fn gallery(&self) -> Vec<Sticker> {
        self.collection.snapshot()
    }

    pub fn collection(&self) -> &Arc<CollectionStore> {
        &self.collection
    }

    pub fn orchestrator(&self) -> &BrewOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &SnapstixConfig {
        &self.config
    }
}

/// Builder allowing collaborators to be injected.
pub struct SnapStixBuilder {
    config: SnapstixConfig,
    generator: Option<Arc<dyn ImageGenerator>>,
    backend: Option<Arc<dyn KeyValueStore>>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl SnapStixBuilder {
    pub fn new(config: SnapstixConfig) -> Self {
        Self {
            config,
            generator: None,
            backend: None,
            event_sink: None,
        }
    }

    /// Use `generator` instead of the configured provider.
    pub fn generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use `backend` instead of the file store.
    pub fn backend(mut self, backend: Arc<dyn KeyValueStore>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<SnapStix, AppError> {
        let config = self.config;
        config.validate()?;

        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&config)?,
        };
        let generator = match self.generator {
            Some(generator) => generator,
            None => Arc::new(GeminiImageClient::from_env(&config.generation)?),
        };
        let collection = Arc::new(CollectionStore::load(backend, collection_policy(&config)));
        let mut orchestrator = BrewOrchestrator::new(
            generator,
            collection.clone(),
            config.brew.expressions.clone(),
            BrewOptions {
                stagger: config.brew.stagger(),
            },
        );
        if let Some(sink) = self.event_sink {
            orchestrator = orchestrator.with_event_sink(sink);
        }
        info!(
            "snapstix ready (model={}, stickers={})",
            config.generation.model,
            collection.len()
        );
        Ok(SnapStix {
            config,
            collection,
            orchestrator,
        })
    }
}

/// Open the configured collection without a generator.
///
/// Used by read-only commands that never brew.
pub fn open_collection(config: &SnapstixConfig) -> Result<Arc<CollectionStore>, AppError> {
    config.validate()?;
    let backend = default_backend(config)?;
    Ok(Arc::new(CollectionStore::load(
        backend,
        collection_policy(config),
    )))
}

fn default_backend(config: &SnapstixConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    let path = config
        .collection
        .resolved_path()
        .ok_or(AppError::NoCollectionPath)?;
    Ok(Arc::new(FileKeyValueStore::new(
        path,
        Some(config.collection.quota_bytes),
    )?))
}

fn collection_policy(config: &SnapstixConfig) -> CollectionPolicy {
    CollectionPolicy {
        storage_key: config.collection.storage_key.clone(),
        max_persisted: config.collection.max_persisted,
    }
}
