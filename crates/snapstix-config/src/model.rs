//! Configuration schema for SnapStix.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use snapstix_protocol::{Expression, default_expressions};
use std::path::PathBuf;
use std::time::Duration;

/// Only image provider currently wired up.
pub const GEMINI_PROVIDER: &str = "gemini";

/// Root config for SnapStix.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapstixConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub brew: BrewConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

impl SnapstixConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> SnapstixConfigBuilder {
        SnapstixConfigBuilder::new()
    }
}

/// Builder for assembling a `SnapstixConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct SnapstixConfigBuilder {
    config: SnapstixConfig,
}

impl SnapstixConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: SnapstixConfig::default(),
        }
    }

    /// Replace the image generation configuration.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Replace the pack brewing configuration.
    pub fn brew(mut self, brew: BrewConfig) -> Self {
        self.config.brew = brew;
        self
    }

    /// Replace the collection persistence configuration.
    pub fn collection(mut self, collection: CollectionConfig) -> Self {
        self.config.collection = collection;
        self
    }

    /// Finalize and return the built `SnapstixConfig`.
    pub fn build(self) -> SnapstixConfig {
        self.config
    }
}

/// Image model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Prompt template with `{theme}` and `{expression}` placeholders.
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            prompt_template: None,
            request_timeout_secs: None,
        }
    }
}

fn default_provider() -> String {
    GEMINI_PROVIDER.to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// Pack brewing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrewConfig {
    /// Start offset between consecutive slots, in milliseconds.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    /// Expressions brewed per pack, in slot order.
    #[serde(default = "default_expressions")]
    pub expressions: Vec<Expression>,
}

impl BrewConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger_ms(),
            expressions: default_expressions(),
        }
    }
}

fn default_stagger_ms() -> u64 {
    800
}

/// Collection persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Maximum number of stickers mirrored to disk.
    #[serde(default = "default_max_persisted")]
    pub max_persisted: usize,
    /// Storage directory; defaults to the platform data dir.
    #[serde(default)]
    pub path: Option<String>,
    /// Byte quota across all stored keys.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
}

impl CollectionConfig {
    /// Resolved storage directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.path.as_ref() {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("app", "snapstix", "snapstix")
            .map(|dirs| dirs.data_dir().join("collection"))
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            max_persisted: default_max_persisted(),
            path: None,
            quota_bytes: default_quota_bytes(),
        }
    }
}

fn default_storage_key() -> String {
    "snapstix_v1_collection".to_string()
}

fn default_max_persisted() -> usize {
    10
}

/// Default quota, sized like browser local storage.
fn default_quota_bytes() -> u64 {
    5 * 1024 * 1024
}
