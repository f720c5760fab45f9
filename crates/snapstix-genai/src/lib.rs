//! Image generation client for SnapStix.
//!
//! Wraps a single call to an external generative image model behind the
//! `ImageGenerator` trait; retries are the caller's responsibility.

pub mod error;
pub mod gemini;
pub mod generator;
pub mod prompt;

pub use error::GenerationError;
pub use gemini::GeminiImageClient;
pub use generator::ImageGenerator;
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptBuilder};
