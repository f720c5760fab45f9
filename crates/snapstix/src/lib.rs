//! Public SDK surface for SnapStix.
//!
//! This crate re-exports the core building blocks and provides small helpers
//! to keep consumer setup consistent.

/// Re-export for convenience.
pub use snapstix_collection as collection;
pub use snapstix_config as config;
pub use snapstix_core as core;
/// Re-export for convenience.
pub use snapstix_genai as genai;
/// Re-export for convenience.
pub use snapstix_protocol as protocol;

pub mod source;

pub use source::{SourceImageError, read_source_image};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
