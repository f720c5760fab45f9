//! Core brewing primitives for SnapStix.
//!
//! This crate owns the brew orchestrator, the application state object, and
//! the export/share collaborators used by the CLI.

pub mod app;
pub mod brew;
pub mod error;
pub mod export;

pub use app::{SnapStix, SnapStixBuilder, open_collection};
pub use brew::{
    ALL_FAILED_MESSAGE, BatchOutcome, BatchReport, BrewOptions, BrewOrchestrator, BrewSnapshot,
    DEFAULT_STAGGER,
};
pub use error::{AppError, BrewError};
pub use export::{
    ExportError, SHARE_TITLE, ShareError, ShareRequest, ShareTarget, UnsupportedShareTarget,
    export_sticker, sticker_file_name,
};
/// Event sink trait re-exported for orchestrator callers.
pub use snapstix_protocol::EventSink;
