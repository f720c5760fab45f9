//! Test helpers shared across SnapStix crates.

pub mod events;
pub mod generator;
pub mod storage;

pub use events::RecordingEventSink;
pub use generator::{
    FailingGenerator, FixedGenerator, GatedGenerator, GenerationCall, KeyedGateGenerator,
    RESULT_DATA_URL, SOURCE_DATA_URL, ScriptedGenerator,
};
pub use storage::{BrokenStore, CountLimitedStore};
