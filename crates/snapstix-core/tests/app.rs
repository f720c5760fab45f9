//! Application wiring tests.

use pretty_assertions::assert_eq;
use snapstix_collection::{FileKeyValueStore, KeyValueStore, PersistOutcome};
use snapstix_config::{BrewConfig, CollectionConfig, GenerationConfig, SnapstixConfig};
use snapstix_core::{AppError, BatchOutcome, SnapStix, open_collection};
use snapstix_protocol::{Expression, Sticker};
use snapstix_test_utils::{
    CountLimitedStore, FixedGenerator, RESULT_DATA_URL, RecordingEventSink, SOURCE_DATA_URL,
};
use std::sync::Arc;
use tempfile::tempdir;

fn fast_config(collection_path: Option<String>) -> SnapstixConfig {
    SnapstixConfig::builder()
        .brew(BrewConfig {
            stagger_ms: 0,
            ..BrewConfig::default()
        })
        .collection(CollectionConfig {
            path: collection_path,
            ..CollectionConfig::default()
        })
        .build()
}

/// Stickers brewed in one session are visible after a restart.
#[tokio::test]
async fn collection_survives_restart() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("collection").to_string_lossy().to_string();

    let app = SnapStix::builder(fast_config(Some(path.clone())))
        .generator(Arc::new(FixedGenerator::new(RESULT_DATA_URL)))
        .build()
        .expect("app");
    app.brew(SOURCE_DATA_URL, "Wizard").await.expect("brew");
    app.brew(SOURCE_DATA_URL, "Knight").await.expect("brew");
    assert_eq!(app.gallery().len(), 10);

    let restarted = SnapStix::builder(fast_config(Some(path.clone())))
        .generator(Arc::new(FixedGenerator::new(RESULT_DATA_URL)))
        .build()
        .expect("app");
    let gallery = restarted.gallery();
    assert_eq!(gallery.len(), 10);
    assert!(gallery.iter().all(|sticker| sticker.source_image.is_none()));
    assert_eq!(
        gallery
            .iter()
            .map(Sticker::without_source)
            .collect::<Vec<_>>(),
        app.gallery()
            .iter()
            .map(Sticker::without_source)
            .collect::<Vec<_>>()
    );

    let raw = FileKeyValueStore::new(&path, None)
        .expect("store")
        .get("snapstix_v1_collection")
        .expect("get")
        .expect("stored");
    assert!(!raw.contains("sourceImage"));

    let read_only = open_collection(&fast_config(Some(path))).expect("collection");
    assert_eq!(read_only.len(), 10);
}

/// In-memory history outgrows the persisted copy.
#[tokio::test]
async fn memory_keeps_more_than_storage() {
    let backend = Arc::new(CountLimitedStore::new(7));
    let app = SnapStix::builder(fast_config(None))
        .generator(Arc::new(FixedGenerator::new(RESULT_DATA_URL)))
        .backend(backend.clone())
        .build()
        .expect("app");

    app.brew(SOURCE_DATA_URL, "Astronaut").await.expect("brew");
    app.brew(SOURCE_DATA_URL, "Diver").await.expect("brew");

    assert_eq!(app.gallery().len(), 10);
    assert_eq!(app.collection().persist(), PersistOutcome::Saved { count: 7 });
}

/// Configured expressions drive the pack size and events reach the sink.
#[tokio::test]
async fn configured_expressions_and_sink() {
    let mut config = fast_config(None);
    config.brew.expressions = vec![
        Expression::new("Sleepy", "😴"),
        Expression::new("Angry", "😠"),
    ];
    let sink = Arc::new(RecordingEventSink::new());
    let app = SnapStix::builder(config)
        .generator(Arc::new(FixedGenerator::new(RESULT_DATA_URL)))
        .backend(Arc::new(CountLimitedStore::new(10)))
        .event_sink(sink.clone())
        .build()
        .expect("app");

    let report = app.brew(SOURCE_DATA_URL, "Sloth").await.expect("brew");
    assert_eq!(report.outcome, BatchOutcome::Complete);
    assert_eq!(report.slots.len(), 2);
    assert_eq!(app.orchestrator().snapshot().total, 2);
    assert_eq!(sink.progress_counts(), vec![1, 2]);
    assert_eq!(app.gallery()[1].label, "Sloth (Sleepy)");
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = fast_config(None);
    config.brew.expressions.clear();
    let err = SnapStix::builder(config)
        .generator(Arc::new(FixedGenerator::new(RESULT_DATA_URL)))
        .backend(Arc::new(CountLimitedStore::new(10)))
        .build()
        .err()
        .expect("error");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn missing_api_key_is_reported() {
    let config = SnapstixConfig::builder()
        .generation(GenerationConfig {
            api_key_env: "SNAPSTIX_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..GenerationConfig::default()
        })
        .build();
    let err = SnapStix::builder(config)
        .backend(Arc::new(CountLimitedStore::new(10)))
        .build()
        .err()
        .expect("error");
    assert!(matches!(err, AppError::Generation(_)));
}
