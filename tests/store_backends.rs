//! Store Contract Tests
//!
//! Both backends must honour the same create-or-fetch contract.

use std::fs;
use std::sync::Arc;
use std::thread;

use xseries_core::{
    engine::GenerateRequest,
    error::{EngineError, ErrorStatus},
    layout::DynamicLayout,
    store::{FileLayoutStore, LayoutFilter, LayoutStore, MemoryLayoutStore, StoreError},
    LayoutEngine,
};

fn sample_layout(pattern: &str) -> DynamicLayout {
    let engine = LayoutEngine::new(MemoryLayoutStore::new());
    engine
        .preview(&GenerateRequest::new("C1-text", "bullets").with_pattern(pattern))
        .unwrap()
}

fn check_contract(store: &dyn LayoutStore) {
    let layout = sample_layout("agenda-3-item");
    let id = layout.layout_id.clone();

    assert!(store.create(layout.clone()).unwrap().was_created());
    let again = store.create(layout.clone()).unwrap();
    assert!(!again.was_created());
    assert_eq!(again.layout().layout_id, id);

    let mut impostor = layout.clone();
    impostor.content_type = "chart".into();
    assert!(matches!(store.create(impostor), Err(StoreError::Collision(_))));

    assert_eq!(store.get(&id).unwrap().zones, layout.zones);
    assert_eq!(store.increment_usage(&id).unwrap(), 1);
    assert_eq!(store.increment_usage(&id).unwrap(), 2);

    store.create(sample_layout("grid-2x2")).unwrap();
    assert_eq!(store.list(&LayoutFilter::default()).unwrap().len(), 2);
    let sorted = store.list(&LayoutFilter::default()).unwrap();
    assert!(sorted[0].layout_id < sorted[1].layout_id);

    store.delete(&id).unwrap();
    assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    assert!(matches!(store.increment_usage(&id), Err(StoreError::NotFound(_))));
}

#[test]
fn memory_store_contract() {
    check_contract(&MemoryLayoutStore::new());
}

#[test]
fn file_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    check_contract(&FileLayoutStore::open(dir.path()).unwrap());
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let layout = sample_layout("sidebar-2col");

    {
        let store = FileLayoutStore::open(dir.path()).unwrap();
        store.create(layout.clone()).unwrap();
        store.increment_usage(&layout.layout_id).unwrap();
    }

    let reopened = FileLayoutStore::open(dir.path()).unwrap();
    let stored = reopened.get(&layout.layout_id).unwrap();
    assert_eq!(stored.usage_count, 1);
    assert_eq!(stored.structural_spec(), layout.structural_spec());
    assert!(!reopened.create(layout).unwrap().was_created());
}

#[test]
fn file_store_skips_unreadable_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLayoutStore::open(dir.path()).unwrap();
    store.create(sample_layout("hero-2row")).unwrap();

    fs::write(dir.path().join("X1-deadbeef.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(store.list(&LayoutFilter::default()).unwrap().len(), 1);
    assert!(matches!(store.get("X1-deadbeef"), Err(StoreError::Corrupt { .. })));
}

#[test]
fn file_store_concurrent_creates_converge() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileLayoutStore::open(dir.path()).unwrap());
    let layout = sample_layout("timeline-4row");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let layout = layout.clone();
            thread::spawn(move || store.create(layout).unwrap().was_created())
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&c| c)
        .count();
    assert_eq!(created, 1);
    assert_eq!(store.list(&LayoutFilter::default()).unwrap().len(), 1);
}

#[test]
fn independent_file_store_handles_converge() {
    // One handle per thread shares no in-process lock, like separate CLI runs
    let dir = tempfile::tempdir().unwrap();
    let layout = sample_layout("comparison-2col");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = dir.path().to_path_buf();
            let layout = layout.clone();
            thread::spawn(move || {
                let store = FileLayoutStore::open(path).unwrap();
                let outcome = store.create(layout.clone()).unwrap();
                assert_eq!(store.get(&layout.layout_id).unwrap().zones, layout.zones);
                outcome.was_created()
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&c| c)
        .count();
    assert_eq!(created, 1);

    // Staged temp files never outlive a create
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn file_store_ignores_staged_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLayoutStore::open(dir.path()).unwrap();
    let layout = sample_layout("agenda-3-item");
    store.create(layout.clone()).unwrap();

    // A writer that died before publishing leaves only a hidden temp file
    fs::write(dir.path().join(".tmpA1b2C3"), "{ \"layout_id\": ").unwrap();

    assert_eq!(store.list(&LayoutFilter::default()).unwrap().len(), 1);
    store.increment_usage(&layout.layout_id).unwrap();
    assert_eq!(store.get(&layout.layout_id).unwrap().usage_count, 1);
}

#[test]
fn engine_surfaces_identity_collision() {
    let store = Arc::new(MemoryLayoutStore::new());
    let engine = LayoutEngine::new(Arc::clone(&store));
    let request = GenerateRequest::new("C1-text", "bullets").with_pattern("comparison-3col");

    // Plant a record under the same id with a different structure
    let mut planted = engine.preview(&request).unwrap();
    planted.split_direction = xseries_core::SplitDirection::Horizontal;
    store.create(planted).unwrap();

    let err = engine.generate(&request).unwrap_err();
    assert!(matches!(err, EngineError::IdentityCollision(_)));
    assert_eq!(err.status(), ErrorStatus::Internal);
    assert!(!err.is_retryable());
}

#[test]
fn engine_over_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let engine = LayoutEngine::new(FileLayoutStore::open(dir.path()).unwrap());

    let layout = engine
        .generate(&GenerateRequest::new("I4-image-right-narrow", "chart").with_pattern("grid-2x3"))
        .unwrap();
    assert!(layout.layout_id.starts_with("X5-"));
    assert!(dir.path().join(format!("{}.json", layout.layout_id)).exists());

    let fetched = engine.get(&layout.layout_id).unwrap();
    assert_eq!(fetched.zones, layout.zones);
}
