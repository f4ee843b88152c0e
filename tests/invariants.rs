//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::sync::Arc;
use std::thread;

use serde_json::json;
use xseries_core::{
    engine::GenerateRequest,
    error::{EngineError, ErrorStatus},
    identity::LayoutIdentity,
    split::SplitDirection,
    store::{LayoutFilter, LayoutStore, MemoryLayoutStore},
    validation::ValidationError,
    LayoutEngine, PixelRect,
};

fn create_engine() -> LayoutEngine<Arc<MemoryLayoutStore>> {
    LayoutEngine::new(Arc::new(MemoryLayoutStore::new()))
}

fn three_row_request() -> GenerateRequest {
    GenerateRequest::new("C1-text", "bullets")
        .with_direction(SplitDirection::Horizontal)
        .with_zone_count(3)
        .with_ratios(vec![0.35, 0.35, 0.30])
}

#[test]
fn invariant_custom_ratios_exact_heights() {
    let engine = create_engine();
    let layout = engine.generate(&three_row_request()).unwrap();

    assert_eq!(layout.content_area, PixelRect::new(60, 180, 1800, 840));
    let heights: Vec<u32> = layout.zones.iter().map(|z| z.pixels.height).collect();
    assert_eq!(heights, vec![294, 294, 252]);

    for pair in layout.zones.windows(2) {
        assert_eq!(pair[1].z_index, pair[0].z_index + 1);
        assert_eq!(pair[1].pixels.y, pair[0].pixels.bottom());
    }
}

#[test]
fn invariant_generation_is_idempotent() {
    let engine = create_engine();

    let first = engine.generate(&three_row_request()).unwrap();
    let second = engine.generate(&three_row_request()).unwrap();

    assert_eq!(first.layout_id, second.layout_id);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn invariant_labels_do_not_affect_identity() {
    let engine = create_engine();

    let plain = engine.generate(&three_row_request()).unwrap();
    let labelled = engine
        .generate(&three_row_request().with_labels(["Problem", "Approach", "Result"]).with_hints(["text", "text", "text"]))
        .unwrap();

    assert_eq!(plain.layout_id, labelled.layout_id);
    // The first stored record wins
    assert_eq!(labelled.zones[0].label, "Zone 1");
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn invariant_structure_changes_id() {
    let engine = create_engine();

    let base = engine.generate(&three_row_request()).unwrap();
    let other_type = engine
        .generate(&GenerateRequest { content_type: "table".into(), ..three_row_request() })
        .unwrap();
    let other_base = engine
        .generate(&GenerateRequest { base_layout: "I1-image-left".into(), ..three_row_request() })
        .unwrap();
    let other_direction = engine
        .generate(&three_row_request().with_direction(SplitDirection::Vertical))
        .unwrap();

    let mut ids = vec![
        base.layout_id,
        other_type.layout_id,
        other_base.layout_id.clone(),
        other_direction.layout_id,
    ];
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert!(other_base.layout_id.starts_with("X2-"));
}

#[test]
fn invariant_ids_match_format() {
    let engine = create_engine();
    for pattern in engine.patterns().names() {
        for base in ["C1-text", "I1-image-left", "I2-image-right", "I3-image-left-narrow", "I4-image-right-narrow"] {
            let request = GenerateRequest::new(base, "mixed").with_pattern(pattern);
            let layout = engine.generate(&request).unwrap();
            assert!(LayoutIdentity::is_valid(&layout.layout_id), "{}", layout.layout_id);
            assert_eq!(layout.split_pattern, pattern);
        }
    }
    assert_eq!(engine.store().len(), 50);
}

#[test]
fn invariant_zone_count_errors() {
    let engine = create_engine();

    let nine = GenerateRequest::new("C1-text", "bullets").with_zone_count(9);
    let err = engine.generate(&nine).unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::ZoneCount(9))));
    assert_eq!(err.status(), ErrorStatus::Validation);

    let short = GenerateRequest::new("C1-text", "bullets").with_ratios(vec![0.5, 0.4]);
    assert!(matches!(
        engine.generate(&short),
        Err(EngineError::Validation(ValidationError::RatioSum { .. }))
    ));

    let mismatch = GenerateRequest::new("C1-text", "bullets")
        .with_zone_count(4)
        .with_ratios(vec![0.5, 0.5]);
    assert!(matches!(
        engine.generate(&mismatch),
        Err(EngineError::Validation(ValidationError::ZoneCountMismatch { expected: 4, actual: 2 }))
    ));

    // No store side effects from rejected requests
    assert!(engine.store().is_empty());
}

#[test]
fn invariant_heights_follow_ratios_inside_tolerance() {
    let engine = create_engine();

    // Sums to 0.99: heights are round(ratio x 840), the last zone takes the rest
    let short = three_row_request().with_ratios(vec![0.35, 0.35, 0.29]);
    let layout = engine.generate(&short).unwrap();
    let heights: Vec<u32> = layout.zones.iter().map(|z| z.pixels.height).collect();
    assert_eq!(heights, vec![294, 294, 252]);

    // Same zones, same layout
    let exact = engine.generate(&three_row_request()).unwrap();
    assert_eq!(exact.layout_id, layout.layout_id);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn invariant_grid_dimensions_bounded_before_split() {
    let engine = create_engine();

    for (rows, columns) in [(u32::MAX, 2), (2_000_000_000, 2_000_000_000), (0, 3), (3, 0), (3, 3)] {
        let request = GenerateRequest::new("C1-text", "cards")
            .with_grid(rows, columns)
            .with_ratios(vec![0.5, 0.5]);
        let err = engine.generate(&request).unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Validation, "{rows}x{columns}");
    }
    assert!(engine.store().is_empty());
}

#[test]
fn invariant_unsupported_base_layout() {
    let engine = create_engine();
    let request = GenerateRequest::new("L25-title", "bullets");
    let err = engine.generate(&request).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::UnsupportedBaseLayout(_))
    ));
    assert!(!err.is_retryable());
}

#[test]
fn invariant_bind_top_level_zone_key() {
    let engine = create_engine();
    let layout = engine.generate(&three_row_request()).unwrap();

    let bound = engine
        .bind(&layout.layout_id, &json!({"zone_2": "<p>x</p>"}))
        .unwrap();

    assert_eq!(bound.binding("zone_2").unwrap().content, Some(json!("<p>x</p>")));
    assert!(bound.binding("zone_1").unwrap().is_empty());
    assert!(bound.binding("zone_3").unwrap().is_empty());
}

#[test]
fn invariant_bind_counts_usage() {
    let engine = create_engine();
    let layout = engine.generate(&three_row_request()).unwrap();
    assert_eq!(layout.usage_count, 0);

    engine.bind(&layout.layout_id, &json!({})).unwrap();
    engine.bind(&layout.layout_id, &json!({"zones": ["a"]})).unwrap();

    assert_eq!(engine.get(&layout.layout_id).unwrap().usage_count, 2);
}

#[test]
fn invariant_bind_unknown_layout_not_found() {
    let engine = create_engine();
    let err = engine.bind("X1-00000000", &json!({})).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert_eq!(err.report().status, ErrorStatus::NotFound);
}

#[test]
fn invariant_malformed_ids_rejected_before_store() {
    let engine = create_engine();
    for bad in ["../etc/passwd", "X9-00000000", "x1-00000000"] {
        assert!(matches!(
            engine.get(bad),
            Err(EngineError::Validation(ValidationError::InvalidLayoutId(_)))
        ));
        assert!(engine.delete(bad).is_err());
    }
}

#[test]
fn invariant_delete_is_unconditional() {
    let engine = create_engine();
    let layout = engine.generate(&three_row_request()).unwrap();
    engine.bind(&layout.layout_id, &json!({})).unwrap();

    engine.delete(&layout.layout_id).unwrap();
    assert!(matches!(engine.get(&layout.layout_id), Err(EngineError::NotFound(_))));
    assert!(matches!(engine.delete(&layout.layout_id), Err(EngineError::NotFound(_))));

    // Regenerating recreates the same id
    let again = engine.generate(&three_row_request()).unwrap();
    assert_eq!(again.layout_id, layout.layout_id);
    assert_eq!(again.usage_count, 0);
}

#[test]
fn invariant_list_filters() {
    let engine = create_engine();
    engine.generate(&three_row_request()).unwrap();
    engine
        .generate(&GenerateRequest::new("I2-image-right", "table").with_pattern("grid-2x2"))
        .unwrap();
    engine
        .generate(&GenerateRequest::new("C1-text", "table").with_pattern("hero-2row"))
        .unwrap();

    assert_eq!(engine.list(&LayoutFilter::default()).unwrap().len(), 3);

    let tables = engine
        .list(&LayoutFilter { content_type: Some("Table".into()), base_layout: None })
        .unwrap();
    assert_eq!(tables.len(), 2);

    let c1_tables = engine
        .list(&LayoutFilter {
            content_type: Some("table".into()),
            base_layout: Some("C1-text".into()),
        })
        .unwrap();
    assert_eq!(c1_tables.len(), 1);
    assert_eq!(c1_tables[0].split_pattern, "hero-2row");
}

#[test]
fn invariant_concurrent_generation_converges() {
    let store = Arc::new(MemoryLayoutStore::new());
    let engine = Arc::new(LayoutEngine::new(Arc::clone(&store)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let request = three_row_request().with_labels([format!("worker {i}")]);
                engine.generate(&request).unwrap().layout_id
            })
        })
        .collect();

    let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.list(&LayoutFilter::default()).unwrap().len(), 1);
}

#[test]
fn invariant_grid_pattern_row_major() {
    let engine = create_engine();
    let layout = engine
        .generate(&GenerateRequest::new("C1-text", "cards").with_pattern("grid-3x2"))
        .unwrap();

    assert_eq!(layout.zone_count, 6);
    assert_eq!(layout.zones[0].grid_row, "4/9");
    assert_eq!(layout.zones[1].pixels.x, layout.zones[0].pixels.right());
    assert_eq!(layout.zones[2].pixels.y, layout.zones[0].pixels.bottom());
    assert_eq!(layout.zones[5].pixels.bottom(), layout.content_area.bottom());
    assert_eq!(layout.zones[5].z_index, layout.zones[0].z_index + 5);
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_generate_always_previews() {
    use xseries_core::engine::{get_preview_call_count, reset_preview_call_count};

    reset_preview_call_count();
    let engine = create_engine();
    engine.generate(&three_row_request()).unwrap();
    engine.generate(&three_row_request()).unwrap();
    assert!(get_preview_call_count() >= 2);
}
