use serde_json::json;

use super::*;

fn full_slot(position_index: i32) -> Value {
    json!({
        "image": "img-1",
        "size": 1.5,
        "zoom": 2.0,
        "opacity": 0.8,
        "blur": 3.0,
        "glowIntensity": 0.5,
        "offsetX": 12.0,
        "offsetY": -40.0,
        "rotation": 15.0,
        "saturation": 1.2,
        "brightness": 0.9,
        "contrast": 1.1,
        "positionIndex": position_index,
    })
}

#[test]
fn default_document_has_core_and_every_preset() {
    let doc = ConfigDocument::default();
    assert_eq!(doc.core.position_index, CORE_POSITION_INDEX);
    assert_eq!(doc.dreams.len(), PRESET_COUNT);
    assert!(doc.free_positions().is_empty());
    doc.validate().unwrap();
}

#[test]
fn round_trip_through_migration_is_lossless() {
    let mut doc = ConfigDocument::default();
    doc.core = doc.core.clone().with_image("core-img");
    doc.core.size = 1.2;
    doc.dreams[0].zoom = 2.0;
    doc.dreams[0].image = Some(ImageId::new("dream-img"));
    doc.dreams[5].rotation = -33.0;

    let text = doc.to_json_string_pretty().unwrap();
    let migrated = migrate_document_str(&text);
    assert!(migrated.is_clean(), "{migrated:?}");
    assert_eq!(migrated.document, doc);

    let via_value = migrate_document(Some(&doc.to_json_value()));
    assert_eq!(via_value.document, doc);
}

#[test]
fn missing_fields_are_backfilled_and_present_fields_kept() {
    let v = json!({
        "core": { "image": "a", "size": 1.3 },
        "dreams": [ { "positionIndex": 2, "zoom": 2.5 } ],
    });
    let m = migrate_document(Some(&v));
    let doc = &m.document;

    assert_eq!(doc.core.image, Some(ImageId::new("a")));
    assert_eq!(doc.core.size, 1.3);
    assert_eq!(doc.core.zoom, 1.0);
    assert_eq!(doc.core.glow_intensity, 0.25);
    assert_eq!(doc.core.position_index, CORE_POSITION_INDEX);

    assert_eq!(doc.dreams.len(), 1);
    assert_eq!(doc.dreams[0].position_index, 2);
    assert_eq!(doc.dreams[0].zoom, 2.5);
    assert_eq!(doc.dreams[0].size, 1.0);

    assert!(m.backfilled.contains(&"core.zoom".to_string()));
    assert!(m.backfilled.contains(&"dreams[0].size".to_string()));
    assert!(!m.backfilled.contains(&"core.size".to_string()));
    assert!(m.repaired.is_empty(), "{:?}", m.repaired);
}

#[test]
fn duplicate_and_invalid_positions_are_reassigned_uniquely() {
    let v = json!({
        "core": full_slot(-1),
        "dreams": [full_slot(3), full_slot(3), full_slot(99), { "size": 1.0 }],
    });
    let m = migrate_document(Some(&v));
    let positions: Vec<i32> = m.document.dreams.iter().map(|d| d.position_index).collect();
    assert_eq!(positions, vec![3, 0, 1, 2]);
    m.document.validate().unwrap();
    assert!(m.repaired.contains(&"dreams[1].positionIndex".to_string()));
    assert!(m.repaired.contains(&"dreams[2].positionIndex".to_string()));
    assert!(m.backfilled.contains(&"dreams[3].positionIndex".to_string()));
}

#[test]
fn surplus_dreams_without_free_positions_are_dropped() {
    let dreams: Vec<Value> = (0..16).map(|i| full_slot(i % 14)).collect();
    let m = migrate_document(Some(&json!({ "core": full_slot(-1), "dreams": dreams })));
    assert_eq!(m.document.dreams.len(), PRESET_COUNT);
    m.document.validate().unwrap();
}

#[test]
fn wrong_types_fall_back_to_defaults() {
    let v = json!({
        "core": { "image": 42, "size": "big", "positionIndex": 7 },
        "dreams": "nope",
    });
    let m = migrate_document(Some(&v));
    assert_eq!(m.document.core.image, None);
    assert_eq!(m.document.core.size, 1.0);
    assert_eq!(m.document.core.position_index, CORE_POSITION_INDEX);
    assert_eq!(m.document.dreams, ConfigDocument::default().dreams);
    for key in ["core.image", "core.size", "core.positionIndex", "dreams"] {
        assert!(m.repaired.contains(&key.to_string()), "missing repair {key}");
    }
}

#[test]
fn garbage_text_and_absent_documents_yield_defaults() {
    assert_eq!(
        migrate_document_str("{not json").document,
        ConfigDocument::default()
    );
    assert_eq!(migrate_document(None).document, ConfigDocument::default());
    assert!(migrate_document(None).is_clean());
    assert_eq!(
        migrate_document(Some(&json!([1, 2]))).document,
        ConfigDocument::default()
    );
}

#[test]
fn validate_rejects_duplicates() {
    let mut doc = ConfigDocument::default();
    doc.dreams[1].position_index = 0;
    assert!(matches!(
        doc.validate(),
        Err(StardreamError::ConfigIntegrity(_))
    ));
}

#[test]
fn slot_lookup_and_position_queries() {
    let mut doc = ConfigDocument::default();
    doc.dreams.remove(4);
    assert_eq!(doc.free_positions(), vec![4]);
    assert_eq!(doc.dream_at_position(5), Some(SlotId::Dream(4)));
    assert_eq!(doc.dream_at_position(4), None);
    assert!(doc.slot(SlotId::Dream(13)).is_none());
    doc.slot_mut(SlotId::Core).unwrap().blur = 4.0;
    assert_eq!(doc.core.blur, 4.0);
}
