use std::io::Cursor;
use std::sync::Arc;

use super::*;
use crate::assets::store::MemoryImageStore;

fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba.repeat((width * height) as usize))
        .unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn small_poster() -> PosterSpec {
    PosterSpec::new(180, 240).unwrap()
}

fn store() -> MemoryImageStore {
    let mut s = MemoryImageStore::new();
    s.insert("imgA", png(8, 8, [255, 0, 0, 255]));
    s.insert("imgB", png(12, 6, [0, 0, 255, 255]));
    s
}

#[test]
fn keys_follow_slot_kind_and_zoom() {
    let poster = small_poster();
    let core = SlotEffectConfig::default().with_image("imgA");
    let key = texture_key_for(SlotId::Core, &core, poster).unwrap();
    assert_eq!(key.main_size, (0.48 * 180.0 * 1.2_f64).round() as u32);
    assert_eq!(key.glow_size, (0.48 * 180.0 * 1.8_f64).round() as u32);
    assert_eq!(key.zoom(), 1.0);

    let mut sized = core.clone();
    sized.size = 2.0;
    assert_eq!(texture_key_for(SlotId::Core, &sized, poster), Some(key.clone()));

    let mut zoomed = core.clone();
    zoomed.zoom = 2.0;
    assert_ne!(texture_key_for(SlotId::Core, &zoomed, poster), Some(key));

    assert!(texture_key_for(SlotId::Core, &SlotEffectConfig::default(), poster).is_none());
    let stray = SlotEffectConfig::dream(40).with_image("imgA");
    assert!(texture_key_for(SlotId::Dream(0), &stray, poster).is_none());
}

#[test]
fn one_outstanding_load_per_slot() {
    let mut cache = TextureCache::new(small_poster());
    let mut doc = ConfigDocument::default();
    cache.sync(&doc);
    assert!(cache.take_requests().is_empty());

    doc.core.image = Some(ImageId::new("imgA"));
    cache.sync(&doc);
    let first = cache.take_requests();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].slot, SlotId::Core);
    assert_eq!(cache.status(SlotId::Core), Some(TextureStatus::Loading));

    doc.core.zoom = 2.0;
    cache.sync(&doc);
    assert!(cache.take_requests().is_empty());
    assert_eq!(cache.in_flight_count(), 1);

    let s = store();
    let stale = load_slot_textures(&s, &first[0].key);
    assert!(!cache.complete(&first[0], stale));
    assert!(cache.textures_for(SlotId::Core).is_none());

    let second = cache.take_requests();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].key.zoom(), 2.0);
    assert!(second[0].generation > first[0].generation);
    let fresh = load_slot_textures(&s, &second[0].key);
    assert!(cache.complete(&second[0], fresh));
    assert_eq!(cache.status(SlotId::Core), Some(TextureStatus::Ready));
    assert_eq!(cache.textures_for(SlotId::Core).unwrap().main.zoom(), 2.0);
}

#[test]
fn superseded_and_unmounted_textures_are_released_on_sync() {
    let s = store();
    let mut cache = TextureCache::new(small_poster());
    let mut doc = ConfigDocument::default();
    doc.core.image = Some(ImageId::new("imgA"));
    doc.dreams[0].image = Some(ImageId::new("imgB"));
    cache.sync(&doc);
    assert_eq!(cache.resolve_pending(&s), 2);
    assert_eq!(cache.resident_count(), 2);

    let core_weak = Arc::downgrade(&cache.textures_for(SlotId::Core).unwrap().main);
    let dream_weak = Arc::downgrade(&cache.textures_for(SlotId::Dream(0)).unwrap().glow);

    doc.core.image = None;
    doc.dreams[0].zoom = 1.5;
    cache.sync(&doc);
    assert!(core_weak.upgrade().is_none());
    assert!(dream_weak.upgrade().is_none());
    assert_eq!(cache.status(SlotId::Core), None);
    assert_eq!(cache.status(SlotId::Dream(0)), Some(TextureStatus::Loading));
}

#[test]
fn failures_are_contained_per_slot_and_not_retried() {
    let s = store();
    let mut cache = TextureCache::new(small_poster());
    let mut doc = ConfigDocument::default();
    doc.core.image = Some(ImageId::new("missing"));
    doc.dreams[2].image = Some(ImageId::new("imgA"));
    cache.sync(&doc);
    assert_eq!(cache.resolve_pending(&s), 2);

    assert!(matches!(
        cache.status(SlotId::Core),
        Some(TextureStatus::Failed(_))
    ));
    assert_eq!(cache.status(SlotId::Dream(2)), Some(TextureStatus::Ready));
    assert!(cache.take_requests().is_empty());

    cache.sync(&doc);
    assert_eq!(cache.resolve_pending(&s), 0);
}

#[test]
fn results_for_removed_slots_are_dropped() {
    let s = store();
    let mut cache = TextureCache::new(small_poster());
    let mut doc = ConfigDocument::default();
    doc.dreams[1].image = Some(ImageId::new("imgB"));
    cache.sync(&doc);
    let tickets = cache.take_requests();
    assert_eq!(tickets.len(), 1);

    doc.dreams[1].image = None;
    cache.sync(&doc);
    let built = load_slot_textures(&s, &tickets[0].key);
    let weak = Arc::downgrade(&built.as_ref().unwrap().main);
    assert!(!cache.complete(&tickets[0], built));
    assert!(weak.upgrade().is_none());
    assert_eq!(cache.in_flight_count(), 0);
    assert_eq!(cache.resident_count(), 0);
}
