use std::io::Cursor;

use super::*;
use crate::{
    assets::store::MemoryImageStore,
    config::slot::{ImageId, SlotEffectConfig},
    layout::slots::{Z_CORE, Z_SELECTION},
    scene::node::NodeContent,
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(
        width,
        height,
        [30u8, 200, 90, 255].repeat((width * height) as usize),
    )
    .unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn poster() -> PosterSpec {
    PosterSpec::new(180, 240).unwrap()
}

fn slots_group(scene: &Scene) -> &SceneNode {
    scene.children.last().unwrap()
}

#[test]
fn background_then_center_group() {
    let doc = ConfigDocument::default();
    let cache = TextureCache::new(poster());
    let scene = compose_scene(&doc, None, &cache, poster());
    let labels: Vec<&str> = scene.children.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, ["background", "nebulae", "stars", SLOTS_GROUP]);

    let group = slots_group(&scene);
    assert_eq!(group.transform, Affine::translate((90.0, 120.0)));
    assert_eq!(group.children.len(), 15);
    let z: Vec<i32> = group.children.iter().map(|c| c.z).collect();
    assert!(z.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(group.children.last().unwrap().label, "core");
    assert_eq!(group.children.last().unwrap().z, Z_CORE);
    assert!(scene.visible_overlay_paths().is_empty());
}

#[test]
fn partial_documents_render_only_present_dreams() {
    let mut doc = ConfigDocument::default();
    doc.dreams.retain(|d| d.position_index == 4 || d.position_index == 9);
    doc.dreams.push(SlotEffectConfig::dream(30));
    let cache = TextureCache::new(poster());
    let scene = compose_scene(&doc, None, &cache, poster());
    let labels: Vec<&str> = slots_group(&scene)
        .children
        .iter()
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, ["dream-0", "dream-1", "core"]);
}

#[test]
fn selected_dream_rises_and_gets_rings() {
    let doc = ConfigDocument::default();
    let cache = TextureCache::new(poster());
    let scene = compose_scene(&doc, Some(SlotId::Dream(2)), &cache, poster());
    let group = slots_group(&scene);

    let dream = group.children.iter().find(|c| c.label == "dream-2").unwrap();
    assert_eq!(dream.z, 202);
    let last = group.children.last().unwrap();
    assert_eq!(last.z, Z_SELECTION);
    assert!(last.hud);
    assert_eq!(scene.visible_overlay_paths().len(), 1);
}

#[test]
fn resolved_textures_replace_placeholders_only_for_matching_config() {
    let mut store = MemoryImageStore::new();
    store.insert("imgA", png(10, 10));
    let mut doc = ConfigDocument::default();
    doc.core.image = Some(ImageId::new("imgA"));

    let mut cache = TextureCache::new(poster());
    cache.sync(&doc);
    cache.resolve_pending(&store);

    let scene = compose_scene(&doc, None, &cache, poster());
    let core = slots_group(&scene).children.last().unwrap();
    assert!(matches!(core.children[1].content, NodeContent::Texture(_)));

    // Not re-synced yet: the stale texture must not be shown for the new zoom.
    let mut zoomed = doc.clone();
    zoomed.core.zoom = 2.5;
    let scene = compose_scene(&zoomed, None, &cache, poster());
    let core = slots_group(&scene).children.last().unwrap();
    assert_eq!(core.children.len(), 1);
    assert_eq!(core.children[0].label, "placeholder");
}
