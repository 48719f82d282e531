use crate::{
    background::BackgroundField,
    config::{document::ConfigDocument, slot::SlotId},
    foundation::core::{Affine, PosterSpec},
    layout::slots::slot_placement,
    scene::{
        node::{Scene, SceneNode},
        slot::{selection_node, slot_node},
    },
    texture::cache::{TextureCache, texture_key_for},
};

/// Label of the center-anchored group holding every slot.
pub const SLOTS_GROUP: &str = "slots";

/// Build the display tree for `doc`: background at the bottom, then a group anchored at the poster
/// center holding the core and every placed dream slot, ordered by z.
///
/// Slots whose textures are not resolved for their current configuration render placeholders.
pub fn compose_scene(
    doc: &ConfigDocument,
    selection: Option<SlotId>,
    textures: &TextureCache,
    poster: PosterSpec,
) -> Scene {
    let mut scene = Scene::new(poster);
    scene
        .children
        .extend(BackgroundField::generate(poster).nodes(poster));

    let mut group =
        SceneNode::new(SLOTS_GROUP).with_transform(Affine::translate(poster.center().to_vec2()));
    for (id, cfg) in doc.slots() {
        let selected = selection == Some(id);
        let Some(placement) = slot_placement(id, cfg, poster, selected) else {
            tracing::debug!(slot = %id, position_index = cfg.position_index, "slot not placed");
            continue;
        };
        let want = texture_key_for(id, cfg, poster);
        let resolved = textures
            .textures_for(id)
            .filter(|_| want.is_some() && textures.desired_key(id) == want.as_ref());
        group.push(slot_node(id, cfg, &placement, resolved));
        if selected {
            group.push(selection_node(id, &placement));
        }
    }
    group.sort_children_by_z();
    scene.children.push(group);

    tracing::debug!(nodes = scene.node_count(), ?selection, "composed scene");
    scene
}

#[cfg(test)]
#[path = "../../tests/unit/scene/composer.rs"]
mod tests;
