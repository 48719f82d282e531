use crate::{
    config::slot::{DEFAULT_GLOW_INTENSITY, SlotEffectConfig, SlotId},
    effects::fx::{FilterChain, FilterStage},
    foundation::core::{Affine, Point, ShapeColor},
    layout::slots::{SlotPlacement, Z_SELECTION},
    scene::node::{NodeContent, SceneNode, Shape},
    texture::cache::SlotTextures,
};

const CORE_GLOW_ALPHA: f64 = 0.35;
const DREAM_GLOW_ALPHA: f64 = 0.25;
const CORE_GLOW_BLUR: f64 = 30.0;
const DREAM_GLOW_BLUR: f64 = 18.0;

const CORE_PLACEHOLDER_FILL: ShapeColor = ShapeColor::new(0x2a1f4d, 0.55);
const CORE_PLACEHOLDER_STROKE: ShapeColor = ShapeColor::new(0xc9a7ff, 0.9);
const DREAM_PLACEHOLDER_FILL: ShapeColor = ShapeColor::new(0x14213d, 0.45);
const DREAM_PLACEHOLDER_STROKE: ShapeColor = ShapeColor::new(0x7fb3ff, 0.7);
const PLACEHOLDER_STROKE_WIDTH: f64 = 3.0;

/// `(radius offset, stroke width, color)` from the outer glow ring inward.
const SELECTION_RINGS: [(f64, f64, ShapeColor); 3] = [
    (20.0, 10.0, ShapeColor::new(0x8fd3ff, 0.25)),
    (12.0, 4.0, ShapeColor::new(0x8fd3ff, 0.7)),
    (8.0, 2.0, ShapeColor::new(0xffffff, 0.9)),
];

/// Group transform of a slot: translate, then rotate, then the user size factor.
pub fn slot_transform(placement: &SlotPlacement) -> Affine {
    Affine::translate(placement.position)
        * Affine::rotate(placement.rotation)
        * Affine::scale(placement.scale)
}

/// Build the subtree for one slot. Without resolved textures the slot shows its placeholder.
pub fn slot_node(
    id: SlotId,
    cfg: &SlotEffectConfig,
    placement: &SlotPlacement,
    textures: Option<&SlotTextures>,
) -> SceneNode {
    let mut group = SceneNode::new(id.to_string())
        .with_z(placement.z)
        .with_transform(slot_transform(placement))
        .with_alpha(cfg.opacity);

    match textures {
        None => group.push(placeholder_node(id, placement.base_radius())),
        Some(tex) => {
            let (glow_alpha, glow_blur) = if id.is_core() {
                (CORE_GLOW_ALPHA, CORE_GLOW_BLUR)
            } else {
                (DREAM_GLOW_ALPHA, DREAM_GLOW_BLUR)
            };
            let mut glow_filters = FilterChain::new();
            glow_filters.push(FilterStage::blur(glow_blur));
            group.push(
                SceneNode::new("glow")
                    .with_alpha(glow_alpha * (cfg.glow_intensity / DEFAULT_GLOW_INTENSITY))
                    .with_filters(glow_filters)
                    .with_content(NodeContent::Texture(tex.glow.clone())),
            );

            let mut main_filters = FilterChain::new();
            main_filters
                .push(FilterStage::blur(cfg.blur))
                .push(FilterStage::color_adjust(
                    cfg.saturation,
                    cfg.brightness,
                    cfg.contrast,
                ));
            group.push(
                SceneNode::new("main")
                    .with_filters(main_filters)
                    .with_content(NodeContent::Texture(tex.main.clone())),
            );
        }
    }
    group
}

fn placeholder_node(id: SlotId, radius: f64) -> SceneNode {
    let (fill, stroke) = if id.is_core() {
        (CORE_PLACEHOLDER_FILL, CORE_PLACEHOLDER_STROKE)
    } else {
        (DREAM_PLACEHOLDER_FILL, DREAM_PLACEHOLDER_STROKE)
    };
    SceneNode::new("placeholder").with_content(NodeContent::Shapes(vec![
        Shape::Circle {
            center: Point::ORIGIN,
            radius,
            color: fill,
        },
        Shape::Ring {
            center: Point::ORIGIN,
            radius,
            width: PLACEHOLDER_STROKE_WIDTH,
            color: stroke,
        },
    ]))
}

/// Selection rings around a slot. Interactive-only: tagged HUD at the selection z.
pub fn selection_node(id: SlotId, placement: &SlotPlacement) -> SceneNode {
    let r = placement.visual_radius();
    SceneNode::new(format!("selection:{id}"))
        .with_z(Z_SELECTION)
        .with_transform(Affine::translate(placement.position))
        .with_content(NodeContent::Shapes(
            SELECTION_RINGS
                .iter()
                .map(|&(offset, width, color)| Shape::Ring {
                    center: Point::ORIGIN,
                    radius: r + offset,
                    width,
                    color,
                })
                .collect(),
        ))
        .hud()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/slot.rs"]
mod tests;
