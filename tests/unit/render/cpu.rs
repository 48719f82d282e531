use std::sync::Arc;

use super::*;
use crate::{
    assets::decode::DecodedImage,
    effects::fx::{FilterChain, FilterStage},
    foundation::core::{PosterSpec, ShapeColor, Vec2},
    scene::node::RootTransform,
    texture::mask::build_masked_texture,
};

const RED: ShapeColor = ShapeColor::new(0xff0000, 1.0);

fn scene_with(nodes: Vec<SceneNode>) -> Scene {
    let mut scene = Scene::new(PosterSpec::new(40, 40).unwrap());
    scene.children = nodes;
    scene
}

fn shapes(label: &str, shapes: Vec<Shape>) -> SceneNode {
    SceneNode::new(label).with_content(NodeContent::Shapes(shapes))
}

fn render(scene: &Scene) -> FrameRGBA {
    CpuRenderer::default().render(scene, 40, 40).unwrap()
}

#[test]
fn empty_scene_is_transparent() {
    let frame = render(&scene_with(Vec::new()));
    assert_eq!((frame.width, frame.height), (40, 40));
    assert!(frame.premultiplied);
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn clear_color_fills_frame() {
    let mut r = CpuRenderer::new(RenderSettings {
        clear_rgba: Some([0, 0, 255, 255]),
    });
    let frame = r.render(&scene_with(Vec::new()), 4, 4).unwrap();
    assert_eq!(frame.pixel(2, 2), Some([0, 0, 255, 255]));
}

#[test]
fn zero_sized_target_is_rejected() {
    let err = CpuRenderer::default()
        .render(&scene_with(Vec::new()), 0, 10)
        .unwrap_err();
    assert!(matches!(err, StardreamError::Validation(_)));
}

#[test]
fn rect_and_circle_fill_expected_pixels() {
    let scene = scene_with(vec![shapes(
        "s",
        vec![
            Shape::Rect {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                color: RED,
            },
            Shape::Circle {
                center: Point::new(30.0, 30.0),
                radius: 6.0,
                color: ShapeColor::new(0x00ff00, 1.0),
            },
        ],
    )]);
    let frame = render(&scene);
    assert_eq!(frame.pixel(5, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(30, 30), Some([0, 255, 0, 255]));
    assert_eq!(frame.pixel(20, 5), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(39, 39), Some([0, 0, 0, 0]));
}

#[test]
fn ring_leaves_center_empty() {
    let scene = scene_with(vec![shapes(
        "ring",
        vec![Shape::Ring {
            center: Point::new(20.0, 20.0),
            radius: 12.0,
            width: 4.0,
            color: RED,
        }],
    )]);
    let frame = render(&scene);
    assert_eq!(frame.pixel(20, 20), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(32, 20).map(|p| p[3]), Some(255));
}

#[test]
fn root_transform_scales_and_offsets() {
    let mut scene = scene_with(vec![shapes(
        "s",
        vec![Shape::Rect {
            rect: Rect::new(0.0, 0.0, 5.0, 5.0),
            color: RED,
        }],
    )]);
    scene.root = RootTransform {
        scale: Vec2::new(2.0, 2.0),
        position: Vec2::new(10.0, 10.0),
    };
    let frame = render(&scene);
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(18, 18), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(21, 21), Some([0, 0, 0, 0]));
}

#[test]
fn node_alpha_composites_as_a_group() {
    // Two overlapping opaque rects under one half-transparent parent: the overlap must not
    // double up.
    let mut group = SceneNode::new("group").with_alpha(0.5);
    group.push(shapes(
        "a",
        vec![Shape::Rect {
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            color: RED,
        }],
    ));
    group.push(shapes(
        "b",
        vec![Shape::Rect {
            rect: Rect::new(10.0, 10.0, 30.0, 30.0),
            color: RED,
        }],
    ));
    let mut r = CpuRenderer::default();
    let frame = r.render(&scene_with(vec![group]), 40, 40).unwrap();
    let overlap = frame.pixel(15, 15).unwrap();
    let single = frame.pixel(5, 5).unwrap();
    assert_eq!(overlap, single);
    assert!((i32::from(single[3]) - 128).abs() <= 1);
    assert_eq!(r.last_stats().layers, 1);
}

#[test]
fn invisible_and_zero_alpha_nodes_are_skipped() {
    let mut hidden = shapes(
        "hidden",
        vec![Shape::Rect {
            rect: Rect::new(0.0, 0.0, 40.0, 40.0),
            color: RED,
        }],
    );
    hidden.visible = false;
    let faded = shapes(
        "faded",
        vec![Shape::Rect {
            rect: Rect::new(0.0, 0.0, 40.0, 40.0),
            color: RED,
        }],
    )
    .with_alpha(0.0);
    let frame = render(&scene_with(vec![hidden, faded]));
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn blur_spreads_past_the_shape_edge() {
    let mut filters = FilterChain::new();
    filters.push(FilterStage::blur(6.0));
    let node = shapes(
        "blurred",
        vec![Shape::Rect {
            rect: Rect::new(15.0, 15.0, 25.0, 25.0),
            color: RED,
        }],
    )
    .with_filters(filters);
    let frame = render(&scene_with(vec![node]));
    assert!(frame.pixel(13, 20).unwrap()[3] > 0);
    assert!(frame.pixel(20, 20).unwrap()[3] < 255);
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn layers_clip_to_the_target() {
    let mut filters = FilterChain::new();
    filters.push(FilterStage::color_adjust(0.0, 1.0, 1.0));
    let node = shapes(
        "offscreen",
        vec![Shape::Rect {
            rect: Rect::new(-100.0, -100.0, 5.0, 5.0),
            color: RED,
        }],
    )
    .with_filters(filters);
    let frame = render(&scene_with(vec![node]));
    let gray = frame.pixel(2, 2).unwrap();
    assert_eq!(gray[0], gray[1]);
    assert_eq!(gray[3], 255);
}

#[test]
fn texture_node_is_centered_on_its_origin() {
    let img = DecodedImage::from_premul(4, 4, [255u8, 0, 0, 255].repeat(16)).unwrap();
    let tex = build_masked_texture(&img, 20, 1.0).unwrap();
    let node = SceneNode::new("tex")
        .with_transform(Affine::translate((20.0, 20.0)))
        .with_content(NodeContent::Texture(Arc::new(tex)));
    let mut r = CpuRenderer::default();
    let frame = r.render(&scene_with(vec![node]), 40, 40).unwrap();
    let center = frame.pixel(20, 20).unwrap();
    assert!(center[0] > 240 && center[3] > 240, "{center:?}");
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 0]));
    assert_eq!(r.last_stats().textures, 1);
}

#[test]
fn subtree_bounds_include_filter_margins() {
    let mut filters = FilterChain::new();
    filters.push(FilterStage::blur(2.0));
    let mut parent = SceneNode::new("p").with_transform(Affine::scale(2.0));
    parent.push(
        shapes(
            "c",
            vec![Shape::Circle {
                center: Point::ZERO,
                radius: 5.0,
                color: RED,
            }],
        )
        .with_filters(filters),
    );
    let b = subtree_bounds(&parent, parent.transform).unwrap();
    // radius 10 on device, blur sigma 1.0 * 2 => margin 6
    assert_eq!(b, Rect::new(-16.0, -16.0, 16.0, 16.0));
    assert_eq!(transform_scale(Affine::scale(3.0)), 3.0);
}
