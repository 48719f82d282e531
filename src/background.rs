//! Procedural star field and nebula blobs behind every poster.

use crate::{
    effects::fx::{FilterChain, FilterStage},
    foundation::{
        core::{Point, PosterSpec, ShapeColor},
        seeded::{seeded, sites},
    },
    scene::node::{NodeContent, SceneNode, Shape},
};

pub const STAR_COUNT: usize = 500;
pub const NEBULA_COUNT: usize = 6;
pub const NEBULA_ALPHA: f32 = 0.4;
pub const NEBULA_BLUR: f64 = 60.0;

/// Cycled by nebula index.
pub const NEBULA_PALETTE: [u32; 5] = [0x4a1a6b, 0x1a3a6b, 0x6b1a4a, 0x1a5a6b, 0x3a1a6b];
pub const BACKGROUND_FILL: ShapeColor = ShapeColor::new(0x07071a, 1.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub alpha: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NebulaBlob {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: ShapeColor,
}

/// Deterministic background geometry for one poster size.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundField {
    pub stars: Vec<Star>,
    pub nebulae: Vec<NebulaBlob>,
}

impl BackgroundField {
    pub fn generate(poster: PosterSpec) -> Self {
        let (w, h) = (poster.width_f64(), poster.height_f64());
        let stars = (0..STAR_COUNT as i64)
            .map(|i| Star {
                x: seeded(i * sites::STAR_X) * w,
                y: seeded(i * sites::STAR_Y) * h,
                radius: 0.5 + seeded(i * sites::STAR_RADIUS) * 1.5,
                alpha: 0.2 + seeded(i * sites::STAR_ALPHA) * 0.6,
            })
            .collect();
        let nebulae = (0..NEBULA_COUNT as i64)
            .map(|i| nebula_at(i, poster))
            .collect();
        Self { stars, nebulae }
    }

    /// Background nodes bottom to top: solid fill, blurred nebulae, stars. Each class is a single
    /// batched node.
    pub fn nodes(&self, poster: PosterSpec) -> Vec<SceneNode> {
        let fill = SceneNode::new("background").with_content(NodeContent::Shapes(vec![
            Shape::Rect {
                rect: poster.rect(),
                color: BACKGROUND_FILL,
            },
        ]));

        let mut blur = FilterChain::new();
        blur.push(FilterStage::blur(NEBULA_BLUR));
        let nebulae = SceneNode::new("nebulae")
            .with_filters(blur)
            .with_content(NodeContent::Shapes(
                self.nebulae
                    .iter()
                    .map(|n| Shape::Circle {
                        center: Point::new(n.x, n.y),
                        radius: n.radius,
                        color: n.color,
                    })
                    .collect(),
            ));

        let stars = SceneNode::new("stars").with_content(NodeContent::Shapes(
            self.stars
                .iter()
                .map(|s| Shape::Circle {
                    center: Point::new(s.x, s.y),
                    radius: s.radius,
                    color: ShapeColor::new(0xffffff, s.alpha as f32),
                })
                .collect(),
        ));

        vec![fill, nebulae, stars]
    }
}

fn nebula_at(i: i64, poster: PosterSpec) -> NebulaBlob {
    let o = sites::NEBULA_OFFSET;
    NebulaBlob {
        x: seeded(i * sites::NEBULA_X + o) * poster.width_f64(),
        y: seeded(i * sites::NEBULA_Y + o) * poster.height_f64(),
        radius: (0.12 + seeded(i * sites::NEBULA_RADIUS + o) * 0.25) * poster.min_dim(),
        color: ShapeColor::new(NEBULA_PALETTE[i as usize % NEBULA_PALETTE.len()], NEBULA_ALPHA),
    }
}
