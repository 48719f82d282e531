use std::sync::Arc;

use crate::{
    effects::fx::FilterChain,
    foundation::core::{Affine, Point, PosterSpec, Rect, ShapeColor, Vec2},
    layout::slots::Z_SELECTION,
    texture::mask::MaskedTexture,
};

/// Scale and translation applied to the whole scene, poster space to device space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootTransform {
    pub scale: Vec2,
    pub position: Vec2,
}

impl Default for RootTransform {
    fn default() -> Self {
        Self {
            scale: Vec2::new(1.0, 1.0),
            position: Vec2::ZERO,
        }
    }
}

impl RootTransform {
    pub fn affine(&self) -> Affine {
        Affine::translate(self.position) * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Vector primitive drawn by a node, in node-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle {
        center: Point,
        radius: f64,
        color: ShapeColor,
    },
    /// Stroked circle: an annulus of `width` centered on `radius`.
    Ring {
        center: Point,
        radius: f64,
        width: f64,
        color: ShapeColor,
    },
    /// Axis-aligned rectangle fill.
    Rect {
        rect: Rect,
        color: ShapeColor,
    },
}

#[derive(Clone, Debug, Default)]
pub enum NodeContent {
    #[default]
    Empty,
    /// A batch of shapes drawn in one pass.
    Shapes(Vec<Shape>),
    /// Masked texture centered on the node origin.
    Texture(Arc<MaskedTexture>),
}

/// One node of the display tree.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub label: String,
    pub z: i32,
    /// Interactive-only overlay, never exported.
    pub hud: bool,
    pub visible: bool,
    /// Local transform relative to the parent.
    pub transform: Affine,
    pub alpha: f64,
    pub filters: FilterChain,
    pub content: NodeContent,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            z: 0,
            hud: false,
            visible: true,
            transform: Affine::IDENTITY,
            alpha: 1.0,
            filters: FilterChain::new(),
            content: NodeContent::Empty,
            children: Vec::new(),
        }
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_content(mut self, content: NodeContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    pub fn hud(mut self) -> Self {
        self.hud = true;
        self
    }

    pub fn push(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Interactive-only nodes: tagged HUD or stacked at the selection layer.
    pub fn is_overlay(&self) -> bool {
        self.hud || self.z >= Z_SELECTION
    }

    /// Stable sort of direct children by z.
    pub fn sort_children_by_z(&mut self) {
        self.children.sort_by_key(|c| c.z);
    }
}

/// The composed display tree of a poster.
#[derive(Clone, Debug)]
pub struct Scene {
    pub poster: PosterSpec,
    pub root: RootTransform,
    pub children: Vec<SceneNode>,
}

impl Scene {
    pub fn new(poster: PosterSpec) -> Self {
        Self {
            poster,
            root: RootTransform::default(),
            children: Vec::new(),
        }
    }

    pub fn node(&self, path: &[usize]) -> Option<&SceneNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut SceneNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Depth-first visit of every node with its index path.
    pub fn walk(&self, mut f: impl FnMut(&[usize], &SceneNode)) {
        fn go(
            nodes: &[SceneNode],
            path: &mut Vec<usize>,
            f: &mut dyn FnMut(&[usize], &SceneNode),
        ) {
            for (i, n) in nodes.iter().enumerate() {
                path.push(i);
                f(path, n);
                go(&n.children, path, f);
                path.pop();
            }
        }
        go(&self.children, &mut Vec::new(), &mut f);
    }

    /// Path of the first node labelled `label`.
    pub fn find(&self, label: &str) -> Option<Vec<usize>> {
        let mut found = None;
        self.walk(|path, n| {
            if found.is_none() && n.label == label {
                found = Some(path.to_vec());
            }
        });
        found
    }

    /// Paths of every currently visible overlay node, outermost first. Descendants of an overlay
    /// are not listed separately.
    pub fn visible_overlay_paths(&self) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = Vec::new();
        self.walk(|path, n| {
            let inside_listed = out.iter().any(|p| path.starts_with(p));
            if !inside_listed && n.visible && n.is_overlay() {
                out.push(path.to_vec());
            }
        });
        out
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.walk(|_, _| n += 1);
        n
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
