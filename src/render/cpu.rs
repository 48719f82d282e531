use kurbo::Shape as _;

use crate::{
    effects::composite::{LayerRect, over_at},
    foundation::{
        core::{Affine, Point, Rect},
        error::{StardreamError, StardreamResult},
    },
    render::frame::FrameRGBA,
    scene::node::{NodeContent, Scene, SceneNode, Shape},
};

const PATH_TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderSettings {
    /// Straight-alpha color the frame starts from; transparent when `None`.
    pub clear_rgba: Option<[u8; 4]>,
}

/// Counters from the last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub nodes: usize,
    pub layers: usize,
    pub shapes: usize,
    pub textures: usize,
}

/// Software renderer for [`Scene`] trees.
///
/// Plain nodes are batched into one `vello_cpu` context per surface. A node with `alpha < 1` or a
/// filter chain is drawn into its own surface, bounded by its transformed content plus the
/// filter margin, then filtered and composited back over its parent.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    settings: RenderSettings,
    stats: RenderStats,
}

struct Surface {
    rect: LayerRect,
    w16: u16,
    h16: u16,
    data: Vec<u8>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Surface {
    fn new(rect: LayerRect) -> StardreamResult<Self> {
        let w16: u16 = rect
            .width
            .try_into()
            .map_err(|_| StardreamError::validation("surface width exceeds u16"))?;
        let h16: u16 = rect
            .height
            .try_into()
            .map_err(|_| StardreamError::validation("surface height exceeds u16"))?;
        Ok(Self {
            rect,
            w16,
            h16,
            data: vec![0; rect.width as usize * rect.height as usize * 4],
            ctx: None,
        })
    }

    fn device_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.rect.x),
            f64::from(self.rect.y),
            f64::from(self.rect.x) + f64::from(self.rect.width),
            f64::from(self.rect.y) + f64::from(self.rect.height),
        )
    }

    /// Context for the pending batch; device transforms are shifted by the surface origin.
    fn begin(&mut self, device: Affine) -> &mut vello_cpu::RenderContext {
        let origin = Affine::translate((-f64::from(self.rect.x), -f64::from(self.rect.y)));
        let (w, h) = (self.w16, self.h16);
        let ctx = self
            .ctx
            .get_or_insert_with(|| vello_cpu::RenderContext::new(w, h));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(origin * device));
        ctx
    }

    /// Rasterize the pending batch over the surface bytes.
    fn flush(&mut self) {
        let Some(mut ctx) = self.ctx.take() else {
            return;
        };
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.w16, self.h16);
        ctx.render_to_pixmap(&mut pixmap);
        let local = LayerRect {
            x: 0,
            y: 0,
            ..self.rect
        };
        over_at(
            &mut self.data,
            self.rect.width,
            pixmap.data_as_u8_slice(),
            local,
            1.0,
        );
    }
}

impl CpuRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            stats: RenderStats::default(),
        }
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn last_stats(&self) -> RenderStats {
        self.stats
    }

    /// Render `scene` with its root transform into a `width×height` premultiplied frame.
    #[tracing::instrument(skip_all, fields(width, height))]
    pub fn render(&mut self, scene: &Scene, width: u32, height: u32) -> StardreamResult<FrameRGBA> {
        if width == 0 || height == 0 {
            return Err(StardreamError::validation("render target must be non-empty"));
        }
        self.stats = RenderStats::default();

        let mut surface = Surface::new(LayerRect {
            x: 0,
            y: 0,
            width,
            height,
        })?;
        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            let premul = crate::foundation::core::Rgba8Premul::from_straight_rgba(r, g, b, a);
            for px in surface.data.chunks_exact_mut(4) {
                px.copy_from_slice(&premul.to_array());
            }
        }

        let root = scene.root.affine();
        for node in &scene.children {
            self.draw_node(&mut surface, node, root)?;
        }
        surface.flush();

        tracing::debug!(
            nodes = self.stats.nodes,
            layers = self.stats.layers,
            shapes = self.stats.shapes,
            textures = self.stats.textures,
            "rendered frame"
        );
        Ok(FrameRGBA {
            width,
            height,
            data: surface.data,
            premultiplied: true,
        })
    }

    fn draw_node(
        &mut self,
        target: &mut Surface,
        node: &SceneNode,
        parent: Affine,
    ) -> StardreamResult<()> {
        if !node.visible || node.alpha <= 0.0 {
            return Ok(());
        }
        self.stats.nodes += 1;
        let device = parent * node.transform;

        if node.alpha >= 1.0 && node.filters.is_empty() {
            return self.draw_contents(target, node, device);
        }

        let render_scale = transform_scale(device);
        let Some(bounds) = subtree_bounds(node, device) else {
            return Ok(());
        };
        // One extra pixel keeps antialiased edges inside the layer.
        let margin = node.filters.margin_px(render_scale) + 1.0;
        let bounds = bounds
            .inflate(margin, margin)
            .intersect(target.device_rect());
        let Some(rect) = pixel_rect(bounds) else {
            return Ok(());
        };

        self.stats.layers += 1;
        target.flush();
        let mut layer = Surface::new(rect)?;
        self.draw_contents(&mut layer, node, device)?;
        layer.flush();
        node.filters
            .apply(&mut layer.data, rect.width, rect.height, render_scale)?;

        let dst = LayerRect {
            x: rect.x - target.rect.x,
            y: rect.y - target.rect.y,
            ..rect
        };
        over_at(
            &mut target.data,
            target.rect.width,
            &layer.data,
            dst,
            node.alpha.min(1.0) as f32,
        );
        Ok(())
    }

    fn draw_contents(
        &mut self,
        target: &mut Surface,
        node: &SceneNode,
        device: Affine,
    ) -> StardreamResult<()> {
        match &node.content {
            NodeContent::Empty => {}
            NodeContent::Shapes(shapes) => {
                let ctx = target.begin(device);
                for shape in shapes {
                    fill_shape(ctx, shape);
                }
                self.stats.shapes += shapes.len();
            }
            NodeContent::Texture(tex) => {
                let s = f64::from(tex.size());
                let ctx = target.begin(device * Affine::translate((-s * 0.5, -s * 0.5)));
                ctx.set_paint(tex.paint());
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, s, s));
                self.stats.textures += 1;
            }
        }
        for child in &node.children {
            self.draw_node(target, child, device)?;
        }
        Ok(())
    }
}

fn fill_shape(ctx: &mut vello_cpu::RenderContext, shape: &Shape) {
    match *shape {
        Shape::Circle {
            center,
            radius,
            color,
        } => {
            ctx.set_paint(color_to_cpu(color));
            let path = kurbo::Circle::new(center, radius).to_path(PATH_TOLERANCE);
            ctx.fill_path(&bezpath_to_cpu(&path));
        }
        Shape::Ring {
            center,
            radius,
            width,
            color,
        } => {
            ctx.set_paint(color_to_cpu(color));
            ctx.fill_path(&bezpath_to_cpu(&ring_path(center, radius, width)));
        }
        Shape::Rect { rect, color } => {
            ctx.set_paint(color_to_cpu(color));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        }
    }
}

/// Annulus of `width` centered on `radius`; the inner circle winds the opposite way so non-zero
/// fill leaves it empty.
pub(crate) fn ring_path(center: Point, radius: f64, width: f64) -> kurbo::BezPath {
    let outer = radius + width * 0.5;
    let inner = (radius - width * 0.5).max(0.0);
    let mut path = kurbo::Circle::new(center, outer).to_path(PATH_TOLERANCE);
    if inner <= 0.0 {
        return path;
    }
    let segments = ((outer * 0.5).ceil() as usize).clamp(48, 720);
    let step = std::f64::consts::TAU / segments as f64;
    for i in 0..=segments {
        let t = -(i as f64) * step;
        let p = Point::new(center.x + inner * t.cos(), center.y + inner * t.sin());
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Local-space bounding box of a node's own content.
pub(crate) fn content_bounds(content: &NodeContent) -> Option<Rect> {
    match content {
        NodeContent::Empty => None,
        NodeContent::Shapes(shapes) => shapes.iter().map(shape_bounds).reduce(|a, b| a.union(b)),
        NodeContent::Texture(tex) => {
            let h = f64::from(tex.size()) * 0.5;
            Some(Rect::new(-h, -h, h, h))
        }
    }
}

fn shape_bounds(shape: &Shape) -> Rect {
    match *shape {
        Shape::Circle { center, radius, .. } => {
            Rect::from_center_size(center, (radius * 2.0, radius * 2.0))
        }
        Shape::Ring {
            center,
            radius,
            width,
            ..
        } => {
            let d = (radius + width * 0.5) * 2.0;
            Rect::from_center_size(center, (d, d))
        }
        Shape::Rect { rect, .. } => rect,
    }
}

/// Device-space bounds of a visible subtree, including nested filter margins.
pub(crate) fn subtree_bounds(node: &SceneNode, device: Affine) -> Option<Rect> {
    if !node.visible {
        return None;
    }
    let own = content_bounds(&node.content).map(|r| device.transform_rect_bbox(r));
    node.children
        .iter()
        .filter_map(|child| {
            let t = device * child.transform;
            let m = child.filters.margin_px(transform_scale(t));
            subtree_bounds(child, t).map(|r| r.inflate(m, m))
        })
        .chain(own)
        .reduce(|a, b| a.union(b))
}

/// Uniform scale factor of `t` (square root of the absolute determinant).
pub(crate) fn transform_scale(t: Affine) -> f64 {
    t.determinant().abs().sqrt()
}

/// Integer pixel rect covering `r`.
fn pixel_rect(r: Rect) -> Option<LayerRect> {
    if !(r.width() > 0.0 && r.height() > 0.0) {
        return None;
    }
    let (x0, y0) = (r.x0.floor(), r.y0.floor());
    let (x1, y1) = (r.x1.ceil(), r.y1.ceil());
    Some(LayerRect {
        x: x0 as i32,
        y: y0 as i32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

fn color_to_cpu(c: crate::foundation::core::ShapeColor) -> vello_cpu::peniko::Color {
    let [r, g, b] = c.rgb;
    vello_cpu::peniko::Color::from_rgba8(r, g, b, c.alpha_u8())
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
