use crate::{
    foundation::core::{Point, PosterSpec, Vec2},
    scene::node::RootTransform,
};

/// Screen space reserved around the poster in the interactive view.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewportOpts {
    /// Width of the control sidebar docked on the right edge.
    pub sidebar_width: f64,
    /// Total vertical margin.
    pub margin: f64,
}

impl Default for ViewportOpts {
    fn default() -> Self {
        Self {
            sidebar_width: 360.0,
            margin: 40.0,
        }
    }
}

/// Uniform scale fitting `poster` into `viewport`: never above 1, `0` for degenerate viewports.
pub fn compute_viewport_scale(viewport: Vec2, opts: ViewportOpts, poster: PosterSpec) -> f64 {
    let sx = (viewport.x - opts.sidebar_width) / poster.width_f64();
    let sy = (viewport.y - opts.margin) / poster.height_f64();
    if !(sx.is_finite() && sy.is_finite()) {
        return 0.0;
    }
    sx.min(sy).clamp(0.0, 1.0)
}

/// Root transform drawing the scaled poster centered in the area left of the sidebar.
pub fn viewport_root_transform(viewport: Vec2, opts: ViewportOpts, poster: PosterSpec) -> RootTransform {
    let s = compute_viewport_scale(viewport, opts, poster);
    let avail_w = (viewport.x - opts.sidebar_width).max(0.0);
    let avail_h = viewport.y.max(0.0);
    RootTransform {
        scale: Vec2::new(s, s),
        position: Vec2::new(
            (avail_w - poster.width_f64() * s) * 0.5,
            (avail_h - poster.height_f64() * s) * 0.5,
        ),
    }
}

/// Map a viewport-space point back to poster space. `None` when the root is not invertible.
pub fn viewport_to_poster(root: &RootTransform, point: Point) -> Option<Point> {
    let a = root.affine();
    if a.determinant().abs() < f64::EPSILON {
        return None;
    }
    Some(a.inverse() * point)
}

#[cfg(test)]
#[path = "../tests/unit/viewport/viewport.rs"]
mod tests;
