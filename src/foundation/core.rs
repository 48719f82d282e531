use crate::foundation::error::{StardreamError, StardreamResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Logical poster width in pixels.
pub const POSTER_WIDTH: u32 = 1800;
/// Logical poster height in pixels.
pub const POSTER_HEIGHT: u32 = 2400;

/// Logical poster dimensions. All layout math is expressed in this space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PosterSpec {
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
}

impl Default for PosterSpec {
    fn default() -> Self {
        Self {
            width: POSTER_WIDTH,
            height: POSTER_HEIGHT,
        }
    }
}

impl PosterSpec {
    /// Create a validated poster size.
    pub fn new(width: u32, height: u32) -> StardreamResult<Self> {
        if width == 0 || height == 0 {
            return Err(StardreamError::validation("poster dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// `min(width, height)`, the reference length for slot and nebula sizes.
    pub fn min_dim(self) -> f64 {
        f64::from(self.width.min(self.height))
    }

    pub fn center(self) -> Point {
        Point::new(self.width_f64() * 0.5, self.height_f64() * 0.5)
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width_f64(), self.height_f64())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Straight-alpha color used by scene shapes; alpha is a float so batched shapes can carry
/// fractional per-shape opacity without quantizing twice.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeColor {
    pub rgb: [u8; 3],
    pub alpha: f32,
}

impl ShapeColor {
    pub const fn new(rgb: u32, alpha: f32) -> Self {
        Self {
            rgb: [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8],
            alpha,
        }
    }

    pub fn alpha_u8(self) -> u8 {
        (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
