use crate::{
    effects::{blur::gaussian_blur_rgba8_premul, color},
    foundation::error::StardreamResult,
};

/// Gaussian sigma per unit of blur strength, in logical pixels.
pub const SIGMA_PER_STRENGTH: f64 = 0.5;

/// One post-processing stage applied to an isolated node layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterStage {
    Blur {
        strength: f64,
    },
    ColorAdjust {
        saturation: f64,
        brightness: f64,
        contrast: f64,
    },
}

impl FilterStage {
    /// Blur stage, `None` when `strength` would have no visible effect.
    pub fn blur(strength: f64) -> Option<Self> {
        (strength.is_finite() && strength > 0.0).then_some(Self::Blur { strength })
    }

    /// Color-adjust stage, `None` when every parameter is neutral.
    pub fn color_adjust(saturation: f64, brightness: f64, contrast: f64) -> Option<Self> {
        let neutral = saturation == 1.0 && brightness == 1.0 && contrast == 1.0;
        (!neutral).then_some(Self::ColorAdjust {
            saturation,
            brightness,
            contrast,
        })
    }

    /// Gaussian sigma in device pixels at `render_scale`.
    fn sigma(strength: f64, render_scale: f64) -> f64 {
        strength * SIGMA_PER_STRENGTH * render_scale
    }

    /// Device pixels of spill the stage needs around the content.
    pub fn margin_px(&self, render_scale: f64) -> f64 {
        match *self {
            Self::Blur { strength } => (3.0 * Self::sigma(strength, render_scale)).ceil(),
            Self::ColorAdjust { .. } => 0.0,
        }
    }
}

/// Ordered filter stages of one node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Option<FilterStage>) -> &mut Self {
        if let Some(stage) = stage {
            self.stages.push(stage);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn margin_px(&self, render_scale: f64) -> f64 {
        self.stages.iter().map(|s| s.margin_px(render_scale)).sum()
    }

    /// Run every stage over a premultiplied `width×height` buffer.
    pub fn apply(
        &self,
        rgba8_premul: &mut Vec<u8>,
        width: u32,
        height: u32,
        render_scale: f64,
    ) -> StardreamResult<()> {
        for stage in &self.stages {
            match *stage {
                FilterStage::Blur { strength } => {
                    let sigma = FilterStage::sigma(strength, render_scale.max(0.0));
                    *rgba8_premul = gaussian_blur_rgba8_premul(rgba8_premul, width, height, sigma)?;
                }
                FilterStage::ColorAdjust {
                    saturation,
                    brightness,
                    contrast,
                } => {
                    let m = color::color_adjust(
                        saturation as f32,
                        brightness as f32,
                        contrast as f32,
                    );
                    color::apply_in_place(rgba8_premul, &m);
                }
            }
        }
        Ok(())
    }
}
