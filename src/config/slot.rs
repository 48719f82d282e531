use std::ops::RangeInclusive;

/// Sentinel `positionIndex` carried by the core slot.
pub const CORE_POSITION_INDEX: i32 = -1;

pub const SIZE_RANGE: RangeInclusive<f64> = 0.5..=2.0;
pub const ZOOM_RANGE: RangeInclusive<f64> = 0.5..=3.0;
pub const OPACITY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const BLUR_RANGE: RangeInclusive<f64> = 0.0..=20.0;
pub const GLOW_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const OFFSET_RANGE: RangeInclusive<f64> = -200.0..=200.0;
pub const ROTATION_RANGE: RangeInclusive<f64> = -180.0..=180.0;
pub const COLOR_RANGE: RangeInclusive<f64> = 0.0..=2.0;

pub const DEFAULT_GLOW_INTENSITY: f64 = 0.25;

/// Opaque, stable key of an image in the image store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a slot of the configuration document. Dream slots are addressed by their index in
/// `dreams`, not by their preset position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Core,
    Dream(usize),
}

impl SlotId {
    pub fn is_core(self) -> bool {
        matches!(self, Self::Core)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::Dream(i) => write!(f, "dream-{i}"),
        }
    }
}

impl std::str::FromStr for SlotId {
    type Err = crate::foundation::error::StardreamError;

    /// Parses the `Display` form: `core` or `dream-<index>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "core" {
            return Ok(Self::Core);
        }
        s.strip_prefix("dream-")
            .and_then(|i| i.parse().ok())
            .map(Self::Dream)
            .ok_or_else(|| {
                crate::foundation::error::StardreamError::validation(format!(
                    "invalid slot id '{s}' (expected 'core' or 'dream-<n>')"
                ))
            })
    }
}

/// Per-slot configuration as persisted in the settings store.
///
/// Field names follow the persisted camelCase document exactly; they must not change without a
/// migration, since previously saved posters are read back through this shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotEffectConfig {
    pub image: Option<ImageId>,
    pub size: f64,
    pub zoom: f64,
    pub opacity: f64,
    pub blur: f64,
    pub glow_intensity: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Degrees.
    pub rotation: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub position_index: i32,
}

impl Default for SlotEffectConfig {
    fn default() -> Self {
        Self {
            image: None,
            size: 1.0,
            zoom: 1.0,
            opacity: 1.0,
            blur: 0.0,
            glow_intensity: DEFAULT_GLOW_INTENSITY,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
            saturation: 1.0,
            brightness: 1.0,
            contrast: 1.0,
            position_index: CORE_POSITION_INDEX,
        }
    }
}

impl SlotEffectConfig {
    /// Default configuration for the dream slot at preset `position_index`.
    pub fn dream(position_index: i32) -> Self {
        Self {
            position_index,
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(ImageId::new(image));
        self
    }

    /// Copy with every numeric field clamped to its editing domain. Non-finite values fall back
    /// to the field default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        let c = |v: f64, range: RangeInclusive<f64>, default: f64| -> f64 {
            if v.is_finite() {
                v.clamp(*range.start(), *range.end())
            } else {
                default
            }
        };
        Self {
            image: self.image.clone(),
            size: c(self.size, SIZE_RANGE, d.size),
            zoom: c(self.zoom, ZOOM_RANGE, d.zoom),
            opacity: c(self.opacity, OPACITY_RANGE, d.opacity),
            blur: c(self.blur, BLUR_RANGE, d.blur),
            glow_intensity: c(self.glow_intensity, GLOW_RANGE, d.glow_intensity),
            offset_x: c(self.offset_x, OFFSET_RANGE, d.offset_x),
            offset_y: c(self.offset_y, OFFSET_RANGE, d.offset_y),
            rotation: c(self.rotation, ROTATION_RANGE, d.rotation),
            saturation: c(self.saturation, COLOR_RANGE, d.saturation),
            brightness: c(self.brightness, COLOR_RANGE, d.brightness),
            contrast: c(self.contrast, COLOR_RANGE, d.contrast),
            position_index: self.position_index,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/slot.rs"]
mod tests;
