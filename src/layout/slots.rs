use crate::{
    config::slot::{SlotEffectConfig, SlotId},
    foundation::core::{PosterSpec, Vec2},
    foundation::seeded::{seeded, sites},
    layout::presets::preset,
};

/// Dream slot base size as a fraction of `min(W, H)`, before the preset multiplier.
pub const DREAM_BASE_FRACTION: f64 = 0.38;
/// Core slot base size as a fraction of `min(W, H)`.
pub const CORE_BASE_FRACTION: f64 = 0.48;
/// Maximum seeded positional jitter, as a fraction of the poster dimension (total span).
pub const POSITION_JITTER: f64 = 0.04;
/// Total span of the seeded base rotation, radians.
pub const ROTATION_JITTER: f64 = 0.9;

pub const Z_DREAM: i32 = 50;
pub const Z_DREAM_SELECTED: i32 = 200;
pub const Z_CORE: i32 = 500;
/// Interactive overlays sit at or above this z and are excluded from export.
pub const Z_SELECTION: i32 = 1000;

/// Seeded, config-independent placement of a dream preset position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DreamBase {
    pub pos_multiplier: f64,
    /// Slot diameter before the user `size` factor.
    pub base_size: f64,
    /// Offset from the poster center.
    pub base: Vec2,
    /// Radians.
    pub base_rotation: f64,
}

/// Base placement for preset `position_index`, `None` outside the preset table.
pub fn dream_base_placement(position_index: i32, poster: PosterSpec) -> Option<DreamBase> {
    let pre = preset(position_index)?;
    let i = i64::from(position_index);
    let (w, h) = (poster.width_f64(), poster.height_f64());

    let pos_multiplier = pre.size * (0.8 + seeded(i * sites::DREAM_SIZE) * 0.4);
    let base_size = DREAM_BASE_FRACTION * poster.min_dim() * pos_multiplier;
    let base_x = pre.x * w + (seeded(i * sites::DREAM_X) - 0.5) * w * POSITION_JITTER;
    let base_y = pre.y * h + (seeded(i * sites::DREAM_Y) - 0.5) * h * POSITION_JITTER;
    let base_rotation = (seeded(i * sites::DREAM_ROTATION) - 0.5) * ROTATION_JITTER;

    Some(DreamBase {
        pos_multiplier,
        base_size,
        base: Vec2::new(base_x, base_y),
        base_rotation,
    })
}

/// Final placement of a slot in center-group space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotPlacement {
    /// Slot center, offset from the poster center.
    pub position: Vec2,
    /// Slot diameter before the user `size` factor.
    pub base_size: f64,
    /// User `size` factor.
    pub scale: f64,
    /// Radians.
    pub rotation: f64,
    pub z: i32,
}

impl SlotPlacement {
    pub fn base_radius(&self) -> f64 {
        self.base_size * 0.5
    }

    /// Radius of the rendered disc after the user `size` factor.
    pub fn visual_radius(&self) -> f64 {
        self.base_radius() * self.scale
    }
}

/// Place a slot. Dream slots whose `positionIndex` is outside the preset table yield `None` and
/// are not rendered.
pub fn slot_placement(
    id: SlotId,
    cfg: &SlotEffectConfig,
    poster: PosterSpec,
    selected: bool,
) -> Option<SlotPlacement> {
    let offset = Vec2::new(cfg.offset_x, cfg.offset_y);
    let user_rotation = cfg.rotation.to_radians();
    match id {
        SlotId::Core => Some(SlotPlacement {
            position: offset,
            base_size: CORE_BASE_FRACTION * poster.min_dim(),
            scale: cfg.size,
            rotation: user_rotation,
            z: Z_CORE,
        }),
        SlotId::Dream(_) => {
            let base = dream_base_placement(cfg.position_index, poster)?;
            let z_base = if selected { Z_DREAM_SELECTED } else { Z_DREAM };
            Some(SlotPlacement {
                position: base.base + offset,
                base_size: base.base_size,
                scale: cfg.size,
                rotation: base.base_rotation + user_rotation,
                z: z_base + cfg.position_index,
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/slots.rs"]
mod tests;
