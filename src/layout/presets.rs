/// Number of preset dream positions.
pub const PRESET_COUNT: usize = 14;

/// One entry of the preset table. `x`/`y` are offsets from the poster center as fractions of the
/// poster width/height; `size` scales the base dream slot size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresetPosition {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

const fn p(x: f64, y: f64, size: f64) -> PresetPosition {
    PresetPosition { x, y, size }
}

/// Dream positions ring the core: an inner orbit of six larger slots and an outer scatter of
/// eight smaller ones toward the poster edges.
pub const PRESET_POSITIONS: [PresetPosition; PRESET_COUNT] = [
    p(-0.28, -0.26, 0.85),
    p(0.28, -0.24, 0.80),
    p(-0.31, 0.02, 0.75),
    p(0.31, 0.04, 0.78),
    p(-0.25, 0.28, 0.82),
    p(0.26, 0.27, 0.80),
    p(0.00, -0.36, 0.62),
    p(0.00, 0.37, 0.64),
    p(-0.36, -0.40, 0.50),
    p(0.36, -0.41, 0.52),
    p(-0.38, 0.42, 0.48),
    p(0.37, 0.41, 0.50),
    p(-0.40, -0.14, 0.46),
    p(0.40, 0.16, 0.46),
];

/// Preset for `position_index`, `None` when outside `0..PRESET_COUNT`.
pub fn preset(position_index: i32) -> Option<PresetPosition> {
    usize::try_from(position_index)
        .ok()
        .and_then(|i| PRESET_POSITIONS.get(i).copied())
}
