//! Stateless seeded pseudo-random values.
//!
//! Layout jitter and star placement are derived from these values instead of stored random
//! state, so the constants below are part of the saved-poster compatibility surface: changing
//! them moves every dream slot and star of every existing poster.

const SIN_SCALE: f64 = 9999.0;
const FRACT_SCALE: f64 = 10000.0;

/// Map an integer seed to a value in `[0, 1)`: `frac(sin(seed * 9999) * 10000)`.
pub fn seeded(seed: i64) -> f64 {
    let x = ((seed as f64) * SIN_SCALE).sin() * FRACT_SCALE;
    let v = x - x.floor();
    // `x - floor(x)` rounds up to exactly 1.0 for tiny negative `x`.
    if v >= 1.0 { 0.0 } else { v }
}

/// Per-call-site seed multipliers. Each site draws from a decorrelated seed sequence.
pub mod sites {
    pub const STAR_X: i64 = 3;
    pub const STAR_Y: i64 = 5;
    pub const STAR_RADIUS: i64 = 7;
    pub const STAR_ALPHA: i64 = 11;

    pub const NEBULA_X: i64 = 17;
    pub const NEBULA_Y: i64 = 19;
    pub const NEBULA_RADIUS: i64 = 23;
    pub const NEBULA_OFFSET: i64 = 100;

    pub const DREAM_SIZE: i64 = 17;
    pub const DREAM_X: i64 = 7;
    pub const DREAM_Y: i64 = 13;
    pub const DREAM_ROTATION: i64 = 23;
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/seeded.rs"]
mod tests;
