//! 5×4 color matrices in straight-alpha, normalized `[0,1]` space.
//!
//! Row-major `[r, g, b, a, offset]` per output channel, matching the layout the filter stages
//! store.

pub type ColorMatrix = [f32; 20];

const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Saturation around Rec.709 luma: `0` is grayscale, `1` identity.
pub fn saturation(s: f32) -> ColorMatrix {
    let inv = 1.0 - s;
    let (r, g, b) = (LUMA_R * inv, LUMA_G * inv, LUMA_B * inv);
    [
        r + s, g, b, 0.0, 0.0, //
        r, g + s, b, 0.0, 0.0, //
        r, g, b + s, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// Multiply color channels by `b`.
pub fn brightness(b: f32) -> ColorMatrix {
    [
        b, 0.0, 0.0, 0.0, 0.0, //
        0.0, b, 0.0, 0.0, 0.0, //
        0.0, 0.0, b, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// Scale color channels around mid-gray by `c`.
pub fn contrast(c: f32) -> ColorMatrix {
    let o = 0.5 * (1.0 - c);
    [
        c, 0.0, 0.0, 0.0, o, //
        0.0, c, 0.0, 0.0, o, //
        0.0, 0.0, c, 0.0, o, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// Matrix equivalent to applying `first`, then `then`.
pub fn compose(first: &ColorMatrix, then: &ColorMatrix) -> ColorMatrix {
    let mut out = [0.0f32; 20];
    for i in 0..4 {
        for j in 0..5 {
            let mut acc: f32 = (0..4).map(|k| then[i * 5 + k] * first[k * 5 + j]).sum();
            if j == 4 {
                acc += then[i * 5 + 4];
            }
            out[i * 5 + j] = acc;
        }
    }
    out
}

/// Saturation, then brightness, then contrast.
pub fn color_adjust(s: f32, b: f32, c: f32) -> ColorMatrix {
    compose(&compose(&saturation(s), &brightness(b)), &contrast(c))
}

pub fn apply_in_place(rgba8_premul: &mut [u8], m: &ColorMatrix) {
    for px in rgba8_premul.chunks_exact_mut(4) {
        let out = apply_px([px[0], px[1], px[2], px[3]], m);
        px.copy_from_slice(&out);
    }
}

fn apply_px(s: [u8; 4], m: &ColorMatrix) -> [u8; 4] {
    let pa = s[3] as f32 / 255.0;
    if pa <= 0.0 && m[4] == 0.0 && m[9] == 0.0 && m[14] == 0.0 && m[19] == 0.0 {
        return [0, 0, 0, 0];
    }

    // Convert premul -> straight for matrix application.
    let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
    let r = s[0] as f32 / 255.0 * inv_a;
    let g = s[1] as f32 / 255.0 * inv_a;
    let b = s[2] as f32 / 255.0 * inv_a;
    let a = pa;

    let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
    let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
    let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
    let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

    // Convert straight -> premul.
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    [
        to_u8(out_r * out_a),
        to_u8(out_g * out_a),
        to_u8(out_b * out_a),
        to_u8(out_a),
    ]
}
