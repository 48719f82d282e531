use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Premultiplied source-over with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Placement of a `width×height` source buffer on a larger destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Composite `src` (laid out as `rect`) over `dst` (`dst_width` pixels per row), clipping to the
/// destination.
pub fn over_at(dst: &mut [u8], dst_width: u32, src: &[u8], rect: LayerRect, opacity: f32) {
    if dst_width == 0 || rect.width == 0 || rect.height == 0 {
        return;
    }
    let dst_w = dst_width as i64;
    let dst_h = (dst.len() / (dst_width as usize * 4)) as i64;
    let x0 = i64::from(rect.x).max(0);
    let y0 = i64::from(rect.y).max(0);
    let x1 = (i64::from(rect.x) + i64::from(rect.width)).min(dst_w);
    let y1 = (i64::from(rect.y) + i64::from(rect.height)).min(dst_h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for y in y0..y1 {
        let sy = (y - i64::from(rect.y)) as usize;
        for x in x0..x1 {
            let sx = (x - i64::from(rect.x)) as usize;
            let si = (sy * rect.width as usize + sx) * 4;
            let di = ((y * dst_w + x) as usize) * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, opacity));
        }
    }
}
