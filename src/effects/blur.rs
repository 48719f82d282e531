use rayon::prelude::*;

use crate::foundation::error::{StardreamError, StardreamResult};

/// Number of box passes per axis approximating a gaussian.
const BOX_PASSES: usize = 3;
/// Sigma, in downsampled pixels, kept when a wide blur runs at reduced resolution.
const DOWNSAMPLE_SIGMA: f64 = 8.0;

/// Gaussian blur of a premultiplied RGBA8 buffer, approximated by three box blurs per axis.
///
/// Pixels outside the buffer count as transparent, so content bleeds out into any margin the
/// caller reserved around it. Rows are processed in parallel. Sigmas of at least
/// `2 * DOWNSAMPLE_SIGMA` are blurred on a box-downsampled copy and upsampled bilinearly; the
/// residual sigma accounts for the variance the resampling adds.
pub fn gaussian_blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f64,
) -> StardreamResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StardreamError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(StardreamError::validation(
            "gaussian_blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(StardreamError::validation("blur sigma must be finite and >= 0"));
    }

    if expected_len == 0 {
        return Ok(Vec::new());
    }

    let (w, h) = (width as usize, height as usize);
    let k = downsample_factor(sigma);
    if k >= 2 && w >= 2 * k && h >= 2 * k {
        let (small, sw, sh) = downsample_box(src, w, h, k);
        let kf = k as f64;
        let residual = (sigma * sigma - kf * kf / 4.0).max(0.0).sqrt() / kf;
        let blurred = blur_full_res(&small, sw, sh, residual);
        return Ok(upsample_bilinear(&blurred, sw, sh, k, w, h));
    }
    Ok(blur_full_res(src, w, h, sigma))
}

fn downsample_factor(sigma: f64) -> usize {
    let k = (sigma / DOWNSAMPLE_SIGMA).floor();
    if k >= 2.0 { k.min(u32::MAX as f64) as usize } else { 1 }
}

fn blur_full_res(src: &[u8], w: usize, h: usize, sigma: f64) -> Vec<u8> {
    let radii = box_radii(sigma);
    if radii.iter().all(|&r| r == 0) {
        return src.to_vec();
    }

    let mut buf = src.to_vec();
    let mut tmp = vec![0u8; src.len()];
    for &r in &radii {
        box_blur_rows(&buf, &mut tmp, w, r);
        std::mem::swap(&mut buf, &mut tmp);
    }

    let mut cols = transpose_rgba8(&buf, w, h);
    for &r in &radii {
        box_blur_rows(&cols, &mut tmp, h, r);
        std::mem::swap(&mut cols, &mut tmp);
    }
    transpose_rgba8(&cols, h, w)
}

/// Average `k×k` blocks. Blocks hanging off the right or bottom edge treat the missing pixels as
/// transparent.
fn downsample_box(src: &[u8], w: usize, h: usize, k: usize) -> (Vec<u8>, usize, usize) {
    let (sw, sh) = (w.div_ceil(k), h.div_ceil(k));
    let mut out = vec![0u8; sw * sh * 4];
    let div = (k * k) as u64;
    out.par_chunks_mut(sw * 4)
        .enumerate()
        .for_each(|(sy, row)| {
            let mut acc = vec![[0u64; 4]; sw];
            for y in sy * k..((sy + 1) * k).min(h) {
                for (x, px) in src[y * w * 4..(y + 1) * w * 4].chunks_exact(4).enumerate() {
                    let a = &mut acc[x / k];
                    for c in 0..4 {
                        a[c] += u64::from(px[c]);
                    }
                }
            }
            for (d, a) in row.chunks_exact_mut(4).zip(&acc) {
                for c in 0..4 {
                    d[c] = ((a[c] + div / 2) / div).min(255) as u8;
                }
            }
        });
    (out, sw, sh)
}

/// Sample taps for output index `i` in a grid downsampled by `k` to `n` cells.
fn tap(i: usize, k: f64, n: usize) -> (usize, usize, f32) {
    let u = ((i as f64 + 0.5) / k - 0.5).clamp(0.0, (n - 1) as f64);
    let i0 = u.floor() as usize;
    (i0, (i0 + 1).min(n - 1), (u - i0 as f64) as f32)
}

fn upsample_bilinear(src: &[u8], sw: usize, sh: usize, k: usize, w: usize, h: usize) -> Vec<u8> {
    let kf = k as f64;
    let xs: Vec<_> = (0..w).map(|x| tap(x, kf, sw)).collect();
    let mut out = vec![0u8; w * h * 4];
    out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        let (y0, y1, fy) = tap(y, kf, sh);
        let r0 = &src[y0 * sw * 4..(y0 + 1) * sw * 4];
        let r1 = &src[y1 * sw * 4..(y1 + 1) * sw * 4];
        for (d, &(x0, x1, fx)) in row.chunks_exact_mut(4).zip(&xs) {
            for c in 0..4 {
                let top = f32::from(r0[x0 * 4 + c]) * (1.0 - fx) + f32::from(r0[x1 * 4 + c]) * fx;
                let bot = f32::from(r1[x0 * 4 + c]) * (1.0 - fx) + f32::from(r1[x1 * 4 + c]) * fx;
                d[c] = (top * (1.0 - fy) + bot * fy).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    out
}

/// Box radii whose successive application matches a gaussian of `sigma`.
pub(crate) fn box_radii(sigma: f64) -> [usize; BOX_PASSES] {
    if sigma < 0.5 {
        return [0; BOX_PASSES];
    }
    let n = BOX_PASSES as f64;
    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f64;
    let m_ideal =
        (12.0 * sigma * sigma - n * wlf * wlf - 4.0 * n * wlf - 3.0 * n) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().clamp(0.0, n) as usize;

    let mut radii = [0usize; BOX_PASSES];
    for (i, r) in radii.iter_mut().enumerate() {
        let size = if i < m { wl } else { wu };
        *r = ((size - 1) / 2) as usize;
    }
    radii
}

fn box_blur_rows(src: &[u8], dst: &mut [u8], row_px: usize, radius: usize) {
    let row_len = row_px * 4;
    if radius == 0 {
        dst.copy_from_slice(src);
        return;
    }
    dst.par_chunks_mut(row_len)
        .zip(src.par_chunks(row_len))
        .for_each(|(d, s)| box_blur_row(s, d, radius));
}

fn box_blur_row(src: &[u8], dst: &mut [u8], radius: usize) {
    let w = src.len() / 4;
    let mut prefix = vec![[0u32; 4]; w + 1];
    for x in 0..w {
        for c in 0..4 {
            prefix[x + 1][c] = prefix[x][c] + u32::from(src[x * 4 + c]);
        }
    }
    let div = (2 * radius + 1) as u32;
    for x in 0..w {
        let lo = x.saturating_sub(radius);
        let hi = (x + radius + 1).min(w);
        for c in 0..4 {
            let sum = prefix[hi][c] - prefix[lo][c];
            dst[x * 4 + c] = ((sum + div / 2) / div).min(255) as u8;
        }
    }
}

fn transpose_rgba8(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(height * 4)
        .enumerate()
        .for_each(|(x, col)| {
            for y in 0..height {
                let s = (y * width + x) * 4;
                col[y * 4..y * 4 + 4].copy_from_slice(&src[s..s + 4]);
            }
        });
    out
}
