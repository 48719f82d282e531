use std::sync::Arc;

use crate::{
    assets::decode::DecodedImage,
    foundation::{
        error::{StardreamError, StardreamResult},
        math::smoothstep01,
    },
};

/// Radius ratio below which the circular fade keeps full alpha.
pub const FADE_START: f64 = 0.4;
/// Feather width of the crop edge, as a fraction of the texture size.
pub const EDGE_FEATHER: f64 = 0.08;

/// A square, premultiplied RGBA8 texture with the circular fade and crop feather baked into
/// alpha. Dropping the last handle frees the pixels.
#[derive(Clone, Debug)]
pub struct MaskedTexture {
    size: u32,
    zoom: f64,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl MaskedTexture {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied pixel at `(x, y)`; transparent outside the texture.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.size || y >= self.size {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.size as usize) + (x as usize)) * 4;
        let d = self.data();
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }

    /// Image paint for drawing this texture with `vello_cpu`.
    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(self.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

/// Circular fade factor for `ratio = distance / radius`.
pub(crate) fn circular_alpha(ratio: f64) -> f64 {
    if ratio < FADE_START {
        1.0
    } else if ratio > 1.0 {
        0.0
    } else {
        1.0 - smoothstep01((ratio - FADE_START) / (1.0 - FADE_START))
    }
}

/// Crop-edge factor for a pixel `d` pixels inside the drawn image rectangle (negative outside).
pub(crate) fn edge_alpha(d: f64, feather: f64) -> f64 {
    if d < 0.0 {
        0.0
    } else if d < feather {
        smoothstep01(d / feather)
    } else {
        1.0
    }
}

/// Bake `image` into a `size×size` masked texture.
///
/// The image is cover-fitted (`size / min(w, h)`), scaled by `zoom` and centered, then every pixel
/// is multiplied by the circular fade and the crop-edge feather. Source transparency is kept.
pub fn build_masked_texture(
    image: &DecodedImage,
    size: u32,
    zoom: f64,
) -> StardreamResult<MaskedTexture> {
    if size == 0 {
        return Err(StardreamError::texture_build("texture size must be > 0"));
    }
    if image.width == 0 || image.height == 0 {
        return Err(StardreamError::texture_build("source image has zero size"));
    }
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(StardreamError::texture_build(format!(
            "zoom must be finite and > 0, got {zoom}"
        )));
    }
    let side: u16 = size
        .try_into()
        .map_err(|_| StardreamError::texture_build("texture size exceeds u16"))?;

    let (w, h) = (f64::from(image.width), f64::from(image.height));
    let scale = f64::from(size) / w.min(h) * zoom;
    let (dw, dh) = (w * scale, h * scale);
    let origin_x = (f64::from(size) - dw) * 0.5;
    let origin_y = (f64::from(size) - dh) * 0.5;

    let source = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
    let mut ctx = vello_cpu::RenderContext::new(side, side);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(
        vello_cpu::kurbo::Affine::translate((origin_x, origin_y))
            * vello_cpu::kurbo::Affine::scale(scale),
    );
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(source)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    ctx.flush();
    let mut drawn = vello_cpu::Pixmap::new(side, side);
    ctx.render_to_pixmap(&mut drawn);

    let mut bytes = drawn.data_as_u8_slice().to_vec();
    let half = f64::from(size) * 0.5;
    let feather = EDGE_FEATHER * f64::from(size);
    let (right, bottom) = (origin_x + dw, origin_y + dh);
    for (row, line) in bytes.chunks_exact_mut(size as usize * 4).enumerate() {
        let py = row as f64 + 0.5;
        for (col, px) in line.chunks_exact_mut(4).enumerate() {
            let px_x = col as f64 + 0.5;
            let ratio = (px_x - half).hypot(py - half) / half;
            let d = (px_x - origin_x)
                .min(right - px_x)
                .min(py - origin_y)
                .min(bottom - py);
            let factor = circular_alpha(ratio) * edge_alpha(d, feather);
            if factor >= 1.0 {
                continue;
            }
            for c in px.iter_mut() {
                *c = (f64::from(*c) * factor).round() as u8;
            }
        }
    }

    tracing::debug!(size, zoom, src_w = image.width, src_h = image.height, "built masked texture");
    Ok(MaskedTexture {
        size,
        zoom,
        pixmap: Arc::new(pixmap_from_premul_bytes(&bytes, size, size)?),
    })
}

pub(crate) fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> StardreamResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StardreamError::texture_build("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StardreamError::texture_build("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(StardreamError::texture_build("premultiplied byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/texture/mask.rs"]
mod tests;
