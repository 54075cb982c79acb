//! Bilinear resampling to a fixed working resolution.
//!
//! Detection thresholds (block size, cell size range) are tuned for a fixed
//! working resolution, so every input is first brought to a known longer side.

use crate::{GrayImage, GrayImageView};

/// A resized image together with the factor that produced it.
#[derive(Clone, Debug)]
pub struct Resized {
    pub image: GrayImage,
    /// `new_size / old_size`; divide working coordinates by it to get back
    /// to the source image.
    pub scale: f32,
}

#[inline]
fn get_clamped(src: &GrayImageView<'_>, x: i32, y: i32) -> f32 {
    let x = x.clamp(0, src.width as i32 - 1) as usize;
    let y = y.clamp(0, src.height as i32 - 1) as usize;
    src.data[y * src.width + x] as f32
}

/// Resample `src` to `out_w × out_h` with pixel-centre aligned bilinear
/// interpolation (border pixels are replicated).
pub fn resize_bilinear(src: &GrayImageView<'_>, out_w: usize, out_h: usize) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);
    if src.width == 0 || src.height == 0 || out_w == 0 || out_h == 0 {
        return out;
    }

    let sx = src.width as f32 / out_w as f32;
    let sy = src.height as f32 / out_h as f32;

    for y in 0..out_h {
        let fy = (y as f32 + 0.5) * sy - 0.5;
        let y0 = fy.floor() as i32;
        let wy = fy - y0 as f32;
        for x in 0..out_w {
            let fx = (x as f32 + 0.5) * sx - 0.5;
            let x0 = fx.floor() as i32;
            let wx = fx - x0 as f32;

            let p00 = get_clamped(src, x0, y0);
            let p10 = get_clamped(src, x0 + 1, y0);
            let p01 = get_clamped(src, x0, y0 + 1);
            let p11 = get_clamped(src, x0 + 1, y0 + 1);

            let a = p00 + wx * (p10 - p00);
            let b = p01 + wx * (p11 - p01);
            out.data[y * out_w + x] = (a + wy * (b - a)).round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Scale `src` so that `max(width, height) == max_side`.
///
/// Aspect ratio is preserved; the shorter side is rounded to the nearest
/// pixel. An image that already has the requested size is copied as is.
pub fn resize_to_max_side(src: &GrayImageView<'_>, max_side: usize) -> Resized {
    let longest = src.width.max(src.height);
    if longest == 0 || max_side == 0 {
        return Resized {
            image: GrayImage::new(0, 0),
            scale: 1.0,
        };
    }

    let scale = max_side as f32 / longest as f32;
    if longest == max_side {
        return Resized {
            image: GrayImage {
                width: src.width,
                height: src.height,
                data: src.data.to_vec(),
            },
            scale,
        };
    }

    let out_w = ((src.width as f32 * scale).round() as usize).max(1);
    let out_h = ((src.height as f32 * scale).round() as usize).max(1);

    log::debug!(
        "resize {}x{} -> {}x{} (scale {:.4})",
        src.width,
        src.height,
        out_w,
        out_h,
        scale
    );

    Resized {
        image: resize_bilinear(src, out_w, out_h),
        scale,
    }
}
