//! Adaptive-mean binarization of the working image.

use nonogram_grid_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Row-major 0/1 image. `1` marks foreground (ink).
///
/// `data.len()` must equal `width * height`; deserialization enforces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BinaryImageRepr")]
pub struct BinaryImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

#[derive(Deserialize)]
struct BinaryImageRepr {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl TryFrom<BinaryImageRepr> for BinaryImage {
    type Error = String;

    fn try_from(r: BinaryImageRepr) -> Result<Self, Self::Error> {
        if r.width.checked_mul(r.height) != Some(r.data.len()) {
            return Err(format!(
                "binary image of {}x{} needs {} pixels, got {}",
                r.width,
                r.height,
                r.width.saturating_mul(r.height),
                r.data.len()
            ));
        }
        Ok(Self {
            width: r.width,
            height: r.height,
            data: r.data,
        })
    }
}

impl BinaryImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        self.data[y * self.width + x] = on as u8;
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Foreground as 255 on a black background, for debug output.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| if v != 0 { 255 } else { 0 }).collect(),
        }
    }
}

// Box sum along one line with replicated ends; `read(i)` must accept any
// index in 0..len.
fn box_sum_line(len: usize, radius: usize, read: impl Fn(usize) -> u32, out: &mut [u32]) {
    let last = len as isize - 1;
    let at = |i: isize| read(i.clamp(0, last) as usize);

    let r = radius as isize;
    let mut acc: u32 = (-r..=r).map(at).sum();
    for (i, slot) in out.iter_mut().enumerate().take(len) {
        *slot = acc;
        let i = i as isize;
        acc = acc + at(i + r + 1) - at(i - r);
    }
}

/// Local mean threshold over a `block_size × block_size` window.
///
/// A pixel becomes foreground when `pixel <= round(mean) - floor(c)`, i.e.
/// dark strokes on a lighter background come out as `1`. Window sums use
/// replicated borders. `block_size` must be odd.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(src),
        fields(width = src.width, height = src.height)
    )
)]
pub fn binarize_adaptive_mean(src: &GrayImageView<'_>, block_size: usize, c: f32) -> BinaryImage {
    let (w, h) = (src.width, src.height);
    let mut out = BinaryImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let radius = block_size / 2;
    let area = ((2 * radius + 1) * (2 * radius + 1)) as f32;
    let delta = c.floor() as i32;

    // Horizontal pass into `rows`, then vertical pass per column.
    let mut rows = vec![0u32; w * h];
    for y in 0..h {
        let line = &src.data[y * w..(y + 1) * w];
        box_sum_line(w, radius, |x| line[x] as u32, &mut rows[y * w..(y + 1) * w]);
    }

    let mut column = vec![0u32; h];
    for x in 0..w {
        box_sum_line(h, radius, |y| rows[y * w + x], &mut column);
        for (y, &sum) in column.iter().enumerate() {
            let mean = (sum as f32 / area).round() as i32;
            let v = src.data[y * w + x] as i32;
            out.data[y * w + x] = (v - mean <= -delta) as u8;
        }
    }

    log::debug!(
        "binarized {}x{} (block {}, c {}): {} foreground px",
        w,
        h,
        block_size,
        c,
        out.foreground_count()
    );
    out
}
