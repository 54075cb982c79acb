//! Summed-area tables over binary images.

use crate::{BinaryImage, Region};

/// Summed-area table over a rectangular part of a [`BinaryImage`].
///
/// All coordinates are image coordinates. The table covers
/// `[x, x + width) × [y, y + height)` and answers foreground counts of any
/// axis-aligned box in four lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegralImage {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    // (width + 1) × (height + 1); first row and column are zero.
    sums: Vec<u32>,
}

impl IntegralImage {
    /// Table over the whole image.
    pub fn new(image: &BinaryImage) -> Self {
        Self::build(image, 0, 0, image.width, image.height)
    }

    /// Table over the part of `region` that lies inside the image.
    pub fn of_region(image: &BinaryImage, region: Region) -> Self {
        let r = region.clamped_to(image.width, image.height);
        Self::build(image, r.x as usize, r.y as usize, r.width, r.height)
    }

    fn build(image: &BinaryImage, x: usize, y: usize, width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sums = vec![0u32; stride * (height + 1)];
        for row in 0..height {
            let start = (y + row) * image.width + x;
            let mut acc = 0u32;
            for (col, &v) in image.data[start..start + width].iter().enumerate() {
                acc += u32::from(v != 0);
                sums[(row + 1) * stride + col + 1] = sums[row * stride + col + 1] + acc;
            }
        }
        Self {
            x,
            y,
            width,
            height,
            sums,
        }
    }

    /// Area the table was built over.
    pub fn extent(&self) -> Region {
        Region::new(self.x as i32, self.y as i32, self.width, self.height)
    }

    /// `true` if every pixel of `region` is inside the table.
    pub fn covers(&self, region: Region) -> bool {
        let (x, y) = (region.x as i64, region.y as i64);
        x >= self.x as i64
            && y >= self.y as i64
            && x + region.width as i64 <= (self.x + self.width) as i64
            && y + region.height as i64 <= (self.y + self.height) as i64
    }

    /// Foreground count in `[x0, x1) × [y0, y1)`, clipped to the table.
    /// Empty and inverted boxes count zero.
    #[inline]
    pub fn box_sum(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> u32 {
        let clip = |v: i64, origin: usize, len: usize| (v - origin as i64).clamp(0, len as i64) as usize;
        let (cx0, cx1) = (clip(x0, self.x, self.width), clip(x1, self.x, self.width));
        let (cy0, cy1) = (clip(y0, self.y, self.height), clip(y1, self.y, self.height));
        if cx1 <= cx0 || cy1 <= cy0 {
            return 0;
        }
        let s = self.width + 1;
        self.sums[cy1 * s + cx1] + self.sums[cy0 * s + cx0]
            - self.sums[cy0 * s + cx1]
            - self.sums[cy1 * s + cx0]
    }
}
