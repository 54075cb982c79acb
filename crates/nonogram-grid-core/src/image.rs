use serde::{Deserialize, Serialize};

/// Borrowed row-major 8-bit grayscale image.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer. Returns `None` when `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        if width.checked_mul(height)? != data.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Owned row-major 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample at `(x, y)`; pixels outside the image read as 0.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_mismatched_buffer() {
        let data = vec![0u8; 11];
        assert!(GrayImageView::new(4, 3, &data).is_none());
        assert!(GrayImageView::new(11, 1, &data).is_some());
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage {
            width: 2,
            height: 1,
            data: vec![0, 200],
        };
        let view = img.view();
        assert_eq!(sample_bilinear_u8(&view, 0.0, 0.0), 0);
        assert_eq!(sample_bilinear_u8(&view, 0.5, 0.0), 100);
        assert_eq!(sample_bilinear_u8(&view, 1.0, 0.0), 200);
    }

    #[test]
    fn samples_outside_read_as_black() {
        let img = GrayImage::filled(3, 3, 255);
        let view = img.view();
        assert_eq!(sample_bilinear(&view, -5.0, 1.0), 0.0);
        assert_eq!(sample_bilinear(&view, 1.0, 1.0), 255.0);
    }
}
