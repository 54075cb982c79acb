//! Template search restricted to a rectangular region of the binary image.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{BinaryImage, IntegralImage, Template};

/// Axis-aligned pixel rectangle `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `width × height` rectangle whose top-left corner is
    /// `round(center) - (width / 2, height / 2)`.
    pub fn centered(center: Point2<f32>, width: usize, height: usize) -> Self {
        let cx = center.x.round() as i32;
        let cy = center.y.round() as i32;
        Self::new(cx - (width / 2) as i32, cy - (height / 2) as i32, width, height)
    }

    /// `true` if the region is non-empty and lies completely inside a
    /// `width × height` image.
    pub fn fits_in(&self, width: usize, height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x >= 0
            && self.y >= 0
            && self.x as usize + self.width <= width
            && self.y as usize + self.height <= height
    }

    /// Largest sub-rectangle that lies inside a `width × height` image.
    pub fn clamped_to(&self, width: usize, height: usize) -> Self {
        let x0 = (self.x.max(0) as usize).min(width);
        let y0 = (self.y.max(0) as usize).min(height);
        let x1 = ((self.x as i64 + self.width as i64).clamp(0, width as i64)) as usize;
        let y1 = ((self.y as i64 + self.height as i64).clamp(0, height as i64)) as usize;
        Self::new(
            x0 as i32,
            y0 as i32,
            x1.saturating_sub(x0),
            y1.saturating_sub(y0),
        )
    }
}

/// Locate the best `template` hit inside `region`.
///
/// Pixels outside the region read as background, so a match hanging over the
/// region border scores only its inside part. Scores are divided by the
/// template perimeter; the first maximum in row-major order wins and is
/// accepted only when it strictly exceeds `similarity_min`. The returned
/// location is the image position of the template anchor.
///
/// Returns `None` if the region does not lie fully inside the image.
pub fn find_template_in_region(
    image: &BinaryImage,
    region: Region,
    template: &Template,
    similarity_min: f32,
) -> Option<Point2<f32>> {
    if !region.fits_in(image.width, image.height) {
        return None;
    }
    let integral = IntegralImage::of_region(image, region);
    find_template_in_integral(&integral, region, template, similarity_min)
}

/// [`find_template_in_region`] on a prebuilt summed-area table.
///
/// Each position costs one table lookup per template box. Returns `None`
/// if the table does not cover `region`.
pub fn find_template_in_integral(
    integral: &IntegralImage,
    region: Region,
    template: &Template,
    similarity_min: f32,
) -> Option<Point2<f32>> {
    if region.width == 0
        || region.height == 0
        || !integral.covers(region)
        || template.perimeter() == 0
    {
        return None;
    }

    let (rx0, ry0) = (region.x as i64, region.y as i64);
    let (rx1, ry1) = (rx0 + region.width as i64, ry0 + region.height as i64);
    let boxes = template.boxes();

    let mut best: Option<(i64, i64, i64)> = None;
    for py in ry0..ry1 {
        for px in rx0..rx1 {
            // Clipping each box to the region gives zero padding outside it.
            let score: i64 = boxes
                .iter()
                .map(|b| {
                    let inside = integral.box_sum(
                        (px + b.x0 as i64).max(rx0),
                        (py + b.y0 as i64).max(ry0),
                        (px + b.x1 as i64).min(rx1),
                        (py + b.y1 as i64).min(ry1),
                    );
                    b.weight as i64 * inside as i64
                })
                .sum();
            if best.is_none_or(|(s, _, _)| score > s) {
                best = Some((score, px, py));
            }
        }
    }

    let (score, px, py) = best?;
    let ratio = score as f32 / template.perimeter() as f32;
    (ratio > similarity_min).then(|| Point2::new(px as f32, py as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Plus of the given arm half-length centred on (cx, cy).
    fn draw_plus(img: &mut BinaryImage, cx: usize, cy: usize, half: usize) {
        for d in 0..=2 * half {
            img.set(cx - half + d, cy, true);
            img.set(cx, cy - half + d, true);
        }
    }

    #[test]
    fn centered_region_uses_integer_halves() {
        let r = Region::centered(Point2::new(50.4, 20.6), 7, 8);
        assert_eq!(r, Region::new(47, 17, 7, 8));
    }

    #[test]
    fn region_must_fit_inside_image() {
        assert!(Region::new(0, 0, 10, 10).fits_in(10, 10));
        assert!(!Region::new(1, 0, 10, 10).fits_in(10, 10));
        assert!(!Region::new(-1, 0, 4, 4).fits_in(10, 10));
        assert!(!Region::new(2, 2, 0, 4).fits_in(10, 10));
    }

    #[test]
    fn clamping_keeps_the_overlap() {
        let r = Region::new(-5, 3, 20, 20).clamped_to(12, 10);
        assert_eq!(r, Region::new(0, 3, 12, 7));
        let outside = Region::new(30, 30, 5, 5).clamped_to(12, 10);
        assert_eq!((outside.width, outside.height), (0, 0));
    }

    #[test]
    fn finds_plus_at_its_centre() {
        let mut img = BinaryImage::new(40, 40);
        draw_plus(&mut img, 21, 18, 6);
        let t = Template::cross(13);
        let hit = find_template_in_region(&img, Region::new(8, 8, 24, 24), &t, 0.9);
        assert_eq!(hit, Some(Point2::new(21.0, 18.0)));
    }

    #[test]
    fn clipped_match_scores_only_the_inside() {
        let mut img = BinaryImage::new(40, 40);
        draw_plus(&mut img, 20, 20, 6);
        let t = Template::cross(13);
        // Region ends just right of the centre: the right arm is cut off.
        let r = Region::new(5, 5, 17, 30);
        assert_eq!(find_template_in_region(&img, r, &t, 0.9), None);
        assert_eq!(
            find_template_in_region(&img, r, &t, 0.7),
            Some(Point2::new(20.0, 20.0))
        );
    }

    #[test]
    fn threshold_is_strict() {
        let mut img = BinaryImage::new(30, 30);
        draw_plus(&mut img, 15, 15, 3);
        let t = Template::cross(7);
        let r = Region::new(5, 5, 20, 20);
        assert!(find_template_in_region(&img, r, &t, 0.99).is_some());
        assert_eq!(find_template_in_region(&img, r, &t, 1.0), None);
    }

    #[test]
    fn first_maximum_in_row_major_order_wins() {
        // Two identical plusses; the upper one comes first.
        let mut img = BinaryImage::new(60, 60);
        draw_plus(&mut img, 40, 15, 3);
        draw_plus(&mut img, 15, 40, 3);
        let t = Template::cross(7);
        let hit = find_template_in_region(&img, Region::new(0, 0, 60, 60), &t, 0.9);
        assert_eq!(hit, Some(Point2::new(40.0, 15.0)));
    }

    #[test]
    fn region_outside_image_finds_nothing() {
        let mut img = BinaryImage::new(30, 30);
        draw_plus(&mut img, 15, 15, 3);
        let t = Template::cross(7);
        let r = Region::new(10, 10, 30, 30);
        assert_eq!(find_template_in_region(&img, r, &t, 0.5), None);
    }

    #[test]
    fn ink_between_arms_is_penalised_by_margin_cross() {
        let mut img = BinaryImage::new(40, 40);
        draw_plus(&mut img, 20, 20, 7);
        let plain = Template::cross(15);
        let strict = Template::cross_with_margin(15, 1);
        let r = Region::new(10, 10, 20, 20);
        assert!(find_template_in_region(&img, r, &strict, 0.9).is_some());

        // Fill a quadrant.
        for y in 14..19 {
            for x in 22..27 {
                img.set(x, y, true);
            }
        }
        assert!(find_template_in_region(&img, r, &plain, 0.9).is_some());
        assert_eq!(find_template_in_region(&img, r, &strict, 0.9), None);
    }

    // Direct correlation over the dense weights, zero outside the region.
    fn dense_scan(
        img: &BinaryImage,
        region: Region,
        t: &Template,
        similarity_min: f32,
    ) -> Option<Point2<f32>> {
        if !region.fits_in(img.width, img.height) {
            return None;
        }
        let (ax, ay) = (t.anchor().0 as i32, t.anchor().1 as i32);
        let (x1, y1) = (region.x + region.width as i32, region.y + region.height as i32);
        let mut best: Option<(i32, i32, i32)> = None;
        for py in region.y..y1 {
            for px in region.x..x1 {
                let mut score = 0;
                for ty in 0..t.height() {
                    for tx in 0..t.width() {
                        let x = px + tx as i32 - ax;
                        let y = py + ty as i32 - ay;
                        if x < region.x || y < region.y || x >= x1 || y >= y1 {
                            continue;
                        }
                        score += t.weight(tx, ty) * img.get(x as usize, y as usize) as i32;
                    }
                }
                if best.is_none_or(|(s, _, _)| score > s) {
                    best = Some((score, px, py));
                }
            }
        }
        let (score, px, py) = best?;
        (score as f32 / t.perimeter() as f32 > similarity_min)
            .then(|| Point2::new(px as f32, py as f32))
    }

    // xorshift32; deterministic noise with a given ink density in percent.
    fn noise(w: usize, h: usize, seed: u32, density: u32) -> BinaryImage {
        let mut state = seed;
        let mut img = BinaryImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                img.set(x, y, state % 100 < density);
            }
        }
        img
    }

    #[test]
    fn box_scoring_matches_dense_correlation_on_noise() {
        let templates = [
            Template::square(5),
            Template::square(9),
            Template::cross(7),
            Template::cross(11),
            Template::cross_with_margin(11, 1),
            Template::cross_with_margin(13, 0),
        ];
        let regions = [
            Region::new(0, 0, 40, 36),
            Region::new(3, 5, 17, 12),
            Region::new(30, 20, 10, 16),
            Region::new(12, 9, 1, 1),
        ];
        for (seed, density) in [(7u32, 10u32), (99, 35), (2024, 60), (31337, 90)] {
            let img = noise(40, 36, seed, density);
            let full = IntegralImage::new(&img);
            for t in &templates {
                for &r in &regions {
                    for threshold in [-10.0, 0.2, 0.5] {
                        let expected = dense_scan(&img, r, t, threshold);
                        assert_eq!(
                            find_template_in_region(&img, r, t, threshold),
                            expected,
                            "seed {seed}, {r:?}, {}x{} template, threshold {threshold}",
                            t.width(),
                            t.height()
                        );
                        assert_eq!(find_template_in_integral(&full, r, t, threshold), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn table_must_cover_the_region() {
        let img = noise(30, 30, 5, 50);
        let part = IntegralImage::of_region(&img, Region::new(0, 0, 15, 15));
        let t = Template::cross(5);
        assert_eq!(
            find_template_in_integral(&part, Region::new(10, 10, 10, 10), &t, -10.0),
            None
        );
        assert!(find_template_in_integral(&part, Region::new(2, 2, 10, 10), &t, -10.0).is_some());
    }
}
