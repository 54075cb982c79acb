use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

// Translate to the centroid and scale so the mean distance is sqrt(2).
fn normalize_quad(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let (cx, cy) = pts.iter().fold((0.0_f64, 0.0_f64), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    let (cx, cy) = (cx / 4.0, cy / 4.0);

    let mean_dist = pts
        .iter()
        .map(|p| {
            let dx = p.x as f64 - cx;
            let dy = p.y as f64 - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / 4.0;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (three collinear points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_quad(src);
    let (dst_n, t_dst) = normalize_quad(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(Homography::new(h / s))
}

/// Resample `src` into an `out_w × out_h` image: each destination pixel is
/// mapped through `h_src_from_dst` and sampled bilinearly.
///
/// Coordinates on both sides are pixel indices (pixel `i` is centred on `i`).
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_src_from_dst.apply(Point2::new(x as f32, y as f32));
            out.data[y * out_w + x] = sample_bilinear_u8(src, p.x, p.y);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(side: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    #[test]
    fn maps_square_onto_skewed_cell() {
        let cell = [
            Point2::new(102.0_f32, 51.0),
            Point2::new(131.0, 49.0),
            Point2::new(134.0, 80.0),
            Point2::new(100.0, 83.0),
        ];
        let h = homography_from_4pt(&square(20.0), &cell).expect("non-degenerate cell");
        for (s, d) in square(20.0).iter().zip(cell.iter()) {
            let p = h.apply(*s);
            assert_abs_diff_eq!(p.x, d.x, epsilon = 1e-3);
            assert_abs_diff_eq!(p.y, d.y, epsilon = 1e-3);
        }

        let inv = h.inverse().expect("invertible");
        let back = inv.apply(h.apply(Point2::new(7.0, 13.0)));
        assert_abs_diff_eq!(back.x, 7.0, epsilon = 1e-3);
        assert_abs_diff_eq!(back.y, 13.0, epsilon = 1e-3);
    }

    #[test]
    fn collapsed_quad_is_rejected() {
        let dst = [Point2::new(5.0_f32, 5.0); 4];
        assert!(homography_from_4pt(&square(10.0), &dst).is_none());
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let mut img = GrayImage::new(6, 5);
        img.set(2, 3, 200);
        img.set(4, 1, 50);
        let out = warp_perspective_gray(&img.view(), &Homography::identity(), 6, 5);
        assert_eq!(out, img);
    }
}
