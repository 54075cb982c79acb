//! Integer correlation templates for grid cells and line crossings.

/// Axis-aligned block of equal weight, `[x0, x1) × [y0, y1)` relative to
/// the template anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WeightedBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub weight: i32,
}

impl WeightedBox {
    const fn new(x0: i32, y0: i32, x1: i32, y1: i32, weight: i32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            weight,
        }
    }
}

/// Integer weight template correlated against a [`crate::BinaryImage`].
///
/// The match score at an image position is `sum(weight * pixel)` with the
/// anchor placed on that position; it is normalised by `perimeter`, the
/// number of `1` weights, so a perfect hit scores `1.0`.
///
/// Besides the dense weights every template carries an equivalent sum of
/// weighted boxes, which lets matching score a position with a handful of
/// summed-area lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    width: usize,
    height: usize,
    anchor: (usize, usize),
    weights: Vec<i32>,
    perimeter: u32,
    boxes: Vec<WeightedBox>,
}

impl Template {
    /// Hollow `side × side` square: `1` on the border, `-1` inside.
    ///
    /// Anchored at its top-left pixel; perimeter `4 * (side - 1)`.
    pub fn square(side: usize) -> Self {
        assert!(side >= 2, "square template needs side >= 2");
        let weights = (0..side * side)
            .map(|i| {
                let (x, y) = (i % side, i / side);
                if x == 0 || y == 0 || x == side - 1 || y == side - 1 {
                    1
                } else {
                    -1
                }
            })
            .collect();
        let s = side as i32;
        let mut boxes = vec![WeightedBox::new(0, 0, s, s, 1)];
        if side > 2 {
            boxes.push(WeightedBox::new(1, 1, s - 1, s - 1, -2));
        }
        Self {
            width: side,
            height: side,
            anchor: (0, 0),
            weights,
            perimeter: 4 * (side as u32 - 1),
            boxes,
        }
    }

    /// Plus-shaped template of odd `length`: `1` on the middle row and
    /// column, `0` elsewhere. Anchored at the centre.
    pub fn cross(length: usize) -> Self {
        Self::cross_inner(length, None)
    }

    /// Like [`Template::cross`], but everything farther than `margin` from
    /// both arms weighs `-1`, so ink between the arms is penalised.
    pub fn cross_with_margin(length: usize, margin: usize) -> Self {
        Self::cross_inner(length, Some(margin))
    }

    fn cross_inner(length: usize, margin: Option<usize>) -> Self {
        assert!(length % 2 == 1, "cross template length must be odd");
        let half = length / 2;
        let weights = (0..length * length)
            .map(|i| {
                let (x, y) = (i % length, i / length);
                if x == half || y == half {
                    return 1;
                }
                match margin {
                    Some(m) if x.abs_diff(half) > m && y.abs_diff(half) > m => -1,
                    _ => 0,
                }
            })
            .collect();
        // Both arms, minus the doubly counted centre.
        let h = half as i32;
        let mut boxes = vec![
            WeightedBox::new(-h, 0, h + 1, 1, 1),
            WeightedBox::new(0, -h, 1, h + 1, 1),
            WeightedBox::new(0, 0, 1, 1, -1),
        ];
        if let Some(m) = margin.filter(|&m| m < half) {
            let m = m as i32;
            for (x0, x1) in [(-h, -m), (m + 1, h + 1)] {
                for (y0, y1) in [(-h, -m), (m + 1, h + 1)] {
                    boxes.push(WeightedBox::new(x0, y0, x1, y1, -1));
                }
            }
        }
        Self {
            width: length,
            height: length,
            anchor: (half, half),
            weights,
            perimeter: 2 * length as u32 - 1,
            boxes,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Template pixel that lands on the scored image position.
    #[inline]
    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    #[inline]
    pub fn perimeter(&self) -> u32 {
        self.perimeter
    }

    #[inline]
    pub fn weight(&self, x: usize, y: usize) -> i32 {
        self.weights[y * self.width + x]
    }

    #[inline]
    pub(crate) fn boxes(&self) -> &[WeightedBox] {
        &self.boxes
    }
}
