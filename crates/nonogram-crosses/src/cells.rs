//! Per-cell rectification of a detected lattice.

use nalgebra::Point2;
use nonogram_grid_core::{homography_from_4pt, warp_perspective_gray, GrayImage, GrayImageView};
use nonogram_lattice::DenseGrid;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CellWarpError {
    #[error("grid of {rows}x{cols} crosses has no cell (need 2x2 at least)")]
    GridTooSmall { rows: usize, cols: usize },
    #[error("cell side must be positive")]
    ZeroSide,
}

/// Square images of the cells between adjacent crosses.
///
/// Cell `(row, col)` is bounded by crosses `(row, col)` and
/// `(row + 1, col + 1)` of the source grid.
#[derive(Clone, Debug)]
pub struct CellImages {
    rows: usize,
    cols: usize,
    side: usize,
    cells: Vec<Option<GrayImage>>,
}

impl CellImages {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&GrayImage> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col].as_ref()
    }

    /// Warped cells in row-major order as `(row, col, image)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &GrayImage)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| Some((i / cols, i % cols, c.as_ref()?)))
    }

    pub fn warped_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Rectify every cell of `grid` into a `side × side` image.
///
/// A cell needs all four corner crosses; cells with an unknown corner, or
/// whose corners are degenerate, are left as `None`.
pub fn warp_cells_to_squares(
    image: &GrayImageView<'_>,
    grid: &DenseGrid,
    side: usize,
) -> Result<CellImages, CellWarpError> {
    if side == 0 {
        return Err(CellWarpError::ZeroSide);
    }
    if grid.rows() < 2 || grid.cols() < 2 {
        return Err(CellWarpError::GridTooSmall {
            rows: grid.rows(),
            cols: grid.cols(),
        });
    }

    let (rows, cols) = (grid.rows() - 1, grid.cols() - 1);
    let s = side as f32;
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(s, 0.0),
        Point2::new(s, s),
        Point2::new(0.0, s),
    ];

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let warped = cell_quad(grid, row, col)
                .and_then(|quad| homography_from_4pt(&square, &quad))
                .map(|h| warp_perspective_gray(image, &h, side, side));
            cells.push(warped);
        }
    }

    let out = CellImages {
        rows,
        cols,
        side,
        cells,
    };
    log::debug!(
        "warped {} of {} cells to {}x{}",
        out.warped_count(),
        rows * cols,
        side,
        side
    );
    Ok(out)
}

// tl, tr, br, bl
fn cell_quad(grid: &DenseGrid, row: usize, col: usize) -> Option<[Point2<f32>; 4]> {
    Some([
        grid.get(row, col)?,
        grid.get(row, col + 1)?,
        grid.get(row + 1, col + 1)?,
        grid.get(row + 1, col)?,
    ])
}

/// Axis-aligned box from a cell's top-left cross to its bottom-right cross.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One rectangle per cell of `grid`, `None` where either diagonal cross is
/// unknown. Empty for grids with fewer than 2×2 crosses.
pub fn cell_rects(grid: &DenseGrid) -> Vec<Vec<Option<CellRect>>> {
    let rows = grid.rows().saturating_sub(1);
    let cols = grid.cols().saturating_sub(1);
    (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| {
                    let tl = grid.get(row, col)?;
                    let br = grid.get(row + 1, col + 1)?;
                    Some(CellRect {
                        x: tl.x,
                        y: tl.y,
                        width: br.x - tl.x,
                        height: br.y - tl.y,
                    })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 3x3 crosses 10 px apart starting at (5, 5).
    fn lattice() -> DenseGrid {
        DenseGrid::from_rows(
            (0..3)
                .map(|r| {
                    (0..3)
                        .map(|c| Some(Point2::new(5.0 + 10.0 * c as f32, 5.0 + 10.0 * r as f32)))
                        .collect()
                })
                .collect(),
        )
        .expect("rectangular")
    }

    #[test]
    fn warps_each_cell_to_a_square() {
        // Paint cell (1, 0) dark.
        let mut img = GrayImage::filled(40, 40, 200);
        for y in 15..25 {
            for x in 5..15 {
                img.set(x, y, 10);
            }
        }
        let cells = warp_cells_to_squares(&img.view(), &lattice(), 8).expect("cells");
        assert_eq!((cells.rows(), cells.cols(), cells.side()), (2, 2, 8));
        assert_eq!(cells.warped_count(), 4);

        let dark = cells.get(1, 0).expect("cell (1, 0)");
        assert_eq!((dark.width, dark.height), (8, 8));
        assert_eq!(dark.get(4, 4), 10);
        assert_eq!(cells.get(0, 1).expect("cell (0, 1)").get(4, 4), 200);
    }

    #[test]
    fn cell_with_unknown_corner_is_skipped() {
        let img = GrayImage::filled(40, 40, 128);
        let mut grid = lattice();
        grid.set(2, 2, None);
        let cells = warp_cells_to_squares(&img.view(), &grid, 20).expect("cells");
        assert_eq!(cells.warped_count(), 3);
        assert!(cells.get(1, 1).is_none());
        let order: Vec<(usize, usize)> = cells.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let img = GrayImage::filled(10, 10, 0);
        assert_eq!(
            warp_cells_to_squares(&img.view(), &DenseGrid::empty(), 20).unwrap_err(),
            CellWarpError::GridTooSmall { rows: 0, cols: 0 }
        );
        assert_eq!(
            warp_cells_to_squares(&img.view(), &lattice(), 0).unwrap_err(),
            CellWarpError::ZeroSide
        );
    }

    #[test]
    fn rects_span_diagonal_crosses() {
        let mut grid = lattice();
        grid.set(0, 0, None);
        let rects = cell_rects(&grid);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0][0], None);
        assert_eq!(
            rects[1][1],
            Some(CellRect {
                x: 15.0,
                y: 15.0,
                width: 10.0,
                height: 10.0
            })
        );
        assert!(cell_rects(&DenseGrid::empty()).is_empty());
    }
}
