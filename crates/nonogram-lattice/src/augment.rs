use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DenseGrid, NeighborDirection};

/// Outcome of [`augment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentReport {
    /// Sweeps over the unknown cells, including the final one that made no
    /// progress (if any).
    pub iterations: usize,
    /// Cells that received an interpolated location.
    pub filled: usize,
    /// Cells still unknown after the fixed point was reached.
    pub unresolved: usize,
}

impl AugmentReport {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unresolved == 0
    }
}

/// Fill unknown cells from their known 4-neighbours.
///
/// A known neighbour contributes `neighbour + cell_size * d`, `d` being the
/// unit step from the neighbour to the cell; the cell takes the mean of all
/// contributions. Every sweep is computed against the grid as it was at the
/// start of the sweep and applied at once, so the scan order does not bias
/// the result. Sweeps repeat until nothing is unknown or a sweep resolves no
/// cell.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(grid),
        fields(rows = grid.rows(), cols = grid.cols())
    )
)]
pub fn augment(grid: &mut DenseGrid, cell_size: f32) -> AugmentReport {
    let mut pending: Vec<(usize, usize)> = grid
        .iter()
        .filter(|(_, _, p)| p.is_none())
        .map(|(r, c, _)| (r, c))
        .collect();

    let mut report = AugmentReport::default();

    while !pending.is_empty() {
        report.iterations += 1;

        let resolved: Vec<(usize, usize, Point2<f32>)> = pending
            .iter()
            .filter_map(|&(r, c)| Some((r, c, interpolate(grid, r, c, cell_size)?)))
            .collect();

        if resolved.is_empty() {
            break;
        }

        for &(r, c, p) in &resolved {
            grid.set(r, c, Some(p));
        }
        report.filled += resolved.len();
        pending.retain(|&(r, c)| grid.get(r, c).is_none());
    }

    report.unresolved = pending.len();
    if report.unresolved > 0 {
        log::warn!(
            "augmentation stalled with {} unknown cell(s) in a {}x{} grid",
            report.unresolved,
            grid.rows(),
            grid.cols()
        );
    }
    report
}

fn interpolate(grid: &DenseGrid, row: usize, col: usize, cell_size: f32) -> Option<Point2<f32>> {
    let mut sum = Vector2::zeros();
    let mut n = 0usize;

    for dir in NeighborDirection::ALL {
        let (dc, dr) = dir.index_delta();
        let (Some(nr), Some(nc)) = (
            row.checked_add_signed(dr as isize),
            col.checked_add_signed(dc as isize),
        ) else {
            continue;
        };
        let Some(neighbor) = grid.get(nr, nc) else {
            continue;
        };
        // `dir` points from the cell to the neighbour; step back from it.
        sum += neighbor.coords - dir.unit() * cell_size;
        n += 1;
    }

    (n > 0).then(|| Point2::from(sum / n as f32))
}
