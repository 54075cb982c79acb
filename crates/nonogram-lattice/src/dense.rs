use std::collections::HashMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::GridIndex;

/// Markers confirmed by local search, keyed by lattice index.
pub type SparseGridMap = HashMap<GridIndex, Point2<f32>>;

/// Inclusive index range covered by a [`SparseGridMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub col_min: i32,
    pub col_max: i32,
    pub row_min: i32,
    pub row_max: i32,
}

impl BoundingBox {
    /// Smallest box covering all keys of `map`; `None` when the map is empty.
    pub fn of(map: &SparseGridMap) -> Option<Self> {
        let mut keys = map.keys();
        let first = keys.next()?;
        let init = BoundingBox {
            col_min: first.col,
            col_max: first.col,
            row_min: first.row,
            row_max: first.row,
        };
        Some(keys.fold(init, |b, g| BoundingBox {
            col_min: b.col_min.min(g.col),
            col_max: b.col_max.max(g.col),
            row_min: b.row_min.min(g.row),
            row_max: b.row_max.max(g.row),
        }))
    }

    #[inline]
    pub fn top_left(&self) -> GridIndex {
        GridIndex::new(self.col_min, self.row_min)
    }

    #[inline]
    pub fn cols(&self) -> usize {
        (self.col_max - self.col_min) as usize + 1
    }

    #[inline]
    pub fn rows(&self) -> usize {
        (self.row_max - self.row_min) as usize + 1
    }

    pub fn contains(&self, g: GridIndex) -> bool {
        (self.col_min..=self.col_max).contains(&g.col)
            && (self.row_min..=self.row_max).contains(&g.row)
    }
}

/// Extra unknown rows/columns placed around a densified grid, leaving room
/// for extrapolated border markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl Padding {
    pub const NONE: Padding = Padding::new(0, 0, 0, 0);

    pub const fn new(top: usize, right: usize, bottom: usize, left: usize) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(n: usize) -> Self {
        Self::new(n, n, n, n)
    }
}

/// Rectangular `rows × cols` grid of optional marker locations.
///
/// Cell `(0, 0)` corresponds to lattice index `origin`; cell `(row, col)` to
/// `origin + (col, row)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DenseGridRepr")]
pub struct DenseGrid {
    rows: usize,
    cols: usize,
    origin: GridIndex,
    cells: Vec<Option<Point2<f32>>>, // row-major
}

// Unchecked wire form; `rows * cols` must match the cell count.
#[derive(Deserialize)]
struct DenseGridRepr {
    rows: usize,
    cols: usize,
    origin: GridIndex,
    cells: Vec<Option<Point2<f32>>>,
}

impl TryFrom<DenseGridRepr> for DenseGrid {
    type Error = String;

    fn try_from(r: DenseGridRepr) -> Result<Self, Self::Error> {
        if r.rows.checked_mul(r.cols) != Some(r.cells.len()) {
            return Err(format!(
                "dense grid of {}x{} needs {} cells, got {}",
                r.rows,
                r.cols,
                r.rows.saturating_mul(r.cols),
                r.cells.len()
            ));
        }
        Ok(Self {
            rows: r.rows,
            cols: r.cols,
            origin: r.origin,
            cells: r.cells,
        })
    }
}

impl DenseGrid {
    /// A grid with every cell unknown.
    pub fn unknown(rows: usize, cols: usize, origin: GridIndex) -> Self {
        Self {
            rows,
            cols,
            origin,
            cells: vec![None; rows * cols],
        }
    }

    /// The 0×0 grid.
    pub fn empty() -> Self {
        Self::unknown(0, 0, GridIndex::ORIGIN)
    }

    /// Build a grid from row vectors. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<Option<Point2<f32>>>>) -> Option<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return None;
        }
        Some(Self {
            rows: n_rows,
            cols: n_cols,
            origin: GridIndex::ORIGIN,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Densify a sparse map into its bounding box plus `padding`.
    ///
    /// Returns `None` for an empty map: there is no bounding box to allocate.
    pub fn from_sparse(map: &SparseGridMap, padding: Padding) -> Option<Self> {
        let bbox = BoundingBox::of(map)?;
        let rows = bbox.rows() + padding.top + padding.bottom;
        let cols = bbox.cols() + padding.left + padding.right;
        let top_left = bbox.top_left();
        let origin = GridIndex::new(
            top_left.col - padding.left as i32,
            top_left.row - padding.top as i32,
        );

        let mut grid = Self::unknown(rows, cols, origin);
        for (g, p) in map {
            let col = (g.col - origin.col) as usize;
            let row = (g.row - origin.row) as usize;
            grid.cells[row * cols + col] = Some(*p);
        }
        Some(grid)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Lattice index of cell `(0, 0)`.
    #[inline]
    pub fn origin(&self) -> GridIndex {
        self.origin
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Point2<f32>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    /// Store `value` at `(row, col)`. Returns `false`, leaving the grid
    /// unchanged, when the cell is outside the grid.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Option<Point2<f32>>) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.cells[row * self.cols + col] = value;
        true
    }

    /// Location stored for lattice index `g`, if it lies inside the grid.
    pub fn get_index(&self, g: GridIndex) -> Option<Point2<f32>> {
        let col = usize::try_from(g.col - self.origin.col).ok()?;
        let row = usize::try_from(g.row - self.origin.row).ok()?;
        self.get(row, col)
    }

    /// Lattice index of cell `(row, col)`.
    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> GridIndex {
        GridIndex::new(self.origin.col + col as i32, self.origin.row + row as i32)
    }

    /// All cells in row-major order as `(row, col, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Option<Point2<f32>>)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, p)| (i / cols, i % cols, *p))
    }

    /// Known cells in row-major order as `(row, col, location)`.
    pub fn known(&self) -> impl Iterator<Item = (usize, usize, Point2<f32>)> + '_ {
        self.iter().filter_map(|(r, c, p)| Some((r, c, p?)))
    }

    pub fn known_count(&self) -> usize {
        self.cells.iter().filter(|p| p.is_some()).count()
    }

    pub fn unknown_count(&self) -> usize {
        self.cells.len() - self.known_count()
    }

    /// `true` when every cell holds a location (vacuously for a 0×0 grid).
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Apply `f` to every known location in place.
    pub fn map_locations(&mut self, mut f: impl FnMut(Point2<f32>) -> Point2<f32>) {
        for p in self.cells.iter_mut().flatten() {
            *p = f(*p);
        }
    }

    /// Copy of the grid with every location divided by `scale`.
    ///
    /// Used to map working-resolution coordinates back to the source image.
    pub fn rescaled(&self, scale: f32) -> Self {
        let mut out = self.clone();
        out.map_locations(|p| Point2::new(p.x / scale, p.y / scale));
        out
    }

    /// Rows of optional locations, for serialisation and downstream warping.
    pub fn to_rows(&self) -> Vec<Vec<Option<Point2<f32>>>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.cols).map(<[_]>::to_vec).collect()
    }

    /// One text line per row, `1` for a known cell and `0` for an unknown one.
    pub fn occupancy_map(&self) -> String {
        let mut s = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                s.push(if self.get(row, col).is_some() { '1' } else { '0' });
            }
            s.push('\n');
        }
        s
    }
}
