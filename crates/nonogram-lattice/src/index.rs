use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Logical lattice position. Indices are relative to the first seed and may
/// be negative.
///
/// Ordering compares `col` first, then `row`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridIndex {
    pub col: i32,
    pub row: i32,
}

impl GridIndex {
    pub const ORIGIN: GridIndex = GridIndex { col: 0, row: 0 };

    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// The adjacent index in `direction`.
    #[inline]
    pub fn step(self, direction: NeighborDirection) -> Self {
        let (dc, dr) = direction.index_delta();
        Self::new(self.col + dc, self.row + dr)
    }
}

impl From<(i32, i32)> for GridIndex {
    fn from((col, row): (i32, i32)) -> Self {
        Self::new(col, row)
    }
}

/// One of the four lattice axes directions. Image `y` grows downward, so
/// `Up` decreases the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborDirection {
    Up,
    Right,
    Down,
    Left,
}

impl NeighborDirection {
    pub const ALL: [NeighborDirection; 4] = [
        NeighborDirection::Up,
        NeighborDirection::Right,
        NeighborDirection::Down,
        NeighborDirection::Left,
    ];

    /// `(d_col, d_row)` of one step in this direction.
    #[inline]
    pub const fn index_delta(self) -> (i32, i32) {
        match self {
            NeighborDirection::Up => (0, -1),
            NeighborDirection::Right => (1, 0),
            NeighborDirection::Down => (0, 1),
            NeighborDirection::Left => (-1, 0),
        }
    }

    /// Unit pixel offset of one step in this direction.
    #[inline]
    pub fn unit(self) -> Vector2<f32> {
        let (dc, dr) = self.index_delta();
        Vector2::new(dc as f32, dr as f32)
    }

    pub const fn opposite(self) -> Self {
        match self {
            NeighborDirection::Up => NeighborDirection::Down,
            NeighborDirection::Right => NeighborDirection::Left,
            NeighborDirection::Down => NeighborDirection::Up,
            NeighborDirection::Left => NeighborDirection::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_column_major() {
        let mut v = vec![
            GridIndex::new(1, -3),
            GridIndex::new(0, 5),
            GridIndex::new(1, -4),
            GridIndex::new(-2, 0),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                GridIndex::new(-2, 0),
                GridIndex::new(0, 5),
                GridIndex::new(1, -4),
                GridIndex::new(1, -3),
            ]
        );
    }

    #[test]
    fn steps_are_unit_and_reversible() {
        let start = GridIndex::new(3, 7);
        for dir in NeighborDirection::ALL {
            let next = start.step(dir);
            let manhattan = (next.col - start.col).abs() + (next.row - start.row).abs();
            assert_eq!(manhattan, 1);
            assert_eq!(next.step(dir.opposite()), start);
            assert_eq!(dir.unit().norm(), 1.0);
        }
        assert_eq!(start.step(NeighborDirection::Up), GridIndex::new(3, 6));
    }
}
