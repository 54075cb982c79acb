//! Lattice reconstruction over a 4-connected grid of markers.
//!
//! The crate knows nothing about images. Marker confirmation is delegated to
//! a [`LocalSearch`] implementation supplied by the caller; the crate only
//! handles index bookkeeping:
//!
//! 1. [`propagate`] grows a sparse `GridIndex -> location` map breadth-first
//!    from one or more seeds, predicting each neighbour one cell away from a
//!    confirmed marker and asking the local search to confirm it.
//! 2. [`DenseGrid::from_sparse`] turns the sparse map into a rectangular grid
//!    (optionally padded) with explicit unknown cells.
//! 3. [`augment`] fills unknown cells from known neighbours until a fixed
//!    point is reached.

mod augment;
mod dense;
mod index;
mod propagate;

pub use augment::{augment, AugmentReport};
pub use dense::{BoundingBox, DenseGrid, Padding, SparseGridMap};
pub use index::{GridIndex, NeighborDirection};
pub use propagate::{propagate, GrowObserver, LocalSearch, NoopObserver};
