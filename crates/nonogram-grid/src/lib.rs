//! High-level facade crate for the `nonogram-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates under short names
//! - (feature `image`) helpers that run the detector on `image::GrayImage`,
//!   draw the detected lattices and save rectified cell images
//! - (feature `cli`) the `nonogram-grid` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use nonogram_grid::detect;
//! use nonogram_grid::CrossLocsParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("puzzle.jpg")?.to_luma8();
//! let crosses = detect::detect_crosses(&img, CrossLocsParams::default())?;
//! println!(
//!     "main {}x{}, top {}x{}, left {}x{}",
//!     crosses.main.rows(),
//!     crosses.main.cols(),
//!     crosses.top.rows(),
//!     crosses.top.cols(),
//!     crosses.left.rows(),
//!     crosses.left.cols()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `nonogram_grid::core`: grayscale images, resampling, homographies, logging.
//! - `nonogram_grid::lattice`: lattice indices, growth, dense grids, gap filling.
//! - `nonogram_grid::crosses`: binarization, template matching, the detector.
//! - `nonogram_grid::detect` (feature `image`): end-to-end helpers.

pub use nonogram_crosses as crosses;
pub use nonogram_grid_core as core;
pub use nonogram_lattice as lattice;

pub use nonogram_crosses::{CrossLocs, CrossLocsDetector, CrossLocsParams, DetectError, Pass};
pub use nonogram_lattice::{DenseGrid, GridIndex};

#[cfg(feature = "image")]
pub mod detect;
