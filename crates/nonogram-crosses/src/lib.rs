//! Cross-lattice detector for photographed nonogram puzzles.
//!
//! ## Quickstart
//!
//! ```no_run
//! use nonogram_crosses::{CrossLocsDetector, CrossLocsParams};
//! use nonogram_grid_core::GrayImageView;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (w, h) = (1200, 900);
//! let pixels = vec![255u8; w * h];
//! let view = GrayImageView::new(w, h, &pixels).ok_or("bad buffer")?;
//!
//! let detector = CrossLocsDetector::new(CrossLocsParams::default())?;
//! let crosses = detector.detect(&view)?;
//! println!("main grid: {}x{}", crosses.main.rows(), crosses.main.cols());
//! # Ok(())
//! # }
//! ```
//!
//! Algorithm:
//! 1. Resize to a fixed working resolution and binarize (adaptive mean).
//! 2. Find the cell size and one grid corner near the image centre by
//!    matching hollow squares of increasing side.
//! 3. Grow the main lattice breadth-first from that corner, confirming each
//!    predicted cross with a local template match. Templates are sums of
//!    weighted boxes scored on a summed-area table of the binary image.
//! 4. Densify, pad by one cell on every side and fill the gaps.
//! 5. Grow the top and left clue lattices from the first row/column of the
//!    main grid, outward only.
//! 6. Map all three grids back to source-image pixels.

mod binarize;
mod cells;
mod detector;
mod error;
mod integral;
mod matching;
mod observer;
mod params;
mod seed;
mod template;

pub use binarize::{binarize_adaptive_mean, BinaryImage};
pub use cells::{cell_rects, warp_cells_to_squares, CellImages, CellRect, CellWarpError};
pub use detector::{CrossLocs, CrossLocsDetector, DetectionStats, PassStats};
pub use error::DetectError;
pub use integral::IntegralImage;
pub use matching::{find_template_in_integral, find_template_in_region, Region};
pub use observer::{DetectionObserver, DetectionState, NoopDetectionObserver, Pass};
pub use params::CrossLocsParams;
pub use seed::{find_seed, Seed};
pub use template::Template;
