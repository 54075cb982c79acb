//! Core image types and geometric utilities for nonogram grid detection.
//!
//! This crate is intentionally small. It does *not* depend on any concrete
//! image codec: callers hand in raw row-major grayscale buffers through
//! [`GrayImageView`] and get owned [`GrayImage`] buffers back.

mod homography;
mod image;
mod logger;
mod resize;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};
pub use resize::{resize_bilinear, resize_to_max_side, Resized};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, TraceFormat};

pub use logger::{default_directives, init_with_level, level_for_verbosity};
