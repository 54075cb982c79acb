use std::ops::RangeInclusive;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{find_template_in_integral, BinaryImage, IntegralImage, Region, Template};

/// Cell size estimate together with one grid corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    /// Side of the smallest hollow square that matched.
    pub cell_size: u32,
    /// Top-left corner of that square in working-image pixels.
    pub location: Point2<f32>,
}

/// Estimate the grid cell size by matching hollow squares of increasing side
/// inside `window`.
///
/// Sides are tried in ascending order and the first side with any match
/// wins, so the smallest consistent cell is reported. Returns `None` when no
/// side in `sides` matches.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image), fields(sides = ?sides))
)]
pub fn find_seed(
    image: &BinaryImage,
    window: Region,
    sides: RangeInclusive<u32>,
    similarity_min: f32,
) -> Option<Seed> {
    let integral = IntegralImage::of_region(image, window);
    for side in sides.clone() {
        if side < 2 {
            continue;
        }
        let template = Template::square(side as usize);
        if let Some(location) = find_template_in_integral(&integral, window, &template, similarity_min) {
            log::info!(
                "cell size {} px, seed at ({}, {})",
                side,
                location.x,
                location.y
            );
            return Some(Seed {
                cell_size: side,
                location,
            });
        }
    }

    log::warn!(
        "no cell found for sides {}..={} in window {:?}",
        sides.start(),
        sides.end(),
        window
    );
    None
}
