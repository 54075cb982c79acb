use serde::{Deserialize, Serialize};

use crate::DetectError;

/// Configuration for [`crate::CrossLocsDetector`].
///
/// Pixel quantities refer to the working image, i.e. after the input has
/// been resized so that its longer side equals `resize_max_side`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossLocsParams {
    /// Longer side of the working image.
    pub resize_max_side: usize,
    /// Adaptive threshold window side. Must be odd and at least 3.
    pub threshold_block_size: usize,
    /// Offset subtracted from the local mean before thresholding.
    pub threshold_c: f32,
    /// Smallest cell side tried by the seed search.
    pub cell_side_min: u32,
    /// Largest cell side tried by the seed search.
    pub cell_side_max: u32,
    /// Minimum normalised template score, exclusive. In `(0, 1]`.
    pub similarity_ratio_min: f32,
    /// Side of the seed search window centred on the working image.
    pub seed_window: usize,
}

impl Default for CrossLocsParams {
    fn default() -> Self {
        Self {
            resize_max_side: 1200,
            threshold_block_size: 15,
            threshold_c: 10.0,
            cell_side_min: 5,
            cell_side_max: 50,
            similarity_ratio_min: 0.9,
            seed_window: 150,
        }
    }
}

impl CrossLocsParams {
    pub fn validate(&self) -> Result<(), DetectError> {
        let invalid = |msg: String| Err(DetectError::InvalidParams(msg));

        if self.resize_max_side == 0 {
            return invalid("resize_max_side must be positive".into());
        }
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return invalid(format!(
                "threshold_block_size must be odd and >= 3, got {}",
                self.threshold_block_size
            ));
        }
        if !self.threshold_c.is_finite() {
            return invalid("threshold_c must be finite".into());
        }
        if self.cell_side_min < 3 || self.cell_side_min > self.cell_side_max {
            return invalid(format!(
                "cell side range {}..={} is empty or below 3",
                self.cell_side_min, self.cell_side_max
            ));
        }
        if !(self.similarity_ratio_min > 0.0 && self.similarity_ratio_min <= 1.0) {
            return invalid(format!(
                "similarity_ratio_min must be in (0, 1], got {}",
                self.similarity_ratio_min
            ));
        }
        if self.seed_window == 0 {
            return invalid("seed_window must be positive".into());
        }
        Ok(())
    }
}
