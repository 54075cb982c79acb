use nalgebra::{Point2, Vector2};
use nonogram_grid_core::{resize_to_max_side, GrayImageView};
use nonogram_lattice::{
    augment, propagate, AugmentReport, DenseGrid, GridIndex, NeighborDirection, Padding,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::observer::PassObserver;
use crate::{
    binarize_adaptive_mean, find_seed, find_template_in_integral, BinaryImage, CrossLocsParams,
    DetectError, DetectionObserver, DetectionState, IntegralImage, NoopDetectionObserver, Pass,
    Region, Template,
};

const TOP_DIRECTIONS: [NeighborDirection; 3] = [
    NeighborDirection::Up,
    NeighborDirection::Right,
    NeighborDirection::Left,
];

const LEFT_DIRECTIONS: [NeighborDirection; 3] = [
    NeighborDirection::Up,
    NeighborDirection::Down,
    NeighborDirection::Left,
];

/// Per-pass counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    /// Markers confirmed by template matching.
    pub confirmed: usize,
    pub augment: AugmentReport,
}

/// Counters of the main, top and left passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub main: PassStats,
    pub top: PassStats,
    pub left: PassStats,
}

/// Detected cross lattices, in source-image pixels.
///
/// `main` covers the puzzle body padded by one cell on every side. `top`
/// and `left` cover the clue areas and are 0×0 when nothing was found there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossLocs {
    pub main: DenseGrid,
    pub top: DenseGrid,
    pub left: DenseGrid,
    /// Cell side in working-image pixels.
    pub cell_size: u32,
    /// Working size divided by source size.
    pub scale: f32,
    pub stats: DetectionStats,
}

impl CrossLocs {
    pub fn grid(&self, pass: Pass) -> &DenseGrid {
        match pass {
            Pass::Main => &self.main,
            Pass::Top => &self.top,
            Pass::Left => &self.left,
        }
    }

    fn rescale(&mut self, scale: f32) {
        self.main = self.main.rescaled(scale);
        self.top = self.top.rescaled(scale);
        self.left = self.left.rescaled(scale);
        self.scale = scale;
    }
}

/// Finds the cross lattices of a nonogram photo.
#[derive(Clone, Debug)]
pub struct CrossLocsDetector {
    params: CrossLocsParams,
}

impl CrossLocsDetector {
    pub fn new(params: CrossLocsParams) -> Result<Self, DetectError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CrossLocsParams {
        &self.params
    }

    pub fn detect(&self, image: &GrayImageView<'_>) -> Result<CrossLocs, DetectError> {
        self.detect_with_observer(image, &mut NoopDetectionObserver)
    }

    /// Full pipeline: resize, binarize, detect, map back to `image` pixels.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, observer),
            fields(width = image.width, height = image.height)
        )
    )]
    pub fn detect_with_observer<O>(
        &self,
        image: &GrayImageView<'_>,
        observer: &mut O,
    ) -> Result<CrossLocs, DetectError>
    where
        O: DetectionObserver + ?Sized,
    {
        observer.on_state(DetectionState::Init);
        let result = self.run(image, observer);
        if let Err(e) = &result {
            log::warn!("detection failed: {e}");
            observer.on_state(DetectionState::Failed);
        }
        result
    }

    fn run<O>(&self, image: &GrayImageView<'_>, observer: &mut O) -> Result<CrossLocs, DetectError>
    where
        O: DetectionObserver + ?Sized,
    {
        let p = &self.params;
        let resized = resize_to_max_side(image, p.resize_max_side);
        let work = resized.image.view();
        if work.width < p.threshold_block_size || work.height < p.threshold_block_size {
            return Err(DetectError::ImageTooSmall {
                width: image.width,
                height: image.height,
            });
        }
        log::info!(
            "working image {}x{} (scale {:.4})",
            work.width,
            work.height,
            resized.scale
        );
        observer.on_state(DetectionState::Resized);

        let binary = binarize_adaptive_mean(&work, p.threshold_block_size, p.threshold_c);
        observer.on_binarized(&binary);
        observer.on_state(DetectionState::Binarized);

        let mut crosses = self.detect_binary_with_observer(&binary, observer)?;
        crosses.rescale(resized.scale);
        observer.on_state(DetectionState::Rescaled);
        Ok(crosses)
    }

    /// Detect on an already binarized working image. Locations stay in
    /// `binary` pixels and `scale` is `1.0`.
    pub fn detect_binary(&self, binary: &BinaryImage) -> Result<CrossLocs, DetectError> {
        self.detect_binary_with_observer(binary, &mut NoopDetectionObserver)
    }

    pub fn detect_binary_with_observer<O>(
        &self,
        binary: &BinaryImage,
        observer: &mut O,
    ) -> Result<CrossLocs, DetectError>
    where
        O: DetectionObserver + ?Sized,
    {
        let p = &self.params;

        let window = Region::new(
            (binary.width / 2) as i32 - (p.seed_window / 2) as i32,
            (binary.height / 2) as i32 - (p.seed_window / 2) as i32,
            p.seed_window,
            p.seed_window,
        )
        .clamped_to(binary.width, binary.height);

        let seed = find_seed(
            binary,
            window,
            p.cell_side_min..=p.cell_side_max,
            p.similarity_ratio_min,
        )
        .ok_or(DetectError::SeedNotFound {
            side_min: p.cell_side_min,
            side_max: p.cell_side_max,
        })?;
        observer.on_seed(&seed);
        observer.on_state(DetectionState::SeedFound);

        let cell = seed.cell_size;
        let integral = IntegralImage::new(binary);
        let (main, main_stats) = self
            .grow_pass(&integral, Pass::Main, &[(GridIndex::ORIGIN, seed.location)], cell, observer)
            .ok_or(DetectError::EmptyMainGrid {
                x: seed.location.x,
                y: seed.location.y,
            })?;
        observer.on_state(DetectionState::MainPropagated);

        let (top, top_stats) = self
            .grow_pass(&integral, Pass::Top, &top_seeds(&main, cell as f32), cell, observer)
            .unwrap_or_else(empty_pass);
        observer.on_state(DetectionState::TopPropagated);

        let (left, left_stats) = self
            .grow_pass(&integral, Pass::Left, &left_seeds(&main, cell as f32), cell, observer)
            .unwrap_or_else(empty_pass);
        observer.on_state(DetectionState::LeftPropagated);

        Ok(CrossLocs {
            main,
            top,
            left,
            cell_size: cell,
            scale: 1.0,
            stats: DetectionStats {
                main: main_stats,
                top: top_stats,
                left: left_stats,
            },
        })
    }

    // Propagate, densify and augment one lattice. `None` when nothing was
    // confirmed.
    fn grow_pass<O>(
        &self,
        integral: &IntegralImage,
        pass: Pass,
        seeds: &[(GridIndex, Point2<f32>)],
        cell: u32,
        observer: &mut O,
    ) -> Option<(DenseGrid, PassStats)>
    where
        O: DetectionObserver + ?Sized,
    {
        let length = (cell / 2 * 2 + 1) as usize;
        let (directions, padding, template): (&[NeighborDirection], Padding, Template) = match pass
        {
            Pass::Main => (
                &NeighborDirection::ALL[..],
                Padding::uniform(1),
                Template::cross_with_margin(length, (cell / 4 / 2) as usize),
            ),
            Pass::Top => (&TOP_DIRECTIONS[..], Padding::new(1, 1, 0, 0), Template::cross(length)),
            Pass::Left => (&LEFT_DIRECTIONS[..], Padding::new(0, 0, 1, 1), Template::cross(length)),
        };

        let roi = 2 * cell as usize;
        let threshold = self.params.similarity_ratio_min;
        let mut search = |predicted: Point2<f32>| -> Option<Point2<f32>> {
            find_template_in_integral(
                integral,
                Region::centered(predicted, roi, roi),
                &template,
                threshold,
            )
        };
        let mut tagged = PassObserver {
            pass,
            inner: &mut *observer,
        };
        let map = propagate(seeds, directions, cell as f32, &mut search, &mut tagged);

        let Some(mut grid) = DenseGrid::from_sparse(&map, padding) else {
            log::info!("{pass:?} pass: nothing confirmed from {} seed(s)", seeds.len());
            return None;
        };
        log::debug!("{pass:?} occupancy:\n{}", grid.occupancy_map());

        let report = augment(&mut grid, cell as f32);
        log::info!(
            "{pass:?} grid {}x{}: {} confirmed, {} filled, {} unresolved",
            grid.rows(),
            grid.cols(),
            map.len(),
            report.filled,
            report.unresolved
        );
        observer.on_pass_done(pass, &grid, &report);

        Some((
            grid,
            PassStats {
                confirmed: map.len(),
                augment: report,
            },
        ))
    }
}

fn empty_pass() -> (DenseGrid, PassStats) {
    (DenseGrid::empty(), PassStats::default())
}

// Row 1 of the padded main grid, shifted one cell up. Seed indices keep the
// main-grid column so top columns line up with main columns.
fn top_seeds(main: &DenseGrid, cell: f32) -> Vec<(GridIndex, Point2<f32>)> {
    (1..main.cols())
        .filter_map(|col| {
            let p = main.get(1, col)?;
            Some((GridIndex::new(col as i32, 1), p + Vector2::new(0.0, -cell)))
        })
        .collect()
}

// Column 1 of the padded main grid, shifted one cell left.
fn left_seeds(main: &DenseGrid, cell: f32) -> Vec<(GridIndex, Point2<f32>)> {
    (1..main.rows())
        .filter_map(|row| {
            let p = main.get(row, 1)?;
            Some((GridIndex::new(1, row as i32), p + Vector2::new(-cell, 0.0)))
        })
        .collect()
}
