use nalgebra::Point2;
use nonogram_lattice::{AugmentReport, DenseGrid, GridIndex, GrowObserver};
use serde::{Deserialize, Serialize};

use crate::{BinaryImage, Seed};

/// Stages of [`crate::CrossLocsDetector::detect`], in the order they are
/// entered. `Failed` is terminal and replaces any later stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionState {
    Init,
    Resized,
    Binarized,
    SeedFound,
    MainPropagated,
    TopPropagated,
    LeftPropagated,
    Rescaled,
    Failed,
}

/// Which lattice a propagation pass is growing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Main,
    Top,
    Left,
}

/// Hooks into a running detection, for debugging and visualisation.
///
/// Every method defaults to a no-op. Locations are in working-image pixels
/// until `Rescaled` is entered.
pub trait DetectionObserver {
    fn on_state(&mut self, _state: DetectionState) {}
    fn on_binarized(&mut self, _image: &BinaryImage) {}
    fn on_seed(&mut self, _seed: &Seed) {}
    /// One local verification; `found` is `None` when it was rejected.
    fn on_probe(
        &mut self,
        _pass: Pass,
        _index: GridIndex,
        _predicted: Point2<f32>,
        _found: Option<Point2<f32>>,
    ) {
    }
    /// Pass finished: `grid` is densified, padded and augmented.
    fn on_pass_done(&mut self, _pass: Pass, _grid: &DenseGrid, _report: &AugmentReport) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDetectionObserver;

impl DetectionObserver for NoopDetectionObserver {}

// Forwards lattice growth events to a detection observer, tagged with the pass.
pub(crate) struct PassObserver<'a, O: ?Sized> {
    pub pass: Pass,
    pub inner: &'a mut O,
}

impl<O: DetectionObserver + ?Sized> GrowObserver for PassObserver<'_, O> {
    fn on_confirmed(&mut self, index: GridIndex, predicted: Point2<f32>, found: Point2<f32>) {
        self.inner.on_probe(self.pass, index, predicted, Some(found));
    }

    fn on_rejected(&mut self, index: GridIndex, predicted: Point2<f32>) {
        self.inner.on_probe(self.pass, index, predicted, None);
    }
}
