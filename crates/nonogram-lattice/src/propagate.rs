use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GridIndex, NeighborDirection, SparseGridMap};

/// Confirms a marker near a predicted location.
///
/// Returns the actual location, or `None` when nothing in the search window
/// matches well enough.
pub trait LocalSearch {
    fn search(&mut self, predicted: Point2<f32>) -> Option<Point2<f32>>;
}

impl<F> LocalSearch for F
where
    F: FnMut(Point2<f32>) -> Option<Point2<f32>>,
{
    #[inline]
    fn search(&mut self, predicted: Point2<f32>) -> Option<Point2<f32>> {
        self(predicted)
    }
}

/// Progress hooks for [`propagate`]. All methods default to no-ops.
pub trait GrowObserver {
    fn on_confirmed(&mut self, _index: GridIndex, _predicted: Point2<f32>, _found: Point2<f32>) {}
    fn on_rejected(&mut self, _index: GridIndex, _predicted: Point2<f32>) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl GrowObserver for NoopObserver {}

/// Breadth-first lattice growth from `seeds`.
///
/// Each queued index is verified by `search` at its predicted location. A
/// confirmed index is recorded and every neighbour along `directions` that
/// was never queued before is queued with the prediction
/// `found + unit(direction) * cell_size`. An index that fails verification is
/// dropped and not expanded, so a missing marker truncates the branch behind
/// it unless another path reaches it.
///
/// Seeds sharing an index are deduplicated; the first one wins. The result
/// is never an error: it may be partial or empty.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(seeds, search, observer),
        fields(seeds = seeds.len(), found = tracing::field::Empty)
    )
)]
pub fn propagate<S, O>(
    seeds: &[(GridIndex, Point2<f32>)],
    directions: &[NeighborDirection],
    cell_size: f32,
    search: &mut S,
    observer: &mut O,
) -> SparseGridMap
where
    S: LocalSearch + ?Sized,
    O: GrowObserver + ?Sized,
{
    let mut queue: VecDeque<GridIndex> = VecDeque::with_capacity(seeds.len());
    let mut queued: HashSet<GridIndex> = HashSet::with_capacity(seeds.len());
    let mut predicted: HashMap<GridIndex, Point2<f32>> = HashMap::with_capacity(seeds.len());

    for &(index, location) in seeds {
        if queued.insert(index) {
            queue.push_back(index);
            predicted.insert(index, location);
        }
    }

    let mut found_map = SparseGridMap::new();

    while let Some(index) = queue.pop_front() {
        let Some(&guess) = predicted.get(&index) else {
            continue;
        };

        let Some(found) = search.search(guess) else {
            observer.on_rejected(index, guess);
            continue;
        };

        observer.on_confirmed(index, guess, found);
        found_map.insert(index, found);

        for &dir in directions {
            let neighbor = index.step(dir);
            if queued.insert(neighbor) {
                queue.push_back(neighbor);
                predicted.insert(neighbor, found + dir.unit() * cell_size);
            }
        }
    }

    log::debug!(
        "propagated {} seed(s) -> {} confirmed of {} visited",
        seeds.len(),
        found_map.len(),
        queued.len()
    );
    #[cfg(feature = "tracing")]
    tracing::Span::current().record("found", found_map.len());

    found_map
}
