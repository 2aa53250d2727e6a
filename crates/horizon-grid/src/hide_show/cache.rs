use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::span_names;

use crate::coordinate::Orientation;
use crate::layer::{Layer, position_in_starts, prefix_starts};

/// The underlying positions visible along one axis of a filtering layer,
/// with the pixel prefix sums of the visible positions.
#[derive(Debug, Clone, Default)]
pub(crate) struct VisibleCache {
    /// Local position to underlying position, ascending.
    positions: Vec<usize>,
    starts: Vec<i32>,
}

impl VisibleCache {
    /// Keep the underlying positions whose index is not hidden.
    pub(crate) fn build(
        underlying: &dyn Layer,
        axis: Orientation,
        is_hidden: impl Fn(usize) -> bool,
    ) -> Self {
        let _span = PerfSpan::new(span_names::CACHE_REBUILD);
        let positions: Vec<usize> = (0..underlying.count(axis))
            .filter(|&position| {
                underlying
                    .index_by_position(axis, position)
                    .is_some_and(|index| !is_hidden(index))
            })
            .collect();
        let starts = prefix_starts(
            positions
                .iter()
                .map(|&position| underlying.size_by_position(axis, position)),
        );
        Self { positions, starts }
    }

    pub(crate) fn count(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn local_to_underlying(&self, position: usize) -> Option<usize> {
        self.positions.get(position).copied()
    }

    pub(crate) fn underlying_to_local(&self, underlying_position: usize) -> Option<usize> {
        self.positions.binary_search(&underlying_position).ok()
    }

    pub(crate) fn extent(&self) -> i32 {
        self.starts.last().copied().unwrap_or(0)
    }

    pub(crate) fn size(&self, position: usize) -> i32 {
        match (self.starts.get(position), self.starts.get(position + 1)) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    pub(crate) fn start_pixel(&self, position: usize) -> Option<i32> {
        (position < self.positions.len()).then(|| self.starts[position])
    }

    pub(crate) fn position_by_pixel(&self, pixel: i32) -> Option<usize> {
        position_in_starts(&self.starts, pixel)
    }
}
