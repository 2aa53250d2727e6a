use std::sync::Arc;

use super::{Layer, LayerId};
use crate::coordinate::{Orientation, Range, position_util};
use crate::event::LayerEvent;

/// Walk down from `layer` until the layer with id `target` is reached,
/// converting `position` at every level.
///
/// Layers with several underlying layers along `axis` (composites) try each
/// in turn. Returns the target layer and the converted position.
pub fn convert_position_to_target(
    axis: Orientation,
    layer: &Arc<dyn Layer>,
    position: usize,
    target: LayerId,
) -> Option<(Arc<dyn Layer>, usize)> {
    if layer.id() == target {
        return (position < layer.count(axis)).then(|| (layer.clone(), position));
    }
    let underlying_position = layer.local_to_underlying(axis, position)?;
    layer
        .underlying_layers_by_position(axis, position)
        .iter()
        .find_map(|underlying| {
            convert_position_to_target(axis, underlying, underlying_position, target)
        })
}

/// Convert many positions of `source` into `local`'s space, dropping those
/// not visible locally. The result is sorted and distinct.
pub fn convert_positions<L: Layer + ?Sized>(
    local: &L,
    axis: Orientation,
    source: LayerId,
    positions: impl IntoIterator<Item = usize>,
) -> Vec<usize> {
    let mut converted: Vec<usize> = positions
        .into_iter()
        .filter_map(|position| local.underlying_to_local(axis, source, position))
        .collect();
    converted.sort_unstable();
    converted.dedup();
    converted
}

/// Convert position ranges of `source` into `local`'s space.
pub fn underlying_to_local_ranges<L: Layer + ?Sized>(
    local: &L,
    axis: Orientation,
    source: LayerId,
    ranges: &[Range],
) -> Vec<Range> {
    position_util::get_ranges(convert_positions(
        local,
        axis,
        source,
        ranges.iter().flat_map(Range::members),
    ))
}

/// The layer and underlying positions providing the content of a local cell.
pub fn underlying_cell<L: Layer + ?Sized>(
    layer: &L,
    column: usize,
    row: usize,
) -> Option<(Arc<dyn Layer>, usize, usize)> {
    let underlying = layer.underlying_layer_by_cell(column, row)?;
    let underlying_column = layer.local_to_underlying(Orientation::Horizontal, column)?;
    let underlying_row = layer.local_to_underlying(Orientation::Vertical, row)?;
    Some((underlying, underlying_column, underlying_row))
}

/// Convert `event` for `layer`, let `update` apply the original to the
/// layer's state, then fire the converted copy if it was accepted.
///
/// Conversion runs first so it resolves against the mapping from before
/// the change.
pub(crate) fn relay_event(layer: &dyn Layer, event: LayerEvent, update: impl FnOnce(&LayerEvent)) {
    let mut local = event.clone();
    let accepted = local.convert_to_local(layer);
    update(&event);
    if accepted {
        layer.fire_layer_event(local);
    }
}

/// Prefix sums of `sizes`: `starts[i]` is the start pixel of position `i`
/// and the last entry is the total extent. Totals past `i32::MAX` saturate.
pub(crate) fn prefix_starts(sizes: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut starts = vec![0];
    let mut total: i32 = 0;
    for size in sizes {
        total = total.saturating_add(size.max(0));
        starts.push(total);
    }
    starts
}

/// The position covering `pixel` in prefix sums built by [`prefix_starts`].
pub(crate) fn position_in_starts(starts: &[i32], pixel: i32) -> Option<usize> {
    let extent = *starts.last()?;
    if pixel < 0 || pixel >= extent {
        return None;
    }
    Some(starts.partition_point(|&start| start <= pixel) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_starts() {
        assert_eq!(prefix_starts([10, 20, 30]), vec![0, 10, 30, 60]);
        assert_eq!(prefix_starts(std::iter::empty()), vec![0]);
    }

    #[test]
    fn test_prefix_starts_saturate() {
        let half = i32::MAX / 2;
        let starts = prefix_starts([half, half, 100, 100]);
        assert_eq!(starts, vec![0, half, 2 * half, i32::MAX, i32::MAX]);
        assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(position_in_starts(&starts, half + 1), Some(1));
        assert_eq!(position_in_starts(&starts, i32::MAX - 1), Some(2));
    }

    #[test]
    fn test_position_in_starts() {
        let starts = prefix_starts([10, 0, 20]);
        assert_eq!(position_in_starts(&starts, 0), Some(0));
        assert_eq!(position_in_starts(&starts, 9), Some(0));
        assert_eq!(position_in_starts(&starts, 10), Some(2));
        assert_eq!(position_in_starts(&starts, 29), Some(2));
        assert_eq!(position_in_starts(&starts, 30), None);
        assert_eq!(position_in_starts(&starts, -1), None);
        assert_eq!(position_in_starts(&[0], 0), None);
    }
}
