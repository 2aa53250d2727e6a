//! Reordering columns and rows.

mod command;

pub use command::{ReorderCommand, ResetOrderCommand};

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};

use crate::command::{LayerCommand, convert_command};
use crate::coordinate::Orientation;
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, position_in_starts, prefix_starts, relay_event};
use crate::persistence::Properties;

fn order_key(axis: Orientation) -> &'static str {
    match axis {
        Orientation::Horizontal => "columnIndexOrder",
        Orientation::Vertical => "rowIndexOrder",
    }
}

/// Mapping derived from the index order.
#[derive(Debug, Default)]
struct OrderCache {
    /// Local position to underlying position.
    positions: Vec<usize>,
    /// Underlying position to local position.
    locals: Vec<Option<usize>>,
    starts: Vec<i32>,
}

/// Presents the positions of its underlying layer in a caller-chosen order.
///
/// The order is kept as a list of underlying *indexes*, so it survives
/// changes below that shift positions.
pub struct ReorderLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    order: [RwLock<Vec<usize>>; 2],
    caches: [RwLock<Arc<OrderCache>>; 2],
}

impl ReorderLayer {
    pub fn new(underlying: Arc<dyn Layer>) -> Arc<Self> {
        let layer = Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("ReorderLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            Self {
                base,
                underlying,
                order: [RwLock::new(Vec::new()), RwLock::new(Vec::new())],
                caches: [
                    RwLock::new(Arc::new(OrderCache::default())),
                    RwLock::new(Arc::new(OrderCache::default())),
                ],
            }
        });
        for axis in Orientation::ALL {
            layer.reset(axis);
        }
        layer
    }

    /// Indexes in local order.
    pub fn index_order(&self, axis: Orientation) -> Vec<usize> {
        self.order[axis.slot()].read().clone()
    }

    fn cache(&self, axis: Orientation) -> Arc<OrderCache> {
        self.caches[axis.slot()].read().clone()
    }

    fn underlying_indexes(&self, axis: Orientation) -> Vec<usize> {
        (0..self.underlying.count(axis))
            .filter_map(|position| self.underlying.index_by_position(axis, position))
            .collect()
    }

    fn rebuild(&self, axis: Orientation) {
        let _span = PerfSpan::new(span_names::CACHE_REBUILD);
        let order = self.order[axis.slot()].read().clone();
        let underlying_count = self.underlying.count(axis);
        let positions: Vec<usize> = order
            .iter()
            .filter_map(|&index| self.underlying.position_by_index(axis, index))
            .collect();
        let mut locals = vec![None; underlying_count];
        for (local, &position) in positions.iter().enumerate() {
            if let Some(slot) = locals.get_mut(position) {
                *slot = Some(local);
            }
        }
        let starts = prefix_starts(
            positions
                .iter()
                .map(|&position| self.underlying.size_by_position(axis, position)),
        );
        *self.caches[axis.slot()].write() = Arc::new(OrderCache {
            positions,
            locals,
            starts,
        });
    }

    /// Drop indexes that vanished below and add new ones at their underlying
    /// position.
    fn reconcile(&self, axis: Orientation, event: &LayerEvent) {
        let current = self.underlying_indexes(axis);
        {
            let mut order = self.order[axis.slot()].write();
            if let Some(change) = event.structural_change() {
                if change.axis == axis && !change.index_diffs.is_empty() {
                    *order = order.iter().filter_map(|&i| change.remap_index(i)).collect();
                }
            }
            let present: HashSet<usize> = current.iter().copied().collect();
            order.retain(|index| present.contains(index));
            let known: HashSet<usize> = order.iter().copied().collect();
            for (position, &index) in current.iter().enumerate() {
                if !known.contains(&index) {
                    let at = position.min(order.len());
                    order.insert(at, index);
                }
            }
        }
        self.rebuild(axis);
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Move the entry at `from` next to the entry at `to`.
    pub fn reorder_position(&self, axis: Orientation, from: usize, to: usize, to_left_edge: bool) {
        self.reorder_multiple(axis, &[from], to, to_left_edge);
    }

    /// Move several entries, keeping their relative order, next to `to`.
    pub fn reorder_multiple(&self, axis: Orientation, from: &[usize], to: usize, to_left_edge: bool) {
        let count = self.count(axis);
        if to >= count {
            return;
        }
        let mut from: Vec<usize> = from.iter().copied().filter(|&p| p < count).collect();
        from.sort_unstable();
        from.dedup();
        if from.is_empty() {
            return;
        }
        let gap = if to_left_edge { to } else { to + 1 };
        {
            let mut order = self.order[axis.slot()].write();
            let moving: Vec<usize> = from.iter().filter_map(|&p| order.get(p).copied()).collect();
            let moving_set: HashSet<usize> = moving.iter().copied().collect();
            let anchor = order[gap.min(order.len())..]
                .iter()
                .copied()
                .find(|index| !moving_set.contains(index));
            order.retain(|index| !moving_set.contains(index));
            let at = anchor
                .and_then(|anchor| order.iter().position(|&index| index == anchor))
                .unwrap_or(order.len());
            order.splice(at..at, moving);
        }
        self.rebuild(axis);
        let low = from[0].min(to);
        let high = from[from.len() - 1].max(to);
        let affected: Vec<usize> = (low..=high).collect();
        tracing::debug!(target: targets::LAYER, axis = axis.noun(), ?from, to, to_left_edge, "reordered");
        self.fire_layer_event(LayerEvent::reorder(self.id(), axis, &affected));
    }

    /// Restore the underlying order.
    pub fn reset(&self, axis: Orientation) {
        *self.order[axis.slot()].write() = self.underlying_indexes(axis);
        self.rebuild(axis);
    }

    fn reset_and_notify(&self, axis: Orientation) {
        self.reset(axis);
        self.fire_layer_event(LayerEvent::axis_refresh(self.id(), axis, self.count(axis)));
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(command) = convert_command::<ReorderCommand>(command, self) {
            self.reorder_multiple(
                command.axis,
                &command.from_positions(),
                command.to.position,
                command.to_left_edge,
            );
            return true;
        }
        if let Some(command) = command.downcast_ref::<ResetOrderCommand>() {
            self.reset_and_notify(command.axis);
            return true;
        }
        false
    }
}

impl Layer for ReorderLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.cache(axis).positions.len()
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        let underlying_position = self.local_to_underlying(axis, position)?;
        self.underlying.index_by_position(axis, underlying_position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        let underlying_position = self.underlying.position_by_index(axis, index)?;
        self.cache(axis).locals.get(underlying_position).copied().flatten()
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        self.cache(axis).positions.get(position).copied()
    }

    fn underlying_to_local(
        &self,
        axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize> {
        if source != self.underlying.id() {
            return None;
        }
        self.cache(axis).locals.get(underlying_position).copied().flatten()
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.cache(axis).starts.last().copied().unwrap_or(0)
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        let cache = self.cache(axis);
        match (cache.starts.get(position), cache.starts.get(position + 1)) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        let cache = self.cache(axis);
        (position < cache.positions.len()).then(|| cache.starts[position])
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        position_in_starts(&self.cache(axis).starts, pixel)
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command)
            || self.handle_command(command)
            || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |event| {
            for axis in Orientation::ALL {
                if event.changes_positions(axis) {
                    self.reconcile(axis, event);
                } else if event.affects_axis(axis) {
                    self.rebuild(axis);
                }
            }
        });
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for axis in Orientation::ALL {
            properties.set_list(
                format!("{prefix}.{}", order_key(axis)),
                self.order[axis.slot()].read().iter(),
            );
        }
        self.underlying.save_state(prefix, properties);
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        self.underlying.load_state(prefix, properties);
        for axis in Orientation::ALL {
            if let Some(order) = properties.list::<usize>(&format!("{prefix}.{}", order_key(axis))) {
                *self.order[axis.slot()].write() = order;
            }
            self.reconcile(axis, &LayerEvent::structural_refresh(self.id()));
        }
        self.fire_layer_event(LayerEvent::structural_refresh(self.id()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Range;
    use crate::data::DummyDataProvider;
    use crate::data_layer::DataLayer;
    use Orientation::{Horizontal, Vertical};

    fn stack(columns: usize, rows: usize) -> (Arc<DataLayer>, Arc<ReorderLayer>) {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(columns, rows)));
        let reorder = ReorderLayer::new(data.clone());
        (data, reorder)
    }

    fn indexes(layer: &ReorderLayer, axis: Orientation) -> Vec<usize> {
        (0..layer.count(axis))
            .filter_map(|p| layer.index_by_position(axis, p))
            .collect()
    }

    #[test]
    fn test_initial_order_is_identity() {
        let (_, reorder) = stack(4, 2);
        assert_eq!(indexes(&reorder, Horizontal), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_move_left_and_right() {
        let (_, reorder) = stack(5, 1);
        reorder.reorder_position(Horizontal, 3, 1, true);
        assert_eq!(indexes(&reorder, Horizontal), vec![0, 3, 1, 2, 4]);
        reorder.reorder_position(Horizontal, 0, 4, false);
        assert_eq!(indexes(&reorder, Horizontal), vec![3, 1, 2, 4, 0]);
        assert_eq!(reorder.column_position_by_index(0), Some(4));
    }

    #[test]
    fn test_move_multiple_keeps_relative_order() {
        let (_, reorder) = stack(6, 1);
        reorder.reorder_multiple(Horizontal, &[4, 1], 0, true);
        assert_eq!(indexes(&reorder, Horizontal), vec![1, 4, 0, 2, 3, 5]);
    }

    #[test]
    fn test_geometry_follows_order() {
        let (data, reorder) = stack(3, 1);
        data.set_size(Horizontal, 2, 10, false);
        reorder.reorder_position(Horizontal, 2, 0, true);
        assert_eq!(reorder.column_width_by_position(0), 10);
        assert_eq!(reorder.start_x_of_column_position(1), Some(10));
        assert_eq!(reorder.column_position_by_x(5), Some(0));
        assert_eq!(reorder.width(), 210);
    }

    #[test]
    fn test_reorder_and_reset_commands() {
        let (_, reorder) = stack(1, 4);
        let top: Arc<dyn Layer> = reorder.clone();
        assert!(reorder.do_command(&ReorderCommand::new(Vertical, top, 0, 3).after_target()));
        assert_eq!(indexes(&reorder, Vertical), vec![1, 2, 3, 0]);
        assert!(reorder.do_command(&ResetOrderCommand::new(Vertical)));
        assert_eq!(indexes(&reorder, Vertical), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_insert_below_keeps_custom_order() {
        let (data, reorder) = stack(1, 3);
        reorder.reorder_position(Vertical, 2, 0, true);
        assert_eq!(indexes(&reorder, Vertical), vec![2, 0, 1]);
        // Index 1 deleted: 2 becomes 1.
        data.positions_deleted(Vertical, Range::single(1));
        assert_eq!(reorder.index_order(Vertical)[..2], [1, 0]);
    }

    #[test]
    fn test_save_and_load_order() {
        let (_, reorder) = stack(4, 1);
        reorder.reorder_position(Horizontal, 3, 0, true);
        let mut properties = Properties::new();
        reorder.save_state("r", &mut properties);

        let (_, restored) = stack(4, 1);
        restored.load_state("r", &properties);
        assert_eq!(indexes(&restored, Horizontal), vec![3, 0, 1, 2]);
    }
}
