//! Hiding and showing columns and rows.
//!
//! A [`HideShowLayer`] keeps the set of hidden underlying *indexes* per axis.
//! Positions are derived: the visible underlying positions are cached in
//! ascending order, so local-to-underlying is a lookup and the inverse a
//! binary search.

mod cache;
mod command;

pub(crate) use cache::VisibleCache;
pub use command::{HidePositionsCommand, ShowAllCommand, ShowIndexesCommand};

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;

use crate::command::{LayerCommand, convert_command};
use crate::coordinate::Orientation;
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, relay_event};
use crate::persistence::Properties;

pub(crate) fn hidden_key(axis: Orientation) -> &'static str {
    match axis {
        Orientation::Horizontal => "hiddenColumnIndexes",
        Orientation::Vertical => "hiddenRowIndexes",
    }
}

/// Apply data inserts and deletes carried by `event` to a set of indexes.
pub(crate) fn remap_index_set(event: &LayerEvent, axis: Orientation, set: &mut BTreeSet<usize>) {
    if let Some(change) = event.structural_change() {
        if change.axis == axis && !change.index_diffs.is_empty() {
            *set = set.iter().filter_map(|&index| change.remap_index(index)).collect();
        }
    }
}

/// Removes hidden columns and rows from its underlying layer.
pub struct HideShowLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    hidden: [RwLock<BTreeSet<usize>>; 2],
    caches: [RwLock<Arc<VisibleCache>>; 2],
}

impl HideShowLayer {
    pub fn new(underlying: Arc<dyn Layer>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("HideShowLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            let caches = Orientation::ALL.map(|axis| {
                RwLock::new(Arc::new(VisibleCache::build(&*underlying, axis, |_| false)))
            });
            Self {
                base,
                underlying,
                hidden: [RwLock::new(BTreeSet::new()), RwLock::new(BTreeSet::new())],
                caches,
            }
        })
    }

    fn cache(&self, axis: Orientation) -> Arc<VisibleCache> {
        self.caches[axis.slot()].read().clone()
    }

    fn rebuild(&self, axis: Orientation) {
        let hidden = self.hidden[axis.slot()].read().clone();
        let cache = VisibleCache::build(&*self.underlying, axis, |index| hidden.contains(&index));
        *self.caches[axis.slot()].write() = Arc::new(cache);
    }

    // =========================================================================
    // Hide / show
    // =========================================================================

    /// Hide local positions. Out-of-range positions are ignored.
    pub fn hide_positions(&self, axis: Orientation, positions: &[usize]) {
        let count = self.count(axis);
        let mut positions: Vec<usize> = positions.iter().copied().filter(|&p| p < count).collect();
        positions.sort_unstable();
        positions.dedup();
        if positions.is_empty() {
            return;
        }
        let indexes: Vec<usize> = positions
            .iter()
            .filter_map(|&position| self.index_by_position(axis, position))
            .collect();
        let event = LayerEvent::hide(self.id(), axis, &positions);
        self.hidden[axis.slot()].write().extend(indexes.iter().copied());
        self.rebuild(axis);
        tracing::debug!(target: targets::LAYER, axis = axis.noun(), ?indexes, "hidden");
        self.fire_layer_event(event);
    }

    /// Hide entries by index, whether currently visible or not.
    pub fn hide_indexes(&self, axis: Orientation, indexes: &[usize]) {
        let positions: Vec<usize> = indexes
            .iter()
            .filter_map(|&index| self.position_by_index(axis, index))
            .collect();
        self.hidden[axis.slot()].write().extend(indexes.iter().copied());
        if positions.is_empty() {
            return;
        }
        let event = LayerEvent::hide(self.id(), axis, &positions);
        self.rebuild(axis);
        self.fire_layer_event(event);
    }

    pub fn show_indexes(&self, axis: Orientation, indexes: &[usize]) {
        let shown: Vec<usize> = {
            let mut hidden = self.hidden[axis.slot()].write();
            indexes.iter().copied().filter(|index| hidden.remove(index)).collect()
        };
        if shown.is_empty() {
            return;
        }
        self.rebuild(axis);
        let positions: Vec<usize> = shown
            .iter()
            .filter_map(|&index| self.position_by_index(axis, index))
            .collect();
        tracing::debug!(target: targets::LAYER, axis = axis.noun(), indexes = ?shown, "shown");
        if !positions.is_empty() {
            self.fire_layer_event(LayerEvent::show(self.id(), axis, &positions));
        }
    }

    pub fn show_all(&self, axis: Orientation) {
        let hidden = self.hidden_indexes(axis);
        self.show_indexes(axis, &hidden);
    }

    /// Hidden indexes in ascending order.
    pub fn hidden_indexes(&self, axis: Orientation) -> Vec<usize> {
        self.hidden[axis.slot()].read().iter().copied().collect()
    }

    pub fn is_index_hidden(&self, axis: Orientation, index: usize) -> bool {
        self.hidden[axis.slot()].read().contains(&index)
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(command) = convert_command::<HidePositionsCommand>(command, self) {
            self.hide_positions(command.axis, &command.positions());
            return true;
        }
        if let Some(command) = command.downcast_ref::<ShowIndexesCommand>() {
            self.show_indexes(command.axis, &command.indexes);
            return true;
        }
        if let Some(command) = command.downcast_ref::<ShowAllCommand>() {
            self.show_all(command.axis);
            return true;
        }
        false
    }
}

impl Layer for HideShowLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.cache(axis).count()
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        let underlying_position = self.cache(axis).local_to_underlying(position)?;
        self.underlying.index_by_position(axis, underlying_position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        let underlying_position = self.underlying.position_by_index(axis, index)?;
        self.cache(axis).underlying_to_local(underlying_position)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        self.cache(axis).local_to_underlying(position)
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
        self.cache(axis).underlying_to_local(underlying_position)
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.cache(axis).extent()
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        self.cache(axis).size(position)
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        self.cache(axis).start_pixel(position)
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        self.cache(axis).position_by_pixel(pixel)
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command)
            || self.handle_command(command)
            || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |event| {
            for axis in Orientation::ALL {
                if event.affects_axis(axis) {
                    remap_index_set(event, axis, &mut self.hidden[axis.slot()].write());
                    self.rebuild(axis);
                }
            }
        });
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for axis in Orientation::ALL {
            properties.set_list(
                format!("{prefix}.{}", hidden_key(axis)),
                self.hidden[axis.slot()].read().iter(),
            );
        }
        self.underlying.save_state(prefix, properties);
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        self.underlying.load_state(prefix, properties);
        for axis in Orientation::ALL {
            if let Some(hidden) = properties.list::<usize>(&format!("{prefix}.{}", hidden_key(axis))) {
                *self.hidden[axis.slot()].write() = hidden.into_iter().collect();
            }
            self.rebuild(axis);
        }
        self.fire_layer_event(LayerEvent::structural_refresh(self.id()));
    }
}

static_assertions::assert_impl_all!(HideShowLayer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Range;
    use crate::data::DummyDataProvider;
    use crate::data_layer::DataLayer;
    use crate::event::StructuralKind;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use Orientation::{Horizontal, Vertical};

    fn stack(columns: usize, rows: usize) -> (Arc<DataLayer>, Arc<HideShowLayer>) {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(columns, rows)));
        let hide = HideShowLayer::new(data.clone());
        (data, hide)
    }

    #[test]
    fn test_hide_positions_remaps() {
        let (_, hide) = stack(5, 2);
        hide.hide_positions(Horizontal, &[1, 3]);
        assert_eq!(hide.column_count(), 3);
        assert_eq!(hide.column_index_by_position(0), Some(0));
        assert_eq!(hide.column_index_by_position(1), Some(2));
        assert_eq!(hide.column_index_by_position(2), Some(4));
        assert_eq!(hide.column_position_by_index(3), None);
        assert_eq!(hide.column_position_by_index(4), Some(2));
        assert_eq!(hide.width(), 300);
        assert_eq!(hide.start_x_of_column_position(2), Some(200));
        assert_eq!(hide.data_value_by_position(1, 0).to_string(), "2,0");
    }

    #[test]
    fn test_hide_command_and_show_all() {
        let (_, hide) = stack(5, 5);
        let top: Arc<dyn Layer> = hide.clone();
        assert!(hide.do_command(&HidePositionsCommand::new(Vertical, top.clone(), &[0, 1])));
        assert_eq!(hide.row_count(), 3);
        assert_eq!(hide.hidden_indexes(Vertical), vec![0, 1]);

        assert!(hide.do_command(&HidePositionsCommand::new(Vertical, top, &[0])));
        assert_eq!(hide.hidden_indexes(Vertical), vec![0, 1, 2]);

        assert!(hide.do_command(&ShowAllCommand::new(Vertical)));
        assert_eq!(hide.row_count(), 5);
        assert!(hide.hidden_indexes(Vertical).is_empty());
    }

    #[test]
    fn test_hide_event_uses_positions_before_hiding() {
        let (_, hide) = stack(6, 1);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        hide.base()
            .add_layer_listener(move |event| sink.lock().push(event.clone()));

        hide.hide_positions(Horizontal, &[2]);
        hide.hide_positions(Horizontal, &[2, 3]);
        let events = events.lock();
        let change = events[1].structural_change().unwrap();
        assert_eq!(change.kind, StructuralKind::Hide);
        assert_eq!(change.ranges, vec![Range::new(2, 4)]);
        assert_eq!(hide.hidden_indexes(Horizontal), vec![2, 3, 4]);
    }

    #[test]
    fn test_resize_below_updates_geometry() {
        let (data, hide) = stack(4, 1);
        hide.hide_positions(Horizontal, &[0]);
        data.set_size(Horizontal, 2, 30, false);
        assert_eq!(hide.column_width_by_position(1), 30);
        assert_eq!(hide.width(), 230);
    }

    #[test]
    fn test_data_delete_remaps_hidden_indexes() {
        let (data, hide) = stack(1, 6);
        hide.hide_indexes(Vertical, &[1, 4]);
        data.positions_deleted(Vertical, Range::new(0, 2));
        // Provider still reports 6 rows; only the index bookkeeping is checked.
        assert_eq!(hide.hidden_indexes(Vertical), vec![2]);
    }

    #[test]
    fn test_save_and_load_state() {
        let (_, hide) = stack(4, 4);
        hide.hide_indexes(Horizontal, &[1]);
        hide.hide_indexes(Vertical, &[0, 3]);
        let mut properties = Properties::new();
        hide.save_state("t", &mut properties);

        let (_, restored) = stack(4, 4);
        restored.load_state("t", &properties);
        assert_eq!(restored.hidden_indexes(Horizontal), vec![1]);
        assert_eq!(restored.row_count(), 2);
    }

    proptest! {
        #[test]
        fn hidden_and_visible_partition_indexes(
            ops in prop::collection::vec((any::<bool>(), 0usize..12), 0..40)
        ) {
            let (_, hide) = stack(12, 1);
            for (hide_op, value) in ops {
                if hide_op {
                    hide.hide_positions(Horizontal, &[value]);
                } else {
                    hide.show_indexes(Horizontal, &[value]);
                }
            }
            let hidden: BTreeSet<usize> = hide.hidden_indexes(Horizontal).into_iter().collect();
            let visible: Vec<usize> = (0..hide.column_count())
                .filter_map(|p| hide.column_index_by_position(p))
                .collect();
            let visible_set: BTreeSet<usize> = visible.iter().copied().collect();
            prop_assert_eq!(visible.len(), visible_set.len());
            prop_assert!(hidden.is_disjoint(&visible_set));
            let all: BTreeSet<usize> = hidden.union(&visible_set).copied().collect();
            prop_assert_eq!(all, (0..12).collect::<BTreeSet<usize>>());
        }
    }
}
