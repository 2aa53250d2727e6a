//! The frozen top-left block of a grid body.
//!
//! A [`FreezeLayer`] exposes positions `[0, n)` of its underlying layer on
//! each axis. It is paired with a viewport over the same underlying layer
//! whose minimum origin starts right after the frozen block; see
//! [`CompositeFreezeLayer`](crate::composite::CompositeFreezeLayer).

mod command;

pub use command::{FreezeCommand, UnfreezeCommand};

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;

use crate::command::LayerCommand;
use crate::coordinate::{Orientation, Range};
use crate::event::{DiffKind, LayerEvent};
use crate::layer::{Layer, LayerBase, LayerId, relay_event};
use crate::persistence::Properties;

fn frozen_key(axis: Orientation) -> &'static str {
    match axis {
        Orientation::Horizontal => "frozenColumns",
        Orientation::Vertical => "frozenRows",
    }
}

/// Shows the first `n` columns and rows of its underlying layer.
pub struct FreezeLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    frozen: [RwLock<usize>; 2],
}

impl FreezeLayer {
    pub fn new(underlying: Arc<dyn Layer>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("FreezeLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            Self {
                base,
                underlying,
                frozen: [RwLock::new(0), RwLock::new(0)],
            }
        })
    }

    /// Number of frozen positions along `axis`.
    pub fn frozen_count(&self, axis: Orientation) -> usize {
        *self.frozen[axis.slot()].read()
    }

    pub fn is_frozen(&self) -> bool {
        Orientation::ALL.iter().any(|&axis| self.count(axis) > 0)
    }

    /// Freeze the first `count` underlying positions along `axis`.
    pub fn set_frozen(&self, axis: Orientation, count: usize) {
        let count = count.min(self.underlying.count(axis));
        let previous = std::mem::replace(&mut *self.frozen[axis.slot()].write(), count);
        if previous == count {
            return;
        }
        tracing::debug!(target: targets::LAYER, axis = axis.noun(), count, "frozen");
        self.fire_layer_event(LayerEvent::axis_refresh(self.id(), axis, count));
    }

    /// The pixel right after the frozen block in the underlying layer.
    pub fn frozen_extent(&self, axis: Orientation) -> i32 {
        self.extent(axis)
    }

    /// Keep the frozen count attached to the same entries when positions
    /// in front of the boundary appear or disappear.
    fn follow_structure(&self, event: &LayerEvent, axis: Orientation) {
        let Some(diffs) = event
            .structural_change()
            .filter(|change| change.axis == axis)
            .and_then(|change| change.diffs.as_ref())
        else {
            return;
        };
        // Every diff is measured against the boundary as it was before the
        // event. Added spans are in the positions after it, so each is moved
        // back past the spans added in front of it.
        let mut frozen = self.frozen[axis.slot()].write();
        let boundary = Range::new(0, *frozen);
        let (mut lost, mut gained, mut added) = (0, 0, 0);
        for diff in diffs {
            match diff.kind {
                DiffKind::Delete => {
                    lost += diff.before.intersection(&boundary).map_or(0, |r| r.len());
                }
                DiffKind::Add => {
                    if diff.after.start.saturating_sub(added) < boundary.end {
                        gained += diff.after.len();
                    }
                    added += diff.after.len();
                }
                DiffKind::Change => {}
            }
        }
        *frozen = (boundary.end + gained).saturating_sub(lost);
    }
}

impl Layer for FreezeLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.frozen_count(axis).min(self.underlying.count(axis))
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        let underlying_position = self.local_to_underlying(axis, position)?;
        self.underlying.index_by_position(axis, underlying_position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        let underlying_position = self.underlying.position_by_index(axis, index)?;
        self.underlying_to_local(axis, self.underlying.id(), underlying_position)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
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
        (underlying_position < self.count(axis)).then_some(underlying_position)
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        let count = self.count(axis);
        if count == 0 {
            return 0;
        }
        self.underlying
            .start_pixel_by_position(axis, count)
            .unwrap_or_else(|| self.underlying.extent(axis))
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        if position < self.count(axis) {
            self.underlying.size_by_position(axis, position)
        } else {
            0
        }
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        self.local_to_underlying(axis, position)?;
        self.underlying.start_pixel_by_position(axis, position)
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        if pixel < 0 || pixel >= self.extent(axis) {
            return None;
        }
        self.underlying.position_by_pixel(axis, pixel)
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command) || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |event| {
            for axis in Orientation::ALL {
                self.follow_structure(event, axis);
            }
        });
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for axis in Orientation::ALL {
            properties.set(format!("{prefix}.{}", frozen_key(axis)), self.frozen_count(axis));
        }
        self.underlying.save_state(prefix, properties);
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        self.underlying.load_state(prefix, properties);
        for axis in Orientation::ALL {
            if let Some(count) = properties.parsed::<usize>(&format!("{prefix}.{}", frozen_key(axis))) {
                self.set_frozen(axis, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DummyDataProvider;
    use crate::data_layer::DataLayer;
    use crate::hide_show::HideShowLayer;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use Orientation::{Horizontal, Vertical};

    fn stack() -> (Arc<HideShowLayer>, Arc<FreezeLayer>) {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(6, 6)));
        let hide = HideShowLayer::new(data);
        let freeze = FreezeLayer::new(hide.clone());
        (hide, freeze)
    }

    #[test]
    fn test_nothing_frozen_by_default() {
        let (_, freeze) = stack();
        assert_eq!(freeze.column_count(), 0);
        assert_eq!(freeze.width(), 0);
        assert!(!freeze.is_frozen());
    }

    #[test]
    fn test_frozen_block() {
        let (_, freeze) = stack();
        freeze.set_frozen(Horizontal, 2);
        freeze.set_frozen(Vertical, 1);
        assert_eq!(freeze.column_count(), 2);
        assert_eq!(freeze.width(), 200);
        assert_eq!(freeze.height(), 20);
        assert_eq!(freeze.column_position_by_x(150), Some(1));
        assert_eq!(freeze.column_position_by_x(200), None);
        assert_eq!(freeze.column_position_by_index(4), None);
        assert_eq!(freeze.data_value_by_position(1, 0).to_string(), "1,0");
    }

    #[test]
    fn test_hiding_inside_frozen_area_shrinks_it() {
        let (hide, freeze) = stack();
        freeze.set_frozen(Horizontal, 3);
        hide.hide_positions(Horizontal, &[1]);
        assert_eq!(freeze.frozen_count(Horizontal), 2);
        assert_eq!(freeze.column_index_by_position(1), Some(2));

        hide.hide_positions(Horizontal, &[4]);
        assert_eq!(freeze.frozen_count(Horizontal), 2);

        hide.show_indexes(Horizontal, &[1]);
        assert_eq!(freeze.frozen_count(Horizontal), 3);
    }

    #[test]
    fn test_hiding_separate_frozen_positions_in_one_event() {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(8, 4)));
        let hide = HideShowLayer::new(data);
        let freeze = FreezeLayer::new(hide.clone());
        freeze.set_frozen(Horizontal, 4);

        hide.hide_positions(Horizontal, &[1, 3]);
        assert_eq!(freeze.frozen_count(Horizontal), 2);
        let frozen: Vec<usize> = (0..freeze.column_count())
            .filter_map(|position| freeze.column_index_by_position(position))
            .collect();
        assert_eq!(frozen, vec![0, 2]);

        // Index 3 comes back right at the boundary, outside the block.
        hide.show_indexes(Horizontal, &[1, 3]);
        assert_eq!(freeze.frozen_count(Horizontal), 3);
    }

    proptest! {
        #[test]
        fn frozen_block_keeps_the_visible_frozen_indexes(
            frozen in 0usize..12,
            hidden in prop::collection::btree_set(0usize..12, 0..8),
        ) {
            let data = DataLayer::new(Arc::new(DummyDataProvider::new(12, 2)));
            let hide = HideShowLayer::new(data);
            let freeze = FreezeLayer::new(hide.clone());
            freeze.set_frozen(Horizontal, frozen);

            let positions: Vec<usize> = hidden.iter().copied().collect();
            hide.hide_positions(Horizontal, &positions);

            let expected: Vec<usize> = (0..frozen).filter(|i| !hidden.contains(i)).collect();
            prop_assert_eq!(freeze.frozen_count(Horizontal), expected.len());
            let indexes: Vec<usize> = (0..freeze.column_count())
                .filter_map(|position| freeze.column_index_by_position(position))
                .collect();
            prop_assert_eq!(&indexes, &expected);
            let visible: BTreeSet<usize> = (0..hide.column_count())
                .filter_map(|position| hide.column_index_by_position(position))
                .collect();
            prop_assert!(visible.iter().take(freeze.column_count()).eq(indexes.iter()));
        }
    }

    #[test]
    fn test_save_and_load_state() {
        let (_, freeze) = stack();
        freeze.set_frozen(Vertical, 4);
        let mut properties = Properties::new();
        freeze.save_state("f", &mut properties);
        assert_eq!(properties.get("f.frozenRows"), Some("4"));

        let (_, restored) = stack();
        restored.load_state("f", &properties);
        assert_eq!(restored.row_count(), 4);
        assert_eq!(restored.column_count(), 0);
    }
}
