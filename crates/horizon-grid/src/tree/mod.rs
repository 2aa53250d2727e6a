//! Tree-structured rows.
//!
//! [`TreeData`] describes the parent/child shape of the rows and
//! [`TreeRowModel`] tracks which nodes are collapsed. A [`TreeLayer`] hides
//! the rows below collapsed nodes, like a hide/show layer whose hidden set is
//! derived from the tree, and labels the cells of its tree column so a
//! renderer can draw the expand/collapse handles.

mod command;
mod data;
mod model;

pub use command::{
    TreeCollapseAllCommand, TreeExpandAllCommand, TreeExpandCollapseCommand,
    TreeExpandToLevelCommand,
};
pub use data::{ParentTreeData, TreeData};
pub use model::TreeRowModel;

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;

use crate::command::{LayerCommand, convert_command};
use crate::config::{LabelStack, labels};
use crate::coordinate::Orientation;
use crate::event::LayerEvent;
use crate::hide_show::{
    HidePositionsCommand, ShowAllCommand, ShowIndexesCommand, VisibleCache, hidden_key,
    remap_index_set,
};
use crate::layer::{Layer, LayerBase, LayerId, relay_event, underlying_cell};
use crate::persistence::Properties;

use Orientation::{Horizontal, Vertical};

/// Shows the rows of its underlying layer that no collapsed node hides.
///
/// Tree nodes are underlying row indexes. Columns pass through unchanged.
pub struct TreeLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    model: Arc<TreeRowModel>,
    /// Rows hidden explicitly, on top of collapsed subtrees.
    hidden: RwLock<BTreeSet<usize>>,
    rows: RwLock<Arc<VisibleCache>>,
    tree_column: RwLock<usize>,
}

impl TreeLayer {
    pub fn new(underlying: Arc<dyn Layer>, model: Arc<TreeRowModel>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("TreeLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            let rows = VisibleCache::build(&*underlying, Vertical, |index| model.is_hidden(index));
            Self {
                base,
                underlying,
                model,
                hidden: RwLock::new(BTreeSet::new()),
                rows: RwLock::new(Arc::new(rows)),
                tree_column: RwLock::new(0),
            }
        })
    }

    pub fn model(&self) -> &Arc<TreeRowModel> {
        &self.model
    }

    /// Column index whose cells carry the tree labels.
    pub fn tree_column(&self) -> usize {
        *self.tree_column.read()
    }

    pub fn set_tree_column(&self, column_index: usize) {
        *self.tree_column.write() = column_index;
        self.fire_layer_event(LayerEvent::visual_refresh(self.id()));
    }

    fn cache(&self) -> Arc<VisibleCache> {
        self.rows.read().clone()
    }

    fn rebuild(&self) {
        let hidden = self.hidden.read().clone();
        let cache = VisibleCache::build(&*self.underlying, Vertical, |index| {
            hidden.contains(&index) || self.model.is_hidden(index)
        });
        *self.rows.write() = Arc::new(cache);
    }

    /// Apply `change`, then fire a hide event with the rows that disappeared
    /// (at their old positions) and a show event with the rows that appeared.
    fn transition(&self, change: impl FnOnce()) {
        let before = self.cache();
        change();
        self.rebuild();
        let after = self.cache();

        let underlying_rows = |cache: &VisibleCache| -> BTreeSet<usize> {
            (0..cache.count())
                .filter_map(|position| cache.local_to_underlying(position))
                .collect()
        };
        let (was, is) = (underlying_rows(&before), underlying_rows(&after));
        let removed: Vec<usize> = was
            .difference(&is)
            .filter_map(|&row| before.underlying_to_local(row))
            .collect();
        let added: Vec<usize> = is
            .difference(&was)
            .filter_map(|&row| after.underlying_to_local(row))
            .collect();

        if !removed.is_empty() {
            self.fire_layer_event(LayerEvent::hide(self.id(), Vertical, &removed));
        }
        if !added.is_empty() {
            self.fire_layer_event(LayerEvent::show(self.id(), Vertical, &added));
        }
        if removed.is_empty() && added.is_empty() {
            // Only the handle state changed.
            self.fire_layer_event(LayerEvent::visual_refresh(self.id()));
        }
    }

    // =========================================================================
    // Expand / collapse
    // =========================================================================

    /// Collapse the node shown at row `position`.
    pub fn collapse_row(&self, position: usize) {
        let Some(index) = self.index_by_position(Vertical, position) else {
            return;
        };
        if self.model.is_leaf(index) || self.model.is_collapsed(index) {
            return;
        }
        self.transition(|| {
            self.model.collapse(index);
        });
    }

    /// Expand the node shown at row `position`.
    pub fn expand_row(&self, position: usize) {
        let Some(index) = self.index_by_position(Vertical, position) else {
            return;
        };
        if !self.model.is_collapsed(index) {
            return;
        }
        self.transition(|| {
            self.model.expand(index);
        });
    }

    pub fn toggle_row(&self, position: usize) {
        let Some(index) = self.index_by_position(Vertical, position) else {
            return;
        };
        if self.model.is_collapsed(index) {
            self.expand_row(position);
        } else {
            self.collapse_row(position);
        }
    }

    /// Expand to `level` below the node at row `position`, or across every
    /// root when `position` is `None`.
    pub fn expand_to_level(&self, position: Option<usize>, level: usize) {
        let roots: Vec<usize> = match position {
            Some(position) => self.index_by_position(Vertical, position).into_iter().collect(),
            None => {
                let data = self.model.tree_data();
                (0..data.element_count())
                    .filter(|&index| data.parent(index).is_none())
                    .collect()
            }
        };
        tracing::debug!(target: targets::TREE, ?position, level, "expand to level");
        self.transition(|| {
            for root in roots {
                self.model.expand_to_level(root, level);
            }
        });
    }

    pub fn expand_all(&self) {
        self.transition(|| {
            self.model.expand_all();
        });
    }

    pub fn collapse_all(&self) {
        self.transition(|| {
            self.model.collapse_all();
        });
    }

    // =========================================================================
    // Hide / show
    // =========================================================================

    /// Hide rows. Hiding an expanded parent also hides its visible
    /// descendants.
    pub fn hide_rows(&self, positions: &[usize]) {
        let mut indexes = BTreeSet::new();
        for &position in positions {
            let Some(index) = self.index_by_position(Vertical, position) else {
                continue;
            };
            indexes.insert(index);
            if !self.model.is_leaf(index) {
                indexes.extend(self.model.visible_descendants(index));
            }
        }
        if indexes.is_empty() {
            return;
        }
        self.transition(|| self.hidden.write().extend(indexes));
    }

    pub fn show_row_indexes(&self, indexes: &[usize]) {
        let changed = {
            let hidden = self.hidden.read();
            indexes.iter().any(|index| hidden.contains(index))
        };
        if changed {
            self.transition(|| {
                let mut hidden = self.hidden.write();
                for index in indexes {
                    hidden.remove(index);
                }
            });
        }
    }

    pub fn show_all_rows(&self) {
        if !self.hidden.read().is_empty() {
            self.transition(|| self.hidden.write().clear());
        }
    }

    /// Explicitly hidden row indexes in ascending order.
    pub fn hidden_row_indexes(&self) -> Vec<usize> {
        self.hidden.read().iter().copied().collect()
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(command) = convert_command::<TreeExpandCollapseCommand>(command, self) {
            self.toggle_row(command.row.position);
            return true;
        }
        if let Some(command) = convert_command::<TreeExpandToLevelCommand>(command, self) {
            self.expand_to_level(command.row.map(|row| row.position), command.level);
            return true;
        }
        if command.is::<TreeExpandAllCommand>() {
            self.expand_all();
            return true;
        }
        if command.is::<TreeCollapseAllCommand>() {
            self.collapse_all();
            return true;
        }
        if let Some(command) = convert_command::<HidePositionsCommand>(command, self) {
            if command.axis == Vertical {
                self.hide_rows(&command.positions());
                return true;
            }
        }
        if let Some(command) = command.downcast_ref::<ShowIndexesCommand>() {
            if command.axis == Vertical {
                self.show_row_indexes(&command.indexes);
                return true;
            }
        }
        if let Some(command) = command.downcast_ref::<ShowAllCommand>() {
            if command.axis == Vertical {
                self.show_all_rows();
                return true;
            }
        }
        false
    }

    fn add_tree_labels(&self, labels: &mut LabelStack, row_index: usize) {
        let state = if self.model.is_leaf(row_index) {
            labels::TREE_LEAF
        } else if self.model.is_collapsed(row_index) {
            labels::TREE_COLLAPSED
        } else {
            labels::TREE_EXPANDED
        };
        labels.add_label_on_top(state);
        labels.add_label_on_top(format!(
            "{}{}",
            labels::TREE_DEPTH_PREFIX,
            self.model.depth(row_index)
        ));
        labels.add_label_on_top(labels::TREE_COLUMN);
    }
}

impl Layer for TreeLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        match axis {
            Horizontal => self.underlying.count(axis),
            Vertical => self.cache().count(),
        }
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
        match axis {
            Horizontal => (position < self.underlying.count(axis)).then_some(position),
            Vertical => self.cache().local_to_underlying(position),
        }
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
        match axis {
            Horizontal => Some(underlying_position),
            Vertical => self.cache().underlying_to_local(underlying_position),
        }
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        match axis {
            Horizontal => self.underlying.extent(axis),
            Vertical => self.cache().extent(),
        }
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        match axis {
            Horizontal => self.underlying.size_by_position(axis, position),
            Vertical => self.cache().size(position),
        }
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        match axis {
            Horizontal => self.underlying.start_pixel_by_position(axis, position),
            Vertical => self.cache().start_pixel(position),
        }
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        match axis {
            Horizontal => self.underlying.position_by_pixel(axis, pixel),
            Vertical => self.cache().position_by_pixel(pixel),
        }
    }

    fn config_labels_by_position(&self, column: usize, row: usize) -> LabelStack {
        let mut labels = match underlying_cell(self, column, row) {
            Some((layer, c, r)) => layer.config_labels_by_position(c, r),
            None => LabelStack::new(),
        };
        let column_index = self.index_by_position(Horizontal, column);
        let row_index = self.index_by_position(Vertical, row);
        if let Some(row_index) = row_index {
            if column_index == Some(self.tree_column()) {
                self.add_tree_labels(&mut labels, row_index);
            }
        }
        self.base
            .accumulate_labels(&mut labels, column, row, column_index, row_index);
        labels
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command)
            || self.handle_command(command)
            || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |event| {
            if event.affects_axis(Vertical) {
                self.model.remap(event);
                remap_index_set(event, Vertical, &mut self.hidden.write());
                self.rebuild();
            }
        });
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        properties.set_list(
            format!("{prefix}.tree.collapsedNodes"),
            self.model.collapsed_indexes(),
        );
        properties.set_list(
            format!("{prefix}.tree.{}", hidden_key(Vertical)),
            self.hidden.read().iter(),
        );
        self.underlying.save_state(prefix, properties);
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        self.underlying.load_state(prefix, properties);
        if let Some(collapsed) = properties.list::<usize>(&format!("{prefix}.tree.collapsedNodes")) {
            self.model.set_collapsed_indexes(collapsed);
        }
        if let Some(hidden) =
            properties.list::<usize>(&format!("{prefix}.tree.{}", hidden_key(Vertical)))
        {
            *self.hidden.write() = hidden.into_iter().collect();
        }
        self.rebuild();
        self.fire_layer_event(LayerEvent::structural_refresh(self.id()));
    }
}

static_assertions::assert_impl_all!(TreeLayer: Send, Sync);
