use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use horizon_grid_core::Signal;
use horizon_grid_core::logging::targets;

use super::TreeData;
use crate::event::LayerEvent;
use crate::hide_show::remap_index_set;
use crate::coordinate::Orientation;

/// Expand/collapse state of a tree, as a set of collapsed node indexes.
///
/// A node is hidden when any ancestor is collapsed. A collapsed node keeps its
/// state while hidden, so expanding an ancestor brings back the subtree as it
/// was.
pub struct TreeRowModel {
    data: Arc<dyn TreeData>,
    collapsed: RwLock<BTreeSet<usize>>,
    state_changed: Signal<Vec<usize>>,
}

impl TreeRowModel {
    pub fn new(data: Arc<dyn TreeData>) -> Self {
        Self {
            data,
            collapsed: RwLock::new(BTreeSet::new()),
            state_changed: Signal::new(),
        }
    }

    pub fn tree_data(&self) -> &Arc<dyn TreeData> {
        &self.data
    }

    /// Emitted after every change with the indexes that were hidden or shown.
    pub fn state_changed(&self) -> &Signal<Vec<usize>> {
        &self.state_changed
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn depth(&self, index: usize) -> usize {
        self.data.depth(index)
    }

    pub fn is_leaf(&self, index: usize) -> bool {
        !self.data.has_children(index)
    }

    pub fn is_collapsed(&self, index: usize) -> bool {
        self.collapsed.read().contains(&index)
    }

    /// Whether some ancestor of `index` is collapsed.
    pub fn is_hidden(&self, index: usize) -> bool {
        let collapsed = self.collapsed.read();
        let mut current = index;
        while let Some(parent) = self.data.parent(current) {
            if collapsed.contains(&parent) {
                return true;
            }
            current = parent;
        }
        false
    }

    pub fn collapsed_indexes(&self) -> Vec<usize> {
        self.collapsed.read().iter().copied().collect()
    }

    /// Descendants of `index` shown when `index` itself is shown.
    pub fn visible_descendants(&self, index: usize) -> Vec<usize> {
        let collapsed = self.collapsed.read();
        if collapsed.contains(&index) {
            return Vec::new();
        }
        let mut visible = Vec::new();
        let mut stack: Vec<usize> = self.data.children(index).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            visible.push(node);
            if !collapsed.contains(&node) {
                stack.extend(self.data.children(node).into_iter().rev());
            }
        }
        visible
    }

    fn visible_nodes(&self) -> BTreeSet<usize> {
        (0..self.data.element_count())
            .filter(|&index| !self.is_hidden(index))
            .collect()
    }

    fn notify(&self, changed: &[usize]) {
        if !changed.is_empty() {
            self.state_changed.emit(changed.to_vec());
        }
    }

    // =========================================================================
    // Expand / collapse
    // =========================================================================

    /// Collapse `index`. Returns all its descendants.
    pub fn collapse(&self, index: usize) -> Vec<usize> {
        if self.is_leaf(index) || !self.collapsed.write().insert(index) {
            return Vec::new();
        }
        let descendants = self.data.descendants(index);
        tracing::debug!(target: targets::TREE, index, hidden = descendants.len(), "collapsed");
        self.notify(&descendants);
        descendants
    }

    /// Expand `index`. Returns the descendants that became visible; collapsed
    /// descendants keep their own children hidden.
    pub fn expand(&self, index: usize) -> Vec<usize> {
        if !self.collapsed.write().remove(&index) {
            return Vec::new();
        }
        let shown = if self.is_hidden(index) {
            Vec::new()
        } else {
            self.visible_descendants(index)
        };
        tracing::debug!(target: targets::TREE, index, shown = shown.len(), "expanded");
        self.notify(&shown);
        shown
    }

    /// Expand `index` and the nodes below it with a depth under `level`.
    /// Returns the nodes that became visible.
    pub fn expand_to_level(&self, index: usize, level: usize) -> Vec<usize> {
        let hidden = self.is_hidden(index);
        let before: BTreeSet<usize> = self.visible_descendants(index).into_iter().collect();
        {
            let mut collapsed = self.collapsed.write();
            for node in std::iter::once(index).chain(self.data.descendants(index)) {
                if self.data.depth(node) < level {
                    collapsed.remove(&node);
                }
            }
        }
        if hidden {
            return Vec::new();
        }
        let shown: Vec<usize> = self
            .visible_descendants(index)
            .into_iter()
            .filter(|node| !before.contains(node))
            .collect();
        self.notify(&shown);
        shown
    }

    /// Collapse every node with children. Returns the nodes that became
    /// hidden, in ascending order.
    pub fn collapse_all(&self) -> Vec<usize> {
        let before = self.visible_nodes();
        {
            let mut collapsed = self.collapsed.write();
            collapsed.extend(
                (0..self.data.element_count()).filter(|&index| self.data.has_children(index)),
            );
        }
        let after = self.visible_nodes();
        let hidden: Vec<usize> = before.difference(&after).copied().collect();
        self.notify(&hidden);
        hidden
    }

    /// Expand every node. Returns the nodes that became visible.
    pub fn expand_all(&self) -> Vec<usize> {
        let before = self.visible_nodes();
        self.collapsed.write().clear();
        let shown: Vec<usize> = (0..self.data.element_count())
            .filter(|index| !before.contains(index))
            .collect();
        self.notify(&shown);
        shown
    }

    /// Replace the collapsed set, for restoring persisted state.
    pub fn set_collapsed_indexes(&self, indexes: impl IntoIterator<Item = usize>) {
        let count = self.data.element_count();
        *self.collapsed.write() = indexes
            .into_iter()
            .filter(|&index| index < count && self.data.has_children(index))
            .collect();
    }

    /// Follow data inserts and deletes carried by a row event.
    pub(crate) fn remap(&self, event: &LayerEvent) {
        remap_index_set(event, Orientation::Vertical, &mut self.collapsed.write());
    }
}

impl std::fmt::Debug for TreeRowModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeRowModel")
            .field("elements", &self.data.element_count())
            .field("collapsed", &*self.collapsed.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(TreeRowModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ParentTreeData;
    use parking_lot::Mutex;

    // 0
    // +- 1
    // |  +- 2
    // |  +- 3
    // +- 4
    //    +- 5
    // 6
    fn model() -> TreeRowModel {
        let data = ParentTreeData::from_depths([0, 1, 2, 2, 1, 2, 0]);
        TreeRowModel::new(Arc::new(data))
    }

    #[test]
    fn test_collapse_returns_all_descendants() {
        let m = model();
        m.collapse(1);
        assert_eq!(m.collapse(0), vec![1, 2, 3, 4, 5]);
        assert!(m.is_hidden(2));
        assert!(m.is_collapsed(1));
        assert!(m.collapse(6).is_empty());
    }

    #[test]
    fn test_expand_keeps_collapsed_children() {
        let m = model();
        m.collapse(1);
        m.collapse(0);
        assert_eq!(m.expand(0), vec![1, 4, 5]);
        assert!(m.is_hidden(2));
        assert_eq!(m.expand(1), vec![2, 3]);
    }

    #[test]
    fn test_expand_restores_collapsed_subtree() {
        let m = model();
        m.collapse(4);
        let visible = m.visible_descendants(0);
        m.collapse(0);
        m.expand(0);
        assert_eq!(m.visible_descendants(0), visible);
    }

    #[test]
    fn test_expand_to_level() {
        let m = model();
        m.collapse_all();
        assert_eq!(m.expand_to_level(0, 1), vec![1, 4]);
        assert!(m.is_collapsed(1));
        assert_eq!(m.expand_to_level(0, 2), vec![2, 3, 5]);
    }

    #[test]
    fn test_collapse_all_and_expand_all() {
        let m = model();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        m.state_changed().connect(move |changed: &Vec<usize>| sink.lock().push(changed.clone()));

        assert_eq!(m.collapse_all(), vec![1, 2, 3, 4, 5]);
        assert_eq!(m.collapsed_indexes(), vec![0, 1, 4]);
        assert_eq!(m.expand_all(), vec![1, 2, 3, 4, 5]);
        assert_eq!(changes.lock().len(), 2);
    }

    #[test]
    fn test_restore_collapsed_indexes_skips_leaves() {
        let m = model();
        m.set_collapsed_indexes([0, 2, 99]);
        assert_eq!(m.collapsed_indexes(), vec![0]);
    }
}
