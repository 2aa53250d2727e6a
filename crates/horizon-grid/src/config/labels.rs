//! Config labels and label accumulators.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Label contributed by the selection layer to selected cells.
pub const SELECT: &str = "SELECT";
/// Label for the anchor cell of a selection.
pub const SELECTION_ANCHOR: &str = "SELECTION_ANCHOR";
/// Grid region labels.
pub const BODY: &str = "BODY";
pub const COLUMN_HEADER: &str = "COLUMN_HEADER";
pub const ROW_HEADER: &str = "ROW_HEADER";
pub const CORNER: &str = "CORNER";
/// Tree labels, on cells of the tree column.
pub const TREE_COLUMN: &str = "TREE_COLUMN";
pub const TREE_EXPANDED: &str = "TREE_EXPANDED";
pub const TREE_COLLAPSED: &str = "TREE_COLLAPSED";
pub const TREE_LEAF: &str = "TREE_LEAF";
/// Prefix of the `TREE_DEPTH_<n>` labels.
pub const TREE_DEPTH_PREFIX: &str = "TREE_DEPTH_";
/// Prefix of the `COLUMN_<index>` labels.
pub const COLUMN_PREFIX: &str = "COLUMN_";

/// An ordered set of labels, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStack {
    labels: Vec<String>,
}

impl LabelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label with the lowest priority. Duplicates are ignored.
    pub fn add_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.has_label(&label) {
            self.labels.push(label);
        }
    }

    /// Add a label with the highest priority, moving it if already present.
    pub fn add_label_on_top(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.labels.retain(|l| *l != label);
        self.labels.insert(0, label);
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l != label);
        self.labels.len() != before
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelStack {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut stack = LabelStack::new();
        for label in iter {
            stack.add_label(label);
        }
        stack
    }
}

/// Contributes labels to cells of a layer.
///
/// Called with the layer's own positions and the indexes they resolve to.
pub trait ConfigLabelAccumulator: Send + Sync {
    fn accumulate_labels(
        &self,
        labels: &mut LabelStack,
        column_position: usize,
        row_position: usize,
        column_index: Option<usize>,
        row_index: Option<usize>,
    );
}

/// Adds `COLUMN_<index>` to every cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnLabelAccumulator;

impl ConfigLabelAccumulator for ColumnLabelAccumulator {
    fn accumulate_labels(
        &self,
        labels: &mut LabelStack,
        _column_position: usize,
        _row_position: usize,
        column_index: Option<usize>,
        _row_index: Option<usize>,
    ) {
        if let Some(index) = column_index {
            labels.add_label(format!("{COLUMN_PREFIX}{index}"));
        }
    }
}

/// Adds caller-chosen labels to every cell of a column, by column index.
#[derive(Debug, Default)]
pub struct ColumnOverrideLabelAccumulator {
    overrides: RwLock<HashMap<usize, Vec<String>>>,
}

impl ColumnOverrideLabelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_column_override(&self, column_index: usize, label: impl Into<String>) {
        let label = label.into();
        let mut overrides = self.overrides.write();
        let labels = overrides.entry(column_index).or_default();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    pub fn unregister_column_overrides(&self, column_index: usize) {
        self.overrides.write().remove(&column_index);
    }
}

impl ConfigLabelAccumulator for ColumnOverrideLabelAccumulator {
    fn accumulate_labels(
        &self,
        labels: &mut LabelStack,
        _column_position: usize,
        _row_position: usize,
        column_index: Option<usize>,
        _row_index: Option<usize>,
    ) {
        let Some(index) = column_index else {
            return;
        };
        if let Some(extra) = self.overrides.read().get(&index) {
            for label in extra {
                labels.add_label(label.clone());
            }
        }
    }
}
