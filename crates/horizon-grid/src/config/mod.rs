//! Cell configuration: display modes, labels, the config registry and
//! editable rules.
//!
//! Every layer a cell passes through may contribute labels to it (for
//! example `SELECT` from the selection layer or `COLUMN_HEADER` from a grid
//! region). Consumers look up attributes in the [`ConfigRegistry`] by the
//! cell's display mode and label stack.

mod editable;
pub mod labels;
mod registry;

pub use editable::{AlwaysEditable, ContextualEditableRule, EditableRule, NeverEditable};
pub use labels::{
    ColumnLabelAccumulator, ColumnOverrideLabelAccumulator, ConfigLabelAccumulator, LabelStack,
};
pub use registry::{ConfigAttribute, ConfigRegistry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The state a cell is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    #[default]
    Normal,
    Select,
    Hover,
    SelectHover,
    Edit,
}

impl DisplayMode {
    /// The modes searched for an attribute, most specific first.
    pub fn ordering(self) -> &'static [DisplayMode] {
        use DisplayMode::*;
        match self {
            Normal => &[Normal],
            Select => &[Select, Normal],
            Hover => &[Hover, Normal],
            SelectHover => &[SelectHover, Select, Hover, Normal],
            Edit => &[Edit, Normal],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mode_ordering() {
        assert_eq!(DisplayMode::Normal.ordering(), &[DisplayMode::Normal]);
        assert_eq!(
            DisplayMode::Edit.ordering(),
            &[DisplayMode::Edit, DisplayMode::Normal]
        );
        assert_eq!(DisplayMode::SelectHover.ordering().len(), 4);
        assert_eq!(DisplayMode::SelectHover.ordering().last(), Some(&DisplayMode::Normal));
    }
}
