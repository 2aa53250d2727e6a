use std::fmt;

use horizon_grid_core::{GridError, Result};

use super::ConfigRegistry;
use crate::layer::LayerCell;

/// Decides whether a cell may be edited.
pub trait EditableRule: Send + Sync {
    /// Decide by data indexes alone.
    fn is_editable(&self, column_index: usize, row_index: usize) -> Result<bool>;

    /// Decide with the full cell context. Defaults to the index check.
    fn is_editable_cell(&self, cell: &LayerCell, registry: &ConfigRegistry) -> Result<bool> {
        let _ = registry;
        self.is_editable(cell.column_index, cell.row_index)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEditable;

impl EditableRule for AlwaysEditable {
    fn is_editable(&self, _column_index: usize, _row_index: usize) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEditable;

impl EditableRule for NeverEditable {
    fn is_editable(&self, _column_index: usize, _row_index: usize) -> Result<bool> {
        Ok(false)
    }
}

type CellPredicate = Box<dyn Fn(&LayerCell, &ConfigRegistry) -> bool + Send + Sync>;

/// A rule that needs the cell (labels, display mode, value) to decide.
///
/// Asking it by indexes alone is a contract violation and yields
/// [`GridError::Unsupported`].
pub struct ContextualEditableRule {
    predicate: CellPredicate,
}

impl ContextualEditableRule {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&LayerCell, &ConfigRegistry) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl EditableRule for ContextualEditableRule {
    fn is_editable(&self, column_index: usize, row_index: usize) -> Result<bool> {
        Err(GridError::unsupported(format!(
            "contextual editable rule needs a cell, got only indexes ({column_index}, {row_index})"
        )))
    }

    fn is_editable_cell(&self, cell: &LayerCell, registry: &ConfigRegistry) -> Result<bool> {
        Ok((self.predicate)(cell, registry))
    }
}

impl fmt::Debug for ContextualEditableRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualEditableRule").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayMode, LabelStack};
    use crate::coordinate::Rectangle;
    use crate::data::CellValue;

    fn cell(labels: &[&str]) -> LayerCell {
        LayerCell {
            column_position: 1,
            row_position: 2,
            column_index: 1,
            row_index: 2,
            bounds: Rectangle::new(100, 40, 100, 20),
            display_mode: DisplayMode::Normal,
            labels: labels.iter().copied().collect::<LabelStack>(),
            value: CellValue::from("x"),
        }
    }

    #[test]
    fn test_fixed_rules() {
        assert!(AlwaysEditable.is_editable(0, 0).unwrap());
        assert!(!NeverEditable.is_editable(0, 0).unwrap());
        let registry = ConfigRegistry::new();
        assert!(AlwaysEditable.is_editable_cell(&cell(&[]), &registry).unwrap());
    }

    #[test]
    fn test_contextual_rule_requires_cell() {
        let rule = ContextualEditableRule::new(|cell, _| cell.has_label("EDITABLE"));
        let err = rule.is_editable(1, 2).unwrap_err();
        assert!(matches!(err, GridError::Unsupported(_)));

        let registry = ConfigRegistry::new();
        assert!(rule.is_editable_cell(&cell(&["EDITABLE"]), &registry).unwrap());
        assert!(!rule.is_editable_cell(&cell(&["BODY"]), &registry).unwrap());
    }
}
