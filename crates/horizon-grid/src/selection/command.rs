use std::sync::Arc;

use super::{MoveDirection, TraversalStrategy};
use crate::command::{CellCoordinate, LayerCommand, PositionCoordinate, convert_coordinates};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// Keyboard modifiers of a selection gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Extend from the anchor.
    pub shift: bool,
    /// Add to (or toggle in) the existing selection.
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self::new(false, false);
    pub const SHIFT: Self = Self::new(true, false);
    pub const CTRL: Self = Self::new(false, true);

    pub const fn new(shift: bool, ctrl: bool) -> Self {
        Self { shift, ctrl }
    }
}

#[derive(Debug, Clone)]
pub struct SelectCellCommand {
    pub coordinate: CellCoordinate,
    pub modifiers: Modifiers,
}

impl SelectCellCommand {
    pub fn new(layer: Arc<dyn Layer>, column: usize, row: usize, modifiers: Modifiers) -> Self {
        Self {
            coordinate: CellCoordinate::new(layer, column, row),
            modifiers,
        }
    }
}

impl LayerCommand for SelectCellCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.coordinate.convert(target)
    }
}

/// Select whole columns.
#[derive(Debug, Clone)]
pub struct SelectColumnCommand {
    pub column: PositionCoordinate,
    pub modifiers: Modifiers,
}

impl SelectColumnCommand {
    pub fn new(layer: Arc<dyn Layer>, column: usize, modifiers: Modifiers) -> Self {
        Self {
            column: PositionCoordinate::new(layer, column),
            modifiers,
        }
    }
}

impl LayerCommand for SelectColumnCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.column.convert(Orientation::Horizontal, target)
    }
}

/// Select whole rows. The last row becomes the anchor row.
#[derive(Debug, Clone)]
pub struct SelectRowsCommand {
    rows: Vec<PositionCoordinate>,
    pub modifiers: Modifiers,
}

impl SelectRowsCommand {
    pub fn new(layer: Arc<dyn Layer>, rows: &[usize], modifiers: Modifiers) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|&row| PositionCoordinate::new(layer.clone(), row))
                .collect(),
            modifiers,
        }
    }

    pub fn rows(&self) -> Vec<usize> {
        self.rows.iter().map(|c| c.position).collect()
    }
}

impl LayerCommand for SelectRowsCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        convert_coordinates(&mut self.rows, Orientation::Vertical, target)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAllCommand;

impl LayerCommand for SelectAllCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClearAllSelectionsCommand;

impl LayerCommand for ClearAllSelectionsCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

/// Move the selection from the last selected cell.
#[derive(Debug, Clone, Copy)]
pub struct MoveSelectionCommand {
    pub direction: MoveDirection,
    pub step: usize,
    pub modifiers: Modifiers,
    /// Overrides the selection layer's strategy.
    pub strategy: Option<TraversalStrategy>,
}

impl MoveSelectionCommand {
    pub fn new(direction: MoveDirection) -> Self {
        Self {
            direction,
            step: 1,
            modifiers: Modifiers::NONE,
            strategy: None,
        }
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_strategy(mut self, strategy: TraversalStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

impl LayerCommand for MoveSelectionCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}
