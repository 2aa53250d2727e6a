use std::sync::Arc;

use crate::command::{LayerCommand, PositionCoordinate};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// Freeze every column and/or row up to and including the given positions.
#[derive(Debug, Clone)]
pub struct FreezeCommand {
    pub columns: Option<PositionCoordinate>,
    pub rows: Option<PositionCoordinate>,
}

impl FreezeCommand {
    pub fn columns(layer: Arc<dyn Layer>, last_column: usize) -> Self {
        Self {
            columns: Some(PositionCoordinate::new(layer, last_column)),
            rows: None,
        }
    }

    pub fn rows(layer: Arc<dyn Layer>, last_row: usize) -> Self {
        Self {
            columns: None,
            rows: Some(PositionCoordinate::new(layer, last_row)),
        }
    }

    /// Freeze the block above and left of a cell, the cell included.
    pub fn cell(layer: Arc<dyn Layer>, column: usize, row: usize) -> Self {
        Self {
            columns: Some(PositionCoordinate::new(layer.clone(), column)),
            rows: Some(PositionCoordinate::new(layer, row)),
        }
    }

    pub fn coordinate(&self, axis: Orientation) -> Option<&PositionCoordinate> {
        match axis {
            Orientation::Horizontal => self.columns.as_ref(),
            Orientation::Vertical => self.rows.as_ref(),
        }
    }
}

impl LayerCommand for FreezeCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        let columns = self
            .columns
            .as_mut()
            .is_none_or(|c| c.convert(Orientation::Horizontal, target));
        let rows = self
            .rows
            .as_mut()
            .is_none_or(|c| c.convert(Orientation::Vertical, target));
        columns && rows
    }
}

/// Remove any frozen area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnfreezeCommand;

impl LayerCommand for UnfreezeCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}
