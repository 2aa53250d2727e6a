use std::sync::Arc;

use crate::command::{LayerCommand, PositionCoordinate};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// Toggle the node shown in a row.
#[derive(Debug, Clone)]
pub struct TreeExpandCollapseCommand {
    pub row: PositionCoordinate,
}

impl TreeExpandCollapseCommand {
    pub fn new(layer: Arc<dyn Layer>, row: usize) -> Self {
        Self {
            row: PositionCoordinate::new(layer, row),
        }
    }
}

impl LayerCommand for TreeExpandCollapseCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.row.convert(Orientation::Vertical, target)
    }
}

/// Expand nodes to a depth, below one row or across the whole tree.
#[derive(Debug, Clone)]
pub struct TreeExpandToLevelCommand {
    pub row: Option<PositionCoordinate>,
    pub level: usize,
}

impl TreeExpandToLevelCommand {
    pub fn all(level: usize) -> Self {
        Self { row: None, level }
    }

    pub fn below(layer: Arc<dyn Layer>, row: usize, level: usize) -> Self {
        Self {
            row: Some(PositionCoordinate::new(layer, row)),
            level,
        }
    }
}

impl LayerCommand for TreeExpandToLevelCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.row
            .as_mut()
            .is_none_or(|row| row.convert(Orientation::Vertical, target))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeExpandAllCommand;

impl LayerCommand for TreeExpandAllCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCollapseAllCommand;

impl LayerCommand for TreeCollapseAllCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}
