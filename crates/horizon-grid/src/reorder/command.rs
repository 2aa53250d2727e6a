use std::sync::Arc;

use crate::command::{LayerCommand, PositionCoordinate, convert_coordinates};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// Move positions next to a target position.
///
/// With `to_left_edge` the moved entries end up before the target, otherwise
/// after it.
#[derive(Debug, Clone)]
pub struct ReorderCommand {
    pub axis: Orientation,
    from: Vec<PositionCoordinate>,
    pub to: PositionCoordinate,
    pub to_left_edge: bool,
}

impl ReorderCommand {
    pub fn new(axis: Orientation, layer: Arc<dyn Layer>, from: usize, to: usize) -> Self {
        Self::multiple(axis, layer, &[from], to)
    }

    pub fn multiple(axis: Orientation, layer: Arc<dyn Layer>, from: &[usize], to: usize) -> Self {
        Self {
            axis,
            from: from
                .iter()
                .map(|&position| PositionCoordinate::new(layer.clone(), position))
                .collect(),
            to: PositionCoordinate::new(layer, to),
            to_left_edge: true,
        }
    }

    /// Place the moved entries after the target instead of before it.
    pub fn after_target(mut self) -> Self {
        self.to_left_edge = false;
        self
    }

    pub fn from_positions(&self) -> Vec<usize> {
        self.from.iter().map(|c| c.position).collect()
    }
}

impl LayerCommand for ReorderCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.to.convert(self.axis, target) && convert_coordinates(&mut self.from, self.axis, target)
    }
}

/// Restore the underlying order along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOrderCommand {
    pub axis: Orientation,
}

impl ResetOrderCommand {
    pub fn new(axis: Orientation) -> Self {
        Self { axis }
    }
}

impl LayerCommand for ResetOrderCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}
