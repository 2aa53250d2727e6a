use std::sync::Arc;

use crate::command::{LayerCommand, PositionCoordinate, convert_coordinates};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// Hide positions of the issuing layer.
#[derive(Debug, Clone)]
pub struct HidePositionsCommand {
    pub axis: Orientation,
    coordinates: Vec<PositionCoordinate>,
}

impl HidePositionsCommand {
    pub fn new(axis: Orientation, layer: Arc<dyn Layer>, positions: &[usize]) -> Self {
        Self {
            axis,
            coordinates: positions
                .iter()
                .map(|&position| PositionCoordinate::new(layer.clone(), position))
                .collect(),
        }
    }

    pub fn positions(&self) -> Vec<usize> {
        self.coordinates.iter().map(|c| c.position).collect()
    }
}

impl LayerCommand for HidePositionsCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        convert_coordinates(&mut self.coordinates, self.axis, target)
    }
}

/// Show hidden entries again, by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowIndexesCommand {
    pub axis: Orientation,
    pub indexes: Vec<usize>,
}

impl ShowIndexesCommand {
    pub fn new(axis: Orientation, indexes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            axis,
            indexes: indexes.into_iter().collect(),
        }
    }
}

impl LayerCommand for ShowIndexesCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

/// Show everything hidden along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowAllCommand {
    pub axis: Orientation,
}

impl ShowAllCommand {
    pub fn new(axis: Orientation) -> Self {
        Self { axis }
    }
}

impl LayerCommand for ShowAllCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}
