use std::sync::Arc;

use crate::command::{LayerCommand, PositionCoordinate};
use crate::coordinate::Orientation;
use crate::layer::Layer;

/// How a [`ScrollCommand`] moves the viewport origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Put the origin at an absolute pixel of the underlying layer.
    ToPixel(i32),
    /// Move the origin by a pixel delta.
    ByPixels(i32),
    LineForward,
    LineBackward,
    PageForward,
    PageBackward,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub axis: Orientation,
    pub action: ScrollAction,
}

impl ScrollCommand {
    pub fn new(axis: Orientation, action: ScrollAction) -> Self {
        Self { axis, action }
    }
}

impl LayerCommand for ScrollCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

/// Scroll so that a position becomes fully visible.
///
/// The coordinate is usually issued on a layer below the viewport, since the
/// position may not be visible in the viewport yet. It is converted to the
/// viewport's underlying layer.
#[derive(Debug, Clone)]
pub struct ShowPositionInViewportCommand {
    pub axis: Orientation,
    pub coordinate: PositionCoordinate,
}

impl ShowPositionInViewportCommand {
    pub fn new(axis: Orientation, layer: Arc<dyn Layer>, position: usize) -> Self {
        Self {
            axis,
            coordinate: PositionCoordinate::new(layer, position),
        }
    }
}

impl LayerCommand for ShowPositionInViewportCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.coordinate.convert(self.axis, target)
    }
}
