//! Commands understood by several layer types.

use std::sync::Arc;

use super::{LayerCommand, PositionCoordinate};
use crate::coordinate::Orientation;
use crate::data_layer::DpiConverter;
use crate::layer::Layer;

/// The host's drawable area changed. Composites hand every child its share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAreaResizeCommand {
    pub width: i32,
    pub height: i32,
}

impl ClientAreaResizeCommand {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn extent(&self, axis: Orientation) -> i32 {
        match axis {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }
}

impl LayerCommand for ClientAreaResizeCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }

    fn is_broadcast(&self) -> bool {
        true
    }
}

/// Install DPI converters on every data layer.
#[derive(Debug, Clone)]
pub struct ConfigureScalingCommand {
    pub horizontal: Arc<dyn DpiConverter>,
    pub vertical: Arc<dyn DpiConverter>,
}

impl ConfigureScalingCommand {
    pub fn new(horizontal: Arc<dyn DpiConverter>, vertical: Arc<dyn DpiConverter>) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn converter(&self, axis: Orientation) -> &Arc<dyn DpiConverter> {
        match axis {
            Orientation::Horizontal => &self.horizontal,
            Orientation::Vertical => &self.vertical,
        }
    }
}

impl LayerCommand for ConfigureScalingCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }

    fn is_broadcast(&self) -> bool {
        true
    }
}

/// Recompute all structure (both axes) from the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralRefreshCommand;

impl LayerCommand for StructuralRefreshCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }

    fn is_broadcast(&self) -> bool {
        true
    }
}

/// Repaint everything without structural change.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualRefreshCommand;

impl LayerCommand for VisualRefreshCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }

    fn is_broadcast(&self) -> bool {
        true
    }
}

/// Resize one position.
///
/// With `downscale` the size is given in display pixels and stored divided
/// by the DPI factor; without it the size is stored as given and scaled up
/// on read.
#[derive(Debug, Clone)]
pub struct ResizeCommand {
    pub axis: Orientation,
    pub coordinate: PositionCoordinate,
    pub size: i32,
    pub downscale: bool,
}

impl ResizeCommand {
    pub fn new(axis: Orientation, layer: Arc<dyn Layer>, position: usize, size: i32) -> Self {
        Self {
            axis,
            coordinate: PositionCoordinate::new(layer, position),
            size,
            downscale: false,
        }
    }

    pub fn downscaled(mut self, downscale: bool) -> Self {
        self.downscale = downscale;
        self
    }

    pub fn position(&self) -> usize {
        self.coordinate.position
    }
}

impl LayerCommand for ResizeCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.coordinate.convert(self.axis, target)
    }
}

/// Resize several positions, each to its own size.
#[derive(Debug, Clone)]
pub struct MultiResizeCommand {
    pub axis: Orientation,
    coordinates: Vec<PositionCoordinate>,
    sizes: Vec<i32>,
    pub downscale: bool,
}

impl MultiResizeCommand {
    /// Resize every position to the same size.
    pub fn new(axis: Orientation, layer: Arc<dyn Layer>, positions: &[usize], size: i32) -> Self {
        let sizes = vec![size; positions.len()];
        Self::with_sizes(axis, layer, positions, &sizes)
    }

    /// Resize `positions[i]` to `sizes[i]`; extra entries of either are ignored.
    pub fn with_sizes(
        axis: Orientation,
        layer: Arc<dyn Layer>,
        positions: &[usize],
        sizes: &[i32],
    ) -> Self {
        let len = positions.len().min(sizes.len());
        Self {
            axis,
            coordinates: positions[..len]
                .iter()
                .map(|&position| PositionCoordinate::new(layer.clone(), position))
                .collect(),
            sizes: sizes[..len].to_vec(),
            downscale: false,
        }
    }

    pub fn downscaled(mut self, downscale: bool) -> Self {
        self.downscale = downscale;
        self
    }

    /// `(position, size)` pairs.
    pub fn resizes(&self) -> Vec<(usize, i32)> {
        self.coordinates
            .iter()
            .zip(&self.sizes)
            .map(|(coordinate, &size)| (coordinate.position, size))
            .collect()
    }
}

impl LayerCommand for MultiResizeCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        let mut pairs: Vec<(PositionCoordinate, i32)> = self
            .coordinates
            .drain(..)
            .zip(self.sizes.drain(..))
            .collect();
        pairs.retain_mut(|(coordinate, _)| coordinate.convert(self.axis, target));
        let (coordinates, sizes) = pairs.into_iter().unzip();
        self.coordinates = coordinates;
        self.sizes = sizes;
        !self.coordinates.is_empty()
    }
}

/// Switch percentage sizing on or off for an axis of the data layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageSizingCommand {
    pub axis: Orientation,
    pub enabled: bool,
}

impl PercentageSizingCommand {
    pub fn new(axis: Orientation, enabled: bool) -> Self {
        Self { axis, enabled }
    }
}

impl LayerCommand for PercentageSizingCommand {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }

    fn is_broadcast(&self) -> bool {
        true
    }
}
