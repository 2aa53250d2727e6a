//! Commands: intents that travel down a layer stack.
//!
//! A command carries coordinates in the space of the layer it was issued
//! on. Before a layer acts on a command it clones it and calls
//! [`LayerCommand::convert_to_target_layer`], which rewrites the coordinates
//! into the layer's own positions or reports that the command does not apply
//! there. The original command is never mutated, so it can be delegated
//! further down unchanged.

mod common;

pub use common::{
    ClientAreaResizeCommand, ConfigureScalingCommand, MultiResizeCommand,
    PercentageSizingCommand, ResizeCommand, StructuralRefreshCommand, VisualRefreshCommand,
};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};

use crate::coordinate::{CellPosition, Orientation};
use crate::layer::{Layer, convert_position_to_target};

/// An intent dispatched through [`Layer::do_command`].
pub trait LayerCommand: Any + Send + Sync + fmt::Debug + CloneCommand {
    /// Rewrite coordinates into `target`'s positions.
    ///
    /// Returns `false` when the command does not apply to `target`, for
    /// example because its coordinates are not visible there.
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool;

    /// Whether composites deliver the command to every child instead of the
    /// first one that handles it.
    fn is_broadcast(&self) -> bool {
        false
    }
}

/// Object-safe cloning and downcasting, implemented for every `Clone` command.
pub trait CloneCommand {
    fn clone_command(&self) -> Box<dyn LayerCommand>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: LayerCommand + Clone> CloneCommand for T {
    fn clone_command(&self) -> Box<dyn LayerCommand> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn LayerCommand {
    pub fn downcast_ref<T: LayerCommand>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: LayerCommand>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl Clone for Box<dyn LayerCommand> {
    fn clone(&self) -> Self {
        self.clone_command()
    }
}

/// If `command` is a `C`, a clone of it converted to `target`.
pub fn convert_command<C: LayerCommand + Clone>(
    command: &dyn LayerCommand,
    target: &dyn Layer,
) -> Option<C> {
    let mut converted = command.downcast_ref::<C>()?.clone();
    converted
        .convert_to_target_layer(target)
        .then_some(converted)
}

/// Dispatch `command` from the top of a stack, tracing commands nobody handles.
pub fn dispatch(layer: &dyn Layer, command: &dyn LayerCommand) -> bool {
    let _span = PerfSpan::new(span_names::DISPATCH);
    let handled = layer.do_command(command);
    if handled {
        tracing::trace!(target: targets::COMMAND, layer = layer.name(), ?command, "command handled");
    } else {
        tracing::trace!(target: targets::COMMAND, layer = layer.name(), ?command, "command not handled");
    }
    handled
}

// =============================================================================
// Coordinates
// =============================================================================

/// A position along one axis of a specific layer.
#[derive(Clone)]
pub struct PositionCoordinate {
    pub layer: Arc<dyn Layer>,
    pub position: usize,
}

impl PositionCoordinate {
    pub fn new(layer: Arc<dyn Layer>, position: usize) -> Self {
        Self { layer, position }
    }

    /// Re-express this coordinate in `target`'s positions.
    pub fn convert(&mut self, axis: Orientation, target: &dyn Layer) -> bool {
        match convert_position_to_target(axis, &self.layer, self.position, target.id()) {
            Some((layer, position)) => {
                self.layer = layer;
                self.position = position;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for PositionCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.layer.name(), self.layer.id(), self.position)
    }
}

/// A cell of a specific layer.
#[derive(Clone)]
pub struct CellCoordinate {
    pub layer: Arc<dyn Layer>,
    pub column: usize,
    pub row: usize,
}

impl CellCoordinate {
    pub fn new(layer: Arc<dyn Layer>, column: usize, row: usize) -> Self {
        Self { layer, column, row }
    }

    pub fn cell(&self) -> CellPosition {
        CellPosition::new(self.column, self.row)
    }

    /// Re-express this cell in `target`'s positions. Both axes must convert.
    pub fn convert(&mut self, target: &dyn Layer) -> bool {
        let column = convert_position_to_target(
            Orientation::Horizontal,
            &self.layer,
            self.column,
            target.id(),
        );
        let row =
            convert_position_to_target(Orientation::Vertical, &self.layer, self.row, target.id());
        match (column, row) {
            (Some((layer, column)), Some((_, row))) => {
                self.layer = layer;
                self.column = column;
                self.row = row;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:({},{})",
            self.layer.name(),
            self.layer.id(),
            self.column,
            self.row
        )
    }
}

/// Convert every coordinate, keeping those that convert. Returns whether any did.
pub(crate) fn convert_coordinates(
    coordinates: &mut Vec<PositionCoordinate>,
    axis: Orientation,
    target: &dyn Layer,
) -> bool {
    coordinates.retain_mut(|coordinate| coordinate.convert(axis, target));
    !coordinates.is_empty()
}
