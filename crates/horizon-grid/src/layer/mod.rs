//! The layer abstraction.
//!
//! A grid is a directed acyclic stack of layers. The bottom layer (usually a
//! [`DataLayer`](crate::data_layer::DataLayer)) maps indexes to pixels; each
//! layer above re-maps the positions of the layer(s) below it, adding,
//! removing or reordering visible positions.
//!
//! # Protocol
//!
//! - **Commands** travel down. [`Layer::do_command`] tries the layer's
//!   registered handlers, then its built-in handling, and otherwise delegates
//!   the original command to the underlying layer. `false` means nobody
//!   handled it.
//! - **Events** travel up. A layer fires events to its listeners; an upper
//!   layer receives them in [`Layer::handle_layer_event`], converts them into
//!   its own positions with
//!   [`LayerEvent::convert_to_local`](crate::event::LayerEvent::convert_to_local),
//!   updates its caches and fires them again.
//!
//! # Ownership
//!
//! Upper layers own their underlying layers through `Arc<dyn Layer>`. The
//! listener an upper layer registers on an underlying layer only holds a
//! `Weak` reference back, so a stack is freed when its top is dropped.
//!
//! All methods take `&self`; layers keep mutable state behind
//! `parking_lot` locks and never hold a guard while calling into another
//! layer or firing an event.

mod base;
mod cell;
pub mod debug;
mod util;

pub use base::{LayerBase, LayerId};
pub use cell::LayerCell;
pub use util::{
    convert_position_to_target, convert_positions, underlying_cell, underlying_to_local_ranges,
};
pub(crate) use util::{position_in_starts, prefix_starts, relay_event};

use std::sync::Arc;

use crate::command::LayerCommand;
use crate::config::{DisplayMode, LabelStack};
use crate::coordinate::{Orientation, Rectangle};
use crate::data::CellValue;
use crate::event::LayerEvent;
use crate::persistence::Properties;

use Orientation::{Horizontal, Vertical};

/// A layer of the grid stack.
///
/// Positions are `usize` and "not found" is `None`. Pixels are `i32`.
pub trait Layer: Send + Sync {
    /// Shared bookkeeping: id, listeners, command handlers, labels.
    fn base(&self) -> &LayerBase;

    fn id(&self) -> LayerId {
        self.base().id()
    }

    /// Short type name, used in logs and debug output.
    fn name(&self) -> &'static str {
        self.base().name()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Number of positions along `axis`.
    fn count(&self, axis: Orientation) -> usize;

    /// The count this layer would like to show, ignoring any client area.
    fn preferred_count(&self, axis: Orientation) -> usize {
        self.count(axis)
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize>;

    /// `None` if the index is not visible in this layer.
    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize>;

    /// The position in the underlying layer that `position` maps to.
    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize>;

    /// The local position showing `underlying_position` of layer `source`.
    ///
    /// `None` if `source` is not directly underneath this layer or the
    /// position is not visible here.
    fn underlying_to_local(
        &self,
        axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize>;

    /// The layers directly underneath, without duplicates.
    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>>;

    /// The layers a local position along `axis` maps into.
    fn underlying_layers_by_position(
        &self,
        axis: Orientation,
        position: usize,
    ) -> Vec<Arc<dyn Layer>> {
        let _ = (axis, position);
        self.underlying_layers()
    }

    /// The layer providing the content of a cell.
    fn underlying_layer_by_cell(&self, column: usize, row: usize) -> Option<Arc<dyn Layer>> {
        let _ = (column, row);
        self.underlying_layers().into_iter().next()
    }

    /// Whether `id` is directly underneath this layer.
    fn is_underlying(&self, id: LayerId) -> bool {
        self.underlying_layers().iter().any(|layer| layer.id() == id)
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Total pixel width (`Horizontal`) or height (`Vertical`).
    fn extent(&self, axis: Orientation) -> i32;

    fn preferred_extent(&self, axis: Orientation) -> i32 {
        self.extent(axis)
    }

    /// Pixel size of a position, `0` when the position does not exist.
    fn size_by_position(&self, axis: Orientation, position: usize) -> i32;

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32>;

    /// The position covering `pixel`, `None` outside the layer.
    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize>;

    fn is_resizable_by_position(&self, axis: Orientation, position: usize) -> bool {
        let Some(underlying_position) = self.local_to_underlying(axis, position) else {
            return false;
        };
        self.underlying_layers_by_position(axis, position)
            .first()
            .is_some_and(|layer| layer.is_resizable_by_position(axis, underlying_position))
    }

    // =========================================================================
    // Cells
    // =========================================================================

    fn data_value_by_position(&self, column: usize, row: usize) -> CellValue {
        match underlying_cell(self, column, row) {
            Some((layer, c, r)) => layer.data_value_by_position(c, r),
            None => CellValue::None,
        }
    }

    fn display_mode_by_position(&self, column: usize, row: usize) -> DisplayMode {
        match underlying_cell(self, column, row) {
            Some((layer, c, r)) => layer.display_mode_by_position(c, r),
            None => DisplayMode::Normal,
        }
    }

    /// Labels from the layers below, then this layer's accumulator.
    fn config_labels_by_position(&self, column: usize, row: usize) -> LabelStack {
        let mut labels = match underlying_cell(self, column, row) {
            Some((layer, c, r)) => layer.config_labels_by_position(c, r),
            None => LabelStack::new(),
        };
        self.base().accumulate_labels(
            &mut labels,
            column,
            row,
            self.index_by_position(Horizontal, column),
            self.index_by_position(Vertical, row),
        );
        labels
    }

    fn bounds_by_position(&self, column: usize, row: usize) -> Option<Rectangle> {
        Some(Rectangle::new(
            self.start_pixel_by_position(Horizontal, column)?,
            self.start_pixel_by_position(Vertical, row)?,
            self.size_by_position(Horizontal, column),
            self.size_by_position(Vertical, row),
        ))
    }

    /// Everything a renderer needs about one cell.
    fn cell_by_position(&self, column: usize, row: usize) -> Option<LayerCell> {
        if column >= self.count(Horizontal) || row >= self.count(Vertical) {
            return None;
        }
        Some(LayerCell {
            column_position: column,
            row_position: row,
            column_index: self.index_by_position(Horizontal, column)?,
            row_index: self.index_by_position(Vertical, row)?,
            bounds: self.bounds_by_position(column, row)?,
            display_mode: self.display_mode_by_position(column, row),
            labels: self.config_labels_by_position(column, row),
            value: self.data_value_by_position(column, row),
        })
    }

    // =========================================================================
    // Commands, events and lifecycle
    // =========================================================================

    /// Handle or delegate a command. Returns whether some layer handled it.
    fn do_command(&self, command: &dyn LayerCommand) -> bool;

    /// React to an event fired by an underlying layer.
    fn handle_layer_event(&self, event: LayerEvent);

    fn fire_layer_event(&self, event: LayerEvent) {
        self.base().fire_layer_event(event);
    }

    /// Release listener registrations on underlying layers.
    fn dispose(&self) {
        self.base().dispose();
    }

    /// Write this layer's state (and, by default, its underlying layers').
    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for layer in self.underlying_layers() {
            layer.save_state(prefix, properties);
        }
    }

    /// Restore state written by [`save_state`](Self::save_state).
    fn load_state(&self, prefix: &str, properties: &Properties) {
        for layer in self.underlying_layers() {
            layer.load_state(prefix, properties);
        }
    }

    // =========================================================================
    // Column/row conveniences
    // =========================================================================

    fn column_count(&self) -> usize {
        self.count(Horizontal)
    }

    fn row_count(&self) -> usize {
        self.count(Vertical)
    }

    fn width(&self) -> i32 {
        self.extent(Horizontal)
    }

    fn height(&self) -> i32 {
        self.extent(Vertical)
    }

    fn column_width_by_position(&self, column: usize) -> i32 {
        self.size_by_position(Horizontal, column)
    }

    fn row_height_by_position(&self, row: usize) -> i32 {
        self.size_by_position(Vertical, row)
    }

    fn column_index_by_position(&self, column: usize) -> Option<usize> {
        self.index_by_position(Horizontal, column)
    }

    fn row_index_by_position(&self, row: usize) -> Option<usize> {
        self.index_by_position(Vertical, row)
    }

    fn column_position_by_index(&self, index: usize) -> Option<usize> {
        self.position_by_index(Horizontal, index)
    }

    fn row_position_by_index(&self, index: usize) -> Option<usize> {
        self.position_by_index(Vertical, index)
    }

    fn column_position_by_x(&self, x: i32) -> Option<usize> {
        self.position_by_pixel(Horizontal, x)
    }

    fn row_position_by_y(&self, y: i32) -> Option<usize> {
        self.position_by_pixel(Vertical, y)
    }

    fn start_x_of_column_position(&self, column: usize) -> Option<i32> {
        self.start_pixel_by_position(Horizontal, column)
    }

    fn start_y_of_row_position(&self, row: usize) -> Option<i32> {
        self.start_pixel_by_position(Vertical, row)
    }
}

impl std::fmt::Debug for dyn Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.name())
            .field("id", &self.id())
            .field("columns", &self.count(Horizontal))
            .field("rows", &self.count(Vertical))
            .finish()
    }
}
