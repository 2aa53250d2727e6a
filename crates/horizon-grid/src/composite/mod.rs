//! Composite layers: child layers arranged in a layout grid.
//!
//! A [`CompositeLayer`] lays out children in columns and rows of a layout.
//! Children in the same layout column share their horizontal structure and
//! children in the same layout row their vertical structure (usually through
//! [`DimensionallyDependentLayer`](crate::dimensional::DimensionallyDependentLayer)),
//! so the first layout row defines the columns and the first layout column
//! defines the rows.
//!
//! The classic grid is a 2x2 composite of corner, column header, row header
//! and body; see [`CompositeLayer::grid`].

mod freeze;

pub use freeze::{CompositeFreezeLayer, FROZEN, FROZEN_COLUMNS, FROZEN_ROWS, SCROLLABLE};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{GridError, Result};

use crate::command::{ClientAreaResizeCommand, LayerCommand};
use crate::config::LabelStack;
use crate::config::labels::{BODY, COLUMN_HEADER, CORNER, ROW_HEADER};
use crate::coordinate::Orientation;
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, relay_event, underlying_cell};

use Orientation::{Horizontal, Vertical};

/// A child of a composite together with its region label.
#[derive(Clone)]
pub struct Region {
    pub label: String,
    pub layer: Arc<dyn Layer>,
}

impl Region {
    pub fn new(label: impl Into<String>, layer: Arc<dyn Layer>) -> Self {
        Self {
            label: label.into(),
            layer,
        }
    }
}

/// Child layers arranged in a layout grid.
pub struct CompositeLayer {
    base: LayerBase,
    /// Layout rows of layout columns.
    regions: Vec<Vec<Region>>,
    client_area: RwLock<Option<(i32, i32)>>,
    distributing: AtomicBool,
    redistribute: AtomicBool,
}

/// Upper bound on client area passes triggered from inside a distribution.
const MAX_DISTRIBUTION_PASSES: usize = 4;

impl CompositeLayer {
    /// Build a composite from layout rows. Every row needs the same, non-zero
    /// number of children.
    pub fn new(rows: Vec<Vec<Region>>) -> Result<Arc<Self>> {
        let columns = rows.first().map_or(0, Vec::len);
        if columns == 0 {
            return Err(GridError::unsupported("composite layout without children"));
        }
        if rows.iter().any(|row| row.len() != columns) {
            return Err(GridError::unsupported(
                "composite layout rows must have the same number of children",
            ));
        }
        Ok(Self::build(rows))
    }

    /// The standard grid: corner and column header on top, row header and
    /// body below.
    pub fn grid(
        body: Arc<dyn Layer>,
        column_header: Arc<dyn Layer>,
        row_header: Arc<dyn Layer>,
        corner: Arc<dyn Layer>,
    ) -> Arc<Self> {
        Self::build(vec![
            vec![Region::new(CORNER, corner), Region::new(COLUMN_HEADER, column_header)],
            vec![Region::new(ROW_HEADER, row_header), Region::new(BODY, body)],
        ])
    }

    fn build(regions: Vec<Vec<Region>>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let layer = Self {
                base: LayerBase::new("CompositeLayer"),
                regions,
                client_area: RwLock::new(None),
                distributing: AtomicBool::new(false),
                redistribute: AtomicBool::new(false),
            };
            let owner: Weak<dyn Layer> = me.clone();
            for child in layer.underlying_layers() {
                layer.base.listen_to(owner.clone(), &child);
            }
            layer
        })
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Number of layout columns (`Horizontal`) or rows (`Vertical`).
    pub fn layout_count(&self, axis: Orientation) -> usize {
        match axis {
            Horizontal => self.regions.first().map_or(0, Vec::len),
            Vertical => self.regions.len(),
        }
    }

    pub fn child(&self, layout_column: usize, layout_row: usize) -> Option<&Arc<dyn Layer>> {
        self.region(layout_column, layout_row).map(|r| &r.layer)
    }

    pub fn region(&self, layout_column: usize, layout_row: usize) -> Option<&Region> {
        self.regions.get(layout_row)?.get(layout_column)
    }

    /// The child carrying `label`.
    pub fn child_by_region(&self, label: &str) -> Option<&Arc<dyn Layer>> {
        self.regions
            .iter()
            .flatten()
            .find(|region| region.label == label)
            .map(|region| &region.layer)
    }

    /// The child defining the structure of layout slot `slot` along `axis`.
    fn axis_child(&self, axis: Orientation, slot: usize) -> Option<&Arc<dyn Layer>> {
        match axis {
            Horizontal => self.child(slot, 0),
            Vertical => self.child(0, slot),
        }
    }

    /// Layout slot and local position of a composite position.
    fn locate(&self, axis: Orientation, position: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for slot in 0..self.layout_count(axis) {
            let count = self.axis_child(axis, slot)?.count(axis);
            if position < offset + count {
                return Some((slot, position - offset));
            }
            offset += count;
        }
        None
    }

    fn position_offset(&self, axis: Orientation, slot: usize) -> usize {
        (0..slot)
            .filter_map(|s| self.axis_child(axis, s))
            .map(|child| child.count(axis))
            .sum()
    }

    fn pixel_offset(&self, axis: Orientation, slot: usize) -> i32 {
        (0..slot)
            .filter_map(|s| self.axis_child(axis, s))
            .map(|child| child.extent(axis))
            .fold(0, i32::saturating_add)
    }

    /// Layout column and row of a child.
    fn slot_of(&self, id: LayerId) -> Option<(usize, usize)> {
        self.regions.iter().enumerate().find_map(|(y, row)| {
            row.iter()
                .position(|region| region.layer.id() == id)
                .map(|x| (x, y))
        })
    }

    /// The region label of the cell at a composite position.
    pub fn region_label_by_position(&self, column: usize, row: usize) -> Option<&str> {
        let (x, _) = self.locate(Horizontal, column)?;
        let (y, _) = self.locate(Vertical, row)?;
        self.region(x, y).map(|region| region.label.as_str())
    }

    /// The region label under a pixel.
    pub fn region_label_by_pixel(&self, x: i32, y: i32) -> Option<&str> {
        let column = self.position_by_pixel(Horizontal, x)?;
        let row = self.position_by_pixel(Vertical, y)?;
        self.region_label_by_position(column, row)
    }

    // =========================================================================
    // Client area
    // =========================================================================

    /// Client area share of each layout slot: children before the last get
    /// their own extent, the last gets what remains.
    fn client_shares(&self, axis: Orientation, total: i32) -> Vec<i32> {
        let slots = self.layout_count(axis);
        let mut shares: Vec<i32> = (0..slots.saturating_sub(1))
            .map(|slot| self.axis_child(axis, slot).map_or(0, |c| c.extent(axis)))
            .collect();
        let used = shares.iter().copied().fold(0, i32::saturating_add);
        shares.push(total.saturating_sub(used).max(0));
        shares
    }

    fn hand_out_client_area(&self, width: i32, height: i32) {
        let widths = self.client_shares(Horizontal, width);
        let heights = self.client_shares(Vertical, height);
        tracing::trace!(target: targets::LAYER, ?widths, ?heights, "client area distributed");
        for (y, row) in self.regions.iter().enumerate() {
            for (x, region) in row.iter().enumerate() {
                let command = ClientAreaResizeCommand::new(widths[x], heights[y]);
                region.layer.do_command(&command);
            }
        }
    }

    fn remember_client_area(&self, width: i32, height: i32) {
        *self.client_area.write() = Some((width, height));
    }

    fn distribute_client_area(&self, width: i32, height: i32) {
        self.remember_client_area(width, height);
        self.refresh_client_area();
    }

    /// Hand out the last client area again after a child's extent changed.
    ///
    /// A refresh requested while the area is being handed out does not
    /// recurse; it schedules one more pass once the current one is done.
    pub fn refresh_client_area(&self) {
        if self.distributing.swap(true, Ordering::AcqRel) {
            self.redistribute.store(true, Ordering::Release);
            return;
        }
        for _ in 0..MAX_DISTRIBUTION_PASSES {
            self.redistribute.store(false, Ordering::Release);
            let Some((width, height)) = *self.client_area.read() else {
                break;
            };
            self.hand_out_client_area(width, height);
            if !self.redistribute.load(Ordering::Acquire) {
                break;
            }
        }
        if self.redistribute.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: targets::LAYER, "client area did not settle");
        }
        self.distributing.store(false, Ordering::Release);
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(resize) = command.downcast_ref::<ClientAreaResizeCommand>() {
            self.distribute_client_area(resize.width, resize.height);
            return true;
        }
        if command.is_broadcast() {
            let mut handled = false;
            for child in self.underlying_layers() {
                handled |= child.do_command(command);
            }
            return handled;
        }
        self.regions
            .iter()
            .flatten()
            .any(|region| region.layer.do_command(command))
    }
}

impl Layer for CompositeLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.position_offset(axis, self.layout_count(axis))
    }

    fn preferred_count(&self, axis: Orientation) -> usize {
        (0..self.layout_count(axis))
            .filter_map(|slot| self.axis_child(axis, slot))
            .map(|child| child.preferred_count(axis))
            .sum()
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        let (slot, local) = self.locate(axis, position)?;
        self.axis_child(axis, slot)?.index_by_position(axis, local)
    }

    /// The first position showing `index`, searching the layout slots in order.
    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        (0..self.layout_count(axis)).find_map(|slot| {
            let local = self.axis_child(axis, slot)?.position_by_index(axis, index)?;
            Some(self.position_offset(axis, slot) + local)
        })
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        self.locate(axis, position).map(|(_, local)| local)
    }

    fn underlying_to_local(
        &self,
        axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize> {
        let (x, y) = self.slot_of(source)?;
        let slot = match axis {
            Horizontal => x,
            Vertical => y,
        };
        let last = slot + 1 == self.layout_count(axis);
        let count = self.axis_child(axis, slot)?.count(axis);
        if !last && underlying_position >= count {
            return None;
        }
        Some(self.position_offset(axis, slot) + underlying_position)
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        let mut layers: Vec<Arc<dyn Layer>> = Vec::new();
        for region in self.regions.iter().flatten() {
            if !layers.iter().any(|l| l.id() == region.layer.id()) {
                layers.push(region.layer.clone());
            }
        }
        layers
    }

    fn underlying_layers_by_position(
        &self,
        axis: Orientation,
        position: usize,
    ) -> Vec<Arc<dyn Layer>> {
        let Some((slot, _)) = self.locate(axis, position) else {
            return Vec::new();
        };
        match axis {
            Horizontal => self
                .regions
                .iter()
                .filter_map(|row| row.get(slot))
                .map(|region| region.layer.clone())
                .collect(),
            Vertical => self
                .regions
                .get(slot)
                .map(|row| row.iter().map(|region| region.layer.clone()).collect())
                .unwrap_or_default(),
        }
    }

    fn underlying_layer_by_cell(&self, column: usize, row: usize) -> Option<Arc<dyn Layer>> {
        let (x, _) = self.locate(Horizontal, column)?;
        let (y, _) = self.locate(Vertical, row)?;
        self.child(x, y).cloned()
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.pixel_offset(axis, self.layout_count(axis))
    }

    fn preferred_extent(&self, axis: Orientation) -> i32 {
        (0..self.layout_count(axis))
            .filter_map(|slot| self.axis_child(axis, slot))
            .map(|child| child.preferred_extent(axis))
            .fold(0, i32::saturating_add)
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        match self.locate(axis, position) {
            Some((slot, local)) => self
                .axis_child(axis, slot)
                .map_or(0, |child| child.size_by_position(axis, local)),
            None => 0,
        }
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        let (slot, local) = self.locate(axis, position)?;
        let start = self.axis_child(axis, slot)?.start_pixel_by_position(axis, local)?;
        Some(self.pixel_offset(axis, slot).saturating_add(start))
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        if pixel < 0 {
            return None;
        }
        let mut pixel_offset: i32 = 0;
        let mut position_offset = 0;
        for slot in 0..self.layout_count(axis) {
            let child = self.axis_child(axis, slot)?;
            let extent = child.extent(axis);
            if pixel < pixel_offset.saturating_add(extent) {
                let local = child.position_by_pixel(axis, pixel - pixel_offset)?;
                return Some(position_offset + local);
            }
            pixel_offset = pixel_offset.saturating_add(extent);
            position_offset += child.count(axis);
        }
        None
    }

    fn is_resizable_by_position(&self, axis: Orientation, position: usize) -> bool {
        self.locate(axis, position).is_some_and(|(slot, local)| {
            self.axis_child(axis, slot)
                .is_some_and(|child| child.is_resizable_by_position(axis, local))
        })
    }

    /// The child's labels, then the region label, then this layer's own.
    fn config_labels_by_position(&self, column: usize, row: usize) -> LabelStack {
        let mut labels = match underlying_cell(self, column, row) {
            Some((child, c, r)) => child.config_labels_by_position(c, r),
            None => LabelStack::new(),
        };
        if let Some(label) = self.region_label_by_position(column, row) {
            labels.add_label(label);
        }
        self.base.accumulate_labels(
            &mut labels,
            column,
            row,
            self.index_by_position(Horizontal, column),
            self.index_by_position(Vertical, row),
        );
        labels
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command) || self.handle_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |_| {});
    }

    fn save_state(&self, prefix: &str, properties: &mut crate::persistence::Properties) {
        for region in self.regions.iter().flatten() {
            region
                .layer
                .save_state(&format!("{prefix}.{}", region.label), properties);
        }
    }

    fn load_state(&self, prefix: &str, properties: &crate::persistence::Properties) {
        for region in self.regions.iter().flatten() {
            region
                .layer
                .load_state(&format!("{prefix}.{}", region.label), properties);
        }
    }
}

static_assertions::assert_impl_all!(CompositeLayer: Send, Sync);
