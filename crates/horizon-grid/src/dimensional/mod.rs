//! Layers whose structure along each axis comes from another layer.
//!
//! A column header has its own rows but must follow the body's columns:
//! hiding, reordering, resizing or scrolling body columns changes the header
//! the same way. A [`DimensionallyDependentLayer`] takes its horizontal
//! structure from one layer, its vertical structure from another, and reads
//! cell content from a base layer by index.

use std::sync::{Arc, Weak};

use crate::command::LayerCommand;
use crate::config::{DisplayMode, LabelStack};
use crate::coordinate::Orientation;
use crate::data::CellValue;
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, relay_event};

use Orientation::{Horizontal, Vertical};

/// Takes each axis from a dependency layer and cell content from a base.
pub struct DimensionallyDependentLayer {
    base: LayerBase,
    base_layer: Arc<dyn Layer>,
    dependencies: [Arc<dyn Layer>; 2],
}

impl DimensionallyDependentLayer {
    pub fn new(
        base_layer: Arc<dyn Layer>,
        horizontal: Arc<dyn Layer>,
        vertical: Arc<dyn Layer>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let layer = Self {
                base: LayerBase::new("DimensionallyDependentLayer"),
                base_layer,
                dependencies: [horizontal, vertical],
            };
            let owner: Weak<dyn Layer> = me.clone();
            for underlying in layer.underlying_layers() {
                layer.base.listen_to(owner.clone(), &underlying);
            }
            layer
        })
    }

    /// A column header: columns follow `body`, rows are the header's own.
    pub fn column_header(header: Arc<dyn Layer>, body: Arc<dyn Layer>) -> Arc<Self> {
        Self::new(header.clone(), body, header)
    }

    /// A row header: rows follow `body`, columns are the header's own.
    pub fn row_header(header: Arc<dyn Layer>, body: Arc<dyn Layer>) -> Arc<Self> {
        Self::new(header.clone(), header, body)
    }

    pub fn base_layer(&self) -> &Arc<dyn Layer> {
        &self.base_layer
    }

    pub fn dependency(&self, axis: Orientation) -> &Arc<dyn Layer> {
        &self.dependencies[axis.slot()]
    }

    /// The base layer cell showing a local cell, matched by index.
    fn base_cell(&self, column: usize, row: usize) -> Option<(usize, usize)> {
        let to_base = |axis: Orientation, position: usize| {
            let index = self.index_by_position(axis, position)?;
            self.base_layer.position_by_index(axis, index)
        };
        Some((to_base(Horizontal, column)?, to_base(Vertical, row)?))
    }

    /// Structural events only matter from the layer that provides that axis
    /// (or from the base, which may insert or delete entries).
    fn is_relevant(&self, event: &LayerEvent) -> bool {
        match event.structural_change() {
            Some(change) => {
                event.layer == self.dependency(change.axis).id() || event.layer == self.base_layer.id()
            }
            None => true,
        }
    }
}

impl Layer for DimensionallyDependentLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.dependency(axis).count(axis)
    }

    fn preferred_count(&self, axis: Orientation) -> usize {
        self.dependency(axis).preferred_count(axis)
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        self.dependency(axis).index_by_position(axis, position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        self.dependency(axis).position_by_index(axis, index)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn underlying_to_local(
        &self,
        axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize> {
        let dependency = self.dependency(axis);
        if source == dependency.id() {
            return (underlying_position < dependency.count(axis)).then_some(underlying_position);
        }
        if source == self.base_layer.id() {
            let index = self.base_layer.index_by_position(axis, underlying_position)?;
            return self.position_by_index(axis, index);
        }
        None
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        let mut layers: Vec<Arc<dyn Layer>> = Vec::with_capacity(3);
        for layer in [&self.base_layer, &self.dependencies[0], &self.dependencies[1]] {
            if !layers.iter().any(|l| l.id() == layer.id()) {
                layers.push(layer.clone());
            }
        }
        layers
    }

    fn underlying_layers_by_position(
        &self,
        axis: Orientation,
        _position: usize,
    ) -> Vec<Arc<dyn Layer>> {
        vec![self.dependency(axis).clone()]
    }

    fn underlying_layer_by_cell(&self, _column: usize, _row: usize) -> Option<Arc<dyn Layer>> {
        Some(self.base_layer.clone())
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.dependency(axis).extent(axis)
    }

    fn preferred_extent(&self, axis: Orientation) -> i32 {
        self.dependency(axis).preferred_extent(axis)
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        self.dependency(axis).size_by_position(axis, position)
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        self.dependency(axis).start_pixel_by_position(axis, position)
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        self.dependency(axis).position_by_pixel(axis, pixel)
    }

    fn is_resizable_by_position(&self, axis: Orientation, position: usize) -> bool {
        self.dependency(axis).is_resizable_by_position(axis, position)
    }

    fn data_value_by_position(&self, column: usize, row: usize) -> CellValue {
        match self.base_cell(column, row) {
            Some((c, r)) => self.base_layer.data_value_by_position(c, r),
            None => CellValue::None,
        }
    }

    fn display_mode_by_position(&self, column: usize, row: usize) -> DisplayMode {
        match self.base_cell(column, row) {
            Some((c, r)) => self.base_layer.display_mode_by_position(c, r),
            None => DisplayMode::Normal,
        }
    }

    fn config_labels_by_position(&self, column: usize, row: usize) -> LabelStack {
        let mut labels = match self.base_cell(column, row) {
            Some((c, r)) => self.base_layer.config_labels_by_position(c, r),
            None => LabelStack::new(),
        };
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
        if self.base.do_registered_command(self, command) {
            return true;
        }
        if command.is_broadcast() {
            return self.base_layer.do_command(command);
        }
        self.dependency(Horizontal).do_command(command)
            || self.dependency(Vertical).do_command(command)
            || self.base_layer.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        if self.is_relevant(&event) {
            relay_event(self, event, |_| {});
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DummyDataProvider;
    use crate::data_layer::DataLayer;
    use crate::event::StructuralKind;
    use crate::hide_show::HideShowLayer;
    use parking_lot::Mutex;

    struct Header {
        body: Arc<HideShowLayer>,
        header_data: Arc<DataLayer>,
        header: Arc<DimensionallyDependentLayer>,
    }

    fn column_header() -> Header {
        let body_data = DataLayer::new(Arc::new(DummyDataProvider::new(5, 10)));
        let body = HideShowLayer::new(body_data);
        let header_data = DataLayer::new(Arc::new(DummyDataProvider::new(5, 1)));
        let header = DimensionallyDependentLayer::column_header(header_data.clone(), body.clone());
        Header {
            body,
            header_data,
            header,
        }
    }

    #[test]
    fn test_axes_come_from_dependencies() {
        let h = column_header();
        assert_eq!(h.header.column_count(), 5);
        assert_eq!(h.header.row_count(), 1);
        assert_eq!(h.header.width(), 500);
        assert_eq!(h.header.height(), 20);
    }

    #[test]
    fn test_follows_hidden_body_columns() {
        let h = column_header();
        h.body.hide_positions(Horizontal, &[0]);
        assert_eq!(h.header.column_count(), 4);
        assert_eq!(h.header.column_index_by_position(0), Some(1));
        assert_eq!(h.header.data_value_by_position(0, 0).to_string(), "1,0");
    }

    #[test]
    fn test_relays_column_events_only_from_body() {
        let h = column_header();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        h.header
            .base()
            .add_layer_listener(move |event| sink.lock().push(event.clone()));

        h.body.hide_positions(Horizontal, &[2]);
        h.body.hide_positions(Vertical, &[2]);
        let events = events.lock();
        assert_eq!(events.len(), 1);
        let change = events[0].structural_change().unwrap();
        assert_eq!(change.kind, StructuralKind::Hide);
        assert_eq!(change.axis, Horizontal);
        assert_eq!(events[0].layer, h.header.id());
    }

    #[test]
    fn test_header_resize_reaches_header_data() {
        let h = column_header();
        h.header_data.set_size(Vertical, 0, 35, false);
        assert_eq!(h.header.height(), 35);
    }

    #[test]
    fn test_underlying_layers_are_distinct() {
        let h = column_header();
        assert_eq!(h.header.underlying_layers().len(), 2);
    }
}
