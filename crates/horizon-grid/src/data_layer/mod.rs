//! The bottom of a layer stack.
//!
//! A [`DataLayer`] exposes a [`DataProvider`] with position equal to index on
//! both axes and owns the pixel size of every column and row.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use horizon_grid::data::DummyDataProvider;
//! use horizon_grid::data_layer::DataLayer;
//!
//! let layer = DataLayer::new(Arc::new(DummyDataProvider::new(10, 10)));
//! layer.set_size(Orientation::Horizontal, 3, 150, false);
//! assert_eq!(layer.column_width_by_position(3), 150);
//! ```

mod dpi;
mod size_config;

pub use dpi::{DEFAULT_DPI, DpiConverter, FixedScalingDpiConverter};
pub use size_config::SizeConfig;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};

use crate::command::{
    CellCoordinate, ClientAreaResizeCommand, ConfigureScalingCommand, LayerCommand,
    MultiResizeCommand, PercentageSizingCommand, ResizeCommand, StructuralRefreshCommand,
    VisualRefreshCommand, convert_command,
};
use crate::coordinate::{Orientation, Range};
use crate::data::{CellValue, DataProvider};
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, position_in_starts, prefix_starts};
use crate::persistence::Properties;

/// Column width used when none is configured.
pub const DEFAULT_COLUMN_WIDTH: i32 = 100;
/// Row height used when none is configured.
pub const DEFAULT_ROW_HEIGHT: i32 = 20;

/// Write a value into the data provider.
#[derive(Debug, Clone)]
pub struct UpdateDataCommand {
    pub coordinate: CellCoordinate,
    pub value: CellValue,
}

impl UpdateDataCommand {
    pub fn new(layer: Arc<dyn Layer>, column: usize, row: usize, value: impl Into<CellValue>) -> Self {
        Self {
            coordinate: CellCoordinate::new(layer, column, row),
            value: value.into(),
        }
    }
}

impl LayerCommand for UpdateDataCommand {
    fn convert_to_target_layer(&mut self, target: &dyn Layer) -> bool {
        self.coordinate.convert(target)
    }
}

fn size_key(axis: Orientation) -> &'static str {
    match axis {
        Orientation::Horizontal => "columnWidth",
        Orientation::Vertical => "rowHeight",
    }
}

/// The leaf layer: data access and per-position pixel sizes.
pub struct DataLayer {
    base: LayerBase,
    provider: Arc<dyn DataProvider>,
    sizes: [RwLock<SizeConfig>; 2],
    /// Cached prefix sums per axis.
    starts: [Mutex<Option<Arc<Vec<i32>>>>; 2],
}

impl DataLayer {
    pub fn new(provider: Arc<dyn DataProvider>) -> Arc<Self> {
        Self::with_default_sizes(provider, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT)
    }

    pub fn with_default_sizes(
        provider: Arc<dyn DataProvider>,
        column_width: i32,
        row_height: i32,
    ) -> Arc<Self> {
        Arc::new(Self {
            base: LayerBase::new("DataLayer"),
            provider,
            sizes: [
                RwLock::new(SizeConfig::new(column_width)),
                RwLock::new(SizeConfig::new(row_height)),
            ],
            starts: [Mutex::new(None), Mutex::new(None)],
        })
    }

    pub fn provider(&self) -> &Arc<dyn DataProvider> {
        &self.provider
    }

    /// A copy of the size configuration of `axis`.
    pub fn size_config(&self, axis: Orientation) -> SizeConfig {
        self.sizes[axis.slot()].read().clone()
    }

    // =========================================================================
    // Sizes
    // =========================================================================

    /// Resize one position and fire a resize event.
    pub fn set_size(&self, axis: Orientation, position: usize, size: i32, downscale: bool) {
        self.set_sizes(axis, &[(position, size)], downscale);
    }

    fn set_sizes(&self, axis: Orientation, resizes: &[(usize, i32)], downscale: bool) {
        let count = self.count(axis);
        let positions: Vec<usize> = resizes
            .iter()
            .map(|&(position, _)| position)
            .filter(|&position| position < count)
            .collect();
        if positions.is_empty() {
            return;
        }
        {
            let mut sizes = self.sizes[axis.slot()].write();
            for &(position, size) in resizes.iter().filter(|(p, _)| *p < count) {
                sizes.set_size(position, size, downscale);
            }
        }
        self.invalidate(axis);
        tracing::debug!(target: targets::LAYER, axis = axis.noun(), ?positions, downscale, "resized");
        self.fire_layer_event(LayerEvent::resize(self.id(), axis, &positions));
    }

    pub fn set_default_size(&self, axis: Orientation, size: i32) {
        self.sizes[axis.slot()].write().set_default_size(size);
        self.refresh_axis(axis);
    }

    pub fn set_position_resizable(&self, axis: Orientation, position: usize, resizable: bool) {
        self.sizes[axis.slot()]
            .write()
            .set_position_resizable(position, resizable);
    }

    pub fn set_resizable_by_default(&self, axis: Orientation, resizable: bool) {
        self.sizes[axis.slot()]
            .write()
            .set_resizable_by_default(resizable);
    }

    pub fn set_percentage_sizing(&self, axis: Orientation, enabled: bool) {
        self.sizes[axis.slot()].write().set_percentage_sizing(enabled);
        self.refresh_axis(axis);
    }

    pub fn set_percentage(&self, axis: Orientation, position: usize, percentage: f64) {
        self.sizes[axis.slot()]
            .write()
            .set_percentage(position, percentage);
        self.refresh_axis(axis);
    }

    pub fn set_dpi_converter(&self, axis: Orientation, converter: Option<Arc<dyn DpiConverter>>) {
        self.sizes[axis.slot()].write().set_dpi_converter(converter);
        self.refresh_axis(axis);
    }

    /// Make percentage sizes fill `space` pixels along `axis`.
    fn set_available_space(&self, axis: Orientation, space: i32) -> bool {
        let count = self.count(axis);
        {
            let mut sizes = self.sizes[axis.slot()].write();
            if !sizes.is_percentage_sizing() {
                return false;
            }
            if sizes.available_space() == space {
                return true;
            }
            sizes.calculate_percentages(space, count);
        }
        self.clear_starts(axis);
        let positions: Vec<usize> = (0..count).collect();
        self.fire_layer_event(LayerEvent::resize(self.id(), axis, &positions));
        true
    }

    // =========================================================================
    // Data changes
    // =========================================================================

    /// The provider gained entries at `range` along `axis`.
    pub fn positions_inserted(&self, axis: Orientation, range: Range) {
        if range.is_empty() {
            return;
        }
        self.sizes[axis.slot()].write().insert_positions(range);
        self.invalidate(axis);
        self.fire_layer_event(LayerEvent::insert(self.id(), axis, range));
    }

    /// The provider lost the entries at `range` along `axis`.
    pub fn positions_deleted(&self, axis: Orientation, range: Range) {
        if range.is_empty() {
            return;
        }
        self.sizes[axis.slot()].write().delete_positions(range);
        self.invalidate(axis);
        self.fire_layer_event(LayerEvent::delete(self.id(), axis, range));
    }

    /// Recompute everything from the provider.
    pub fn refresh(&self) {
        for axis in Orientation::ALL {
            self.invalidate(axis);
        }
        self.fire_layer_event(LayerEvent::structural_refresh(self.id()));
    }

    fn refresh_axis(&self, axis: Orientation) {
        self.invalidate(axis);
        self.fire_layer_event(LayerEvent::axis_refresh(self.id(), axis, self.count(axis)));
    }

    // =========================================================================
    // Caches
    // =========================================================================

    fn invalidate(&self, axis: Orientation) {
        let count = self.count(axis);
        {
            let mut sizes = self.sizes[axis.slot()].write();
            if sizes.is_percentage_sizing() {
                let space = sizes.available_space();
                sizes.calculate_percentages(space, count);
            }
        }
        self.clear_starts(axis);
    }

    fn clear_starts(&self, axis: Orientation) {
        *self.starts[axis.slot()].lock() = None;
    }

    fn starts(&self, axis: Orientation) -> Arc<Vec<i32>> {
        let mut cache = self.starts[axis.slot()].lock();
        if let Some(starts) = cache.as_ref() {
            return starts.clone();
        }
        let _span = PerfSpan::new(span_names::CACHE_REBUILD);
        let count = self.count(axis);
        let starts = {
            let sizes = self.sizes[axis.slot()].read();
            Arc::new(prefix_starts((0..count).map(|position| sizes.size(position))))
        };
        *cache = Some(starts.clone());
        starts
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(command) = convert_command::<ResizeCommand>(command, self) {
            self.set_size(command.axis, command.position(), command.size, command.downscale);
            return true;
        }
        if let Some(command) = convert_command::<MultiResizeCommand>(command, self) {
            self.set_sizes(command.axis, &command.resizes(), command.downscale);
            return true;
        }
        if let Some(command) = convert_command::<UpdateDataCommand>(command, self) {
            let coordinate = &command.coordinate;
            return match self.provider.set_data_value(
                coordinate.column,
                coordinate.row,
                command.value.clone(),
            ) {
                Ok(()) => {
                    self.fire_layer_event(LayerEvent::cell_changed(
                        self.id(),
                        coordinate.column,
                        coordinate.row,
                    ));
                    true
                }
                Err(err) => {
                    tracing::warn!(target: targets::LAYER, error = %err, "data update rejected");
                    false
                }
            };
        }
        if let Some(command) = command.downcast_ref::<ClientAreaResizeCommand>() {
            let mut handled = false;
            for axis in Orientation::ALL {
                handled |= self.set_available_space(axis, command.extent(axis));
            }
            return handled;
        }
        if let Some(command) = command.downcast_ref::<ConfigureScalingCommand>() {
            for axis in Orientation::ALL {
                self.sizes[axis.slot()]
                    .write()
                    .set_dpi_converter(Some(command.converter(axis).clone()));
                self.invalidate(axis);
            }
            self.fire_layer_event(LayerEvent::structural_refresh(self.id()));
            return true;
        }
        if let Some(command) = command.downcast_ref::<PercentageSizingCommand>() {
            self.set_percentage_sizing(command.axis, command.enabled);
            return true;
        }
        if command.is::<StructuralRefreshCommand>() {
            self.refresh();
            return true;
        }
        if command.is::<VisualRefreshCommand>() {
            self.fire_layer_event(LayerEvent::visual_refresh(self.id()));
            return true;
        }
        false
    }
}

impl Layer for DataLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        match axis {
            Orientation::Horizontal => self.provider.column_count(),
            Orientation::Vertical => self.provider.row_count(),
        }
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        (index < self.count(axis)).then_some(index)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn underlying_to_local(
        &self,
        _axis: Orientation,
        _source: LayerId,
        _position: usize,
    ) -> Option<usize> {
        None
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        Vec::new()
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.starts(axis).last().copied().unwrap_or(0)
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        if position >= self.count(axis) {
            return 0;
        }
        self.sizes[axis.slot()].read().size(position)
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        let starts = self.starts(axis);
        (position + 1 < starts.len()).then(|| starts[position])
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        position_in_starts(&self.starts(axis), pixel)
    }

    fn is_resizable_by_position(&self, axis: Orientation, position: usize) -> bool {
        position < self.count(axis) && self.sizes[axis.slot()].read().is_position_resizable(position)
    }

    fn data_value_by_position(&self, column: usize, row: usize) -> CellValue {
        if column >= self.column_count() || row >= self.row_count() {
            return CellValue::None;
        }
        self.provider.data_value(column, row)
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command) || self.handle_command(command)
    }

    fn handle_layer_event(&self, _event: LayerEvent) {}

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for axis in Orientation::ALL {
            self.sizes[axis.slot()]
                .read()
                .save_state(&format!("{prefix}.{}", size_key(axis)), properties);
        }
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        for axis in Orientation::ALL {
            self.sizes[axis.slot()]
                .write()
                .load_state(&format!("{prefix}.{}", size_key(axis)), properties);
        }
        tracing::debug!(target: targets::PERSISTENCE, prefix, "data layer state loaded");
        self.refresh();
    }
}

static_assertions::assert_impl_all!(DataLayer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DummyDataProvider, ListDataProvider};
    use Orientation::{Horizontal, Vertical};

    fn layer(columns: usize, rows: usize) -> Arc<DataLayer> {
        DataLayer::new(Arc::new(DummyDataProvider::new(columns, rows)))
    }

    fn record(layer: &DataLayer) -> Arc<Mutex<Vec<LayerEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        layer
            .base()
            .add_layer_listener(move |event| sink.lock().push(event.clone()));
        events
    }

    #[test]
    fn test_identity_mapping() {
        let layer = layer(5, 3);
        assert_eq!(layer.column_count(), 5);
        assert_eq!(layer.row_count(), 3);
        assert_eq!(layer.column_index_by_position(4), Some(4));
        assert_eq!(layer.column_index_by_position(5), None);
        assert_eq!(layer.row_position_by_index(2), Some(2));
        assert_eq!(layer.data_value_by_position(1, 2), CellValue::from("1,2"));
    }

    #[test]
    fn test_geometry() {
        let layer = layer(5, 3);
        assert_eq!(layer.width(), 500);
        assert_eq!(layer.height(), 60);
        assert_eq!(layer.start_x_of_column_position(2), Some(200));
        assert_eq!(layer.start_x_of_column_position(5), None);
        assert_eq!(layer.column_position_by_x(250), Some(2));
        assert_eq!(layer.column_position_by_x(500), None);
        assert_eq!(layer.row_position_by_y(59), Some(2));
    }

    #[test]
    fn test_resize_fires_event_and_invalidates() {
        let layer = layer(5, 3);
        let events = record(&layer);
        layer.set_size(Horizontal, 1, 40, false);
        assert_eq!(layer.width(), 440);
        assert_eq!(layer.start_x_of_column_position(2), Some(140));
        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind_name(), "resize");
    }

    #[test]
    fn test_resize_command() {
        let layer = layer(10, 10);
        let top: Arc<dyn Layer> = layer.clone();
        assert!(layer.do_command(&ResizeCommand::new(Horizontal, top, 3, 150)));
        assert_eq!(layer.column_width_by_position(3), 150);
        assert_eq!(layer.column_width_by_position(2), 100);
    }

    #[test]
    fn test_resize_command_out_of_range_is_ignored() {
        let layer = layer(2, 2);
        let top: Arc<dyn Layer> = layer.clone();
        assert!(!layer.do_command(&ResizeCommand::new(Horizontal, top, 7, 150)));
    }

    #[test]
    fn test_configure_scaling_command() {
        let layer = layer(4, 4);
        let converter: Arc<dyn DpiConverter> = Arc::new(FixedScalingDpiConverter::new(120.0));
        assert!(layer.do_command(&ConfigureScalingCommand::new(converter.clone(), converter)));
        assert_eq!(layer.column_width_by_position(0), 125);
        assert_eq!(layer.row_height_by_position(0), 25);
        assert_eq!(layer.width(), 500);
    }

    #[test]
    fn test_percentage_sizing_follows_client_area() {
        let layer = layer(4, 2);
        assert!(layer.do_command(&PercentageSizingCommand::new(Horizontal, true)));
        assert!(layer.do_command(&ClientAreaResizeCommand::new(500, 300)));
        assert_eq!(layer.column_width_by_position(0), 125);
        assert!(layer.do_command(&ClientAreaResizeCommand::new(1000, 300)));
        assert_eq!(layer.column_width_by_position(3), 250);
        assert_eq!(layer.width(), 1000);
        // Rows keep fixed sizes.
        assert_eq!(layer.height(), 40);
    }

    #[test]
    fn test_percentage_resize_before_client_area_is_kept() {
        let layer = layer(4, 2);
        let top: Arc<dyn Layer> = layer.clone();
        assert!(layer.do_command(&PercentageSizingCommand::new(Horizontal, true)));
        assert!(layer.do_command(&ResizeCommand::new(Horizontal, top, 0, 200)));

        assert!(layer.do_command(&ClientAreaResizeCommand::new(500, 300)));
        assert_eq!(layer.column_width_by_position(0), 200);
        assert_eq!(layer.column_width_by_position(1), 100);
        assert_eq!(layer.width(), 500);

        assert!(layer.do_command(&ClientAreaResizeCommand::new(1000, 300)));
        assert_eq!(layer.column_width_by_position(0), 400);
    }

    #[test]
    fn test_update_data_command() {
        let provider = Arc::new(ListDataProvider::from_fn(2, 2, |c, r| {
            CellValue::from((c * 10 + r) as i64)
        }));
        let layer = DataLayer::new(provider);
        let events = record(&layer);
        let top: Arc<dyn Layer> = layer.clone();
        assert!(layer.do_command(&UpdateDataCommand::new(top, 1, 0, "new")));
        assert_eq!(layer.data_value_by_position(1, 0), CellValue::from("new"));
        assert_eq!(events.lock()[0], LayerEvent::cell_changed(layer.id(), 1, 0));
    }

    #[test]
    fn test_update_read_only_provider_is_not_handled() {
        let layer = layer(2, 2);
        let top: Arc<dyn Layer> = layer.clone();
        assert!(!layer.do_command(&UpdateDataCommand::new(top, 1, 0, "new")));
    }

    #[test]
    fn test_unknown_command_is_not_handled() {
        #[derive(Debug, Clone)]
        struct Unknown;
        impl LayerCommand for Unknown {
            fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
                true
            }
        }
        assert!(!layer(1, 1).do_command(&Unknown));
    }

    #[test]
    fn test_insert_shifts_sizes() {
        let provider = Arc::new(ListDataProvider::from_fn(1, 3, |_, r| CellValue::from(r as i64)));
        let layer = DataLayer::new(provider.clone());
        layer.set_size(Vertical, 2, 50, false);
        provider.insert_row(0, vec![CellValue::from("x")]);
        layer.positions_inserted(Vertical, Range::single(0));
        assert_eq!(layer.row_count(), 4);
        assert_eq!(layer.row_height_by_position(3), 50);
        assert_eq!(layer.height(), 110);
    }

    #[test]
    fn test_save_and_load_state() {
        let original = layer(5, 5);
        original.set_size(Horizontal, 1, 42, false);
        original.set_size(Vertical, 4, 33, false);
        let mut properties = Properties::new();
        original.save_state("grid", &mut properties);

        let restored = layer(5, 5);
        restored.load_state("grid", &properties);
        assert_eq!(restored.column_width_by_position(1), 42);
        assert_eq!(restored.row_height_by_position(4), 33);
    }
}
