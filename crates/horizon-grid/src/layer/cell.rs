use crate::config::{DisplayMode, LabelStack};
use crate::coordinate::Rectangle;
use crate::data::CellValue;

/// A snapshot of one cell of a layer, as consumed by renderers and editors.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCell {
    pub column_position: usize,
    pub row_position: usize,
    pub column_index: usize,
    pub row_index: usize,
    /// Pixel bounds in the layer's coordinate space.
    pub bounds: Rectangle,
    pub display_mode: DisplayMode,
    pub labels: LabelStack,
    pub value: CellValue,
}

impl LayerCell {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.has_label(label)
    }
}
