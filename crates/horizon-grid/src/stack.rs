//! Ready-made layer stacks.
//!
//! [`BodyLayerStack`] assembles the usual body transforms over a data
//! provider and [`GridLayerStack`] puts headers and a corner around it.
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::data::DummyDataProvider;
//! use horizon_grid::layer::Layer;
//! use horizon_grid::stack::BodyLayerStack;
//! use horizon_grid::coordinate::Orientation;
//!
//! let body = BodyLayerStack::new(Arc::new(DummyDataProvider::new(20, 1000)));
//! body.hide().hide_positions(Orientation::Horizontal, &[0]);
//! assert_eq!(body.top().column_count(), 19);
//! ```

use std::sync::Arc;

use crate::composite::{CompositeFreezeLayer, CompositeLayer};
use crate::data::{DataProvider, ListDataProvider};
use crate::data_layer::{DEFAULT_ROW_HEIGHT, DataLayer};
use crate::dimensional::DimensionallyDependentLayer;
use crate::freeze::FreezeLayer;
use crate::hide_show::HideShowLayer;
use crate::layer::Layer;
use crate::reorder::ReorderLayer;
use crate::selection::SelectionLayer;
use crate::tree::{TreeLayer, TreeRowModel};
use crate::viewport::ViewportLayer;

/// Default width of the row header column.
pub const ROW_HEADER_WIDTH: i32 = 40;

/// data → reorder → hide/show → (tree) → selection → freeze/viewport.
pub struct BodyLayerStack {
    data: Arc<DataLayer>,
    reorder: Arc<ReorderLayer>,
    hide: Arc<HideShowLayer>,
    tree: Option<Arc<TreeLayer>>,
    selection: Arc<SelectionLayer>,
    freeze: CompositeFreezeLayer,
}

impl BodyLayerStack {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self::build(DataLayer::new(provider), None)
    }

    /// A body whose rows form a tree.
    pub fn with_tree(provider: Arc<dyn DataProvider>, model: Arc<TreeRowModel>) -> Self {
        Self::build(DataLayer::new(provider), Some(model))
    }

    fn build(data: Arc<DataLayer>, model: Option<Arc<TreeRowModel>>) -> Self {
        let reorder = ReorderLayer::new(data.clone());
        let hide = HideShowLayer::new(reorder.clone());
        let tree = model.map(|model| TreeLayer::new(hide.clone(), model));
        let below_selection: Arc<dyn Layer> = match &tree {
            Some(tree) => tree.clone(),
            None => hide.clone(),
        };
        let selection = SelectionLayer::new(below_selection);
        let freeze = CompositeFreezeLayer::new(selection.clone());
        Self {
            data,
            reorder,
            hide,
            tree,
            selection,
            freeze,
        }
    }

    pub fn data(&self) -> &Arc<DataLayer> {
        &self.data
    }

    pub fn reorder(&self) -> &Arc<ReorderLayer> {
        &self.reorder
    }

    pub fn hide(&self) -> &Arc<HideShowLayer> {
        &self.hide
    }

    pub fn tree(&self) -> Option<&Arc<TreeLayer>> {
        self.tree.as_ref()
    }

    pub fn selection(&self) -> &Arc<SelectionLayer> {
        &self.selection
    }

    pub fn freeze(&self) -> &CompositeFreezeLayer {
        &self.freeze
    }

    pub fn freeze_layer(&self) -> &Arc<FreezeLayer> {
        self.freeze.freeze_layer()
    }

    pub fn viewport(&self) -> &Arc<ViewportLayer> {
        self.freeze.viewport()
    }

    pub fn top(&self) -> Arc<dyn Layer> {
        self.freeze.layer().clone()
    }
}

impl std::fmt::Debug for BodyLayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyLayerStack")
            .field("top", &self.top())
            .field("tree", &self.tree.is_some())
            .finish()
    }
}

/// A body with column header, row header and corner regions.
pub struct GridLayerStack {
    body: BodyLayerStack,
    column_header: Arc<DimensionallyDependentLayer>,
    row_header: Arc<DimensionallyDependentLayer>,
    grid: Arc<CompositeLayer>,
}

impl GridLayerStack {
    /// Headers read from their own providers: one row of column labels and
    /// one column of row labels, indexed like the body.
    pub fn new(
        body: BodyLayerStack,
        column_header: Arc<dyn DataProvider>,
        row_header: Arc<dyn DataProvider>,
    ) -> Self {
        let top = body.top();
        let column_header = DimensionallyDependentLayer::column_header(
            DataLayer::new(column_header),
            top.clone(),
        );
        let row_header = DimensionallyDependentLayer::row_header(
            DataLayer::with_default_sizes(row_header, ROW_HEADER_WIDTH, DEFAULT_ROW_HEIGHT),
            top.clone(),
        );
        let corner_data = DataLayer::with_default_sizes(
            Arc::new(ListDataProvider::new(1, vec![Vec::new()])),
            ROW_HEADER_WIDTH,
            DEFAULT_ROW_HEIGHT,
        );
        let corner = DimensionallyDependentLayer::new(
            corner_data,
            row_header.clone(),
            column_header.clone(),
        );
        let grid = CompositeLayer::grid(top, column_header.clone(), row_header.clone(), corner);
        Self {
            body,
            column_header,
            row_header,
            grid,
        }
    }

    pub fn body(&self) -> &BodyLayerStack {
        &self.body
    }

    pub fn column_header(&self) -> &Arc<DimensionallyDependentLayer> {
        &self.column_header
    }

    pub fn row_header(&self) -> &Arc<DimensionallyDependentLayer> {
        &self.row_header
    }

    pub fn grid(&self) -> &Arc<CompositeLayer> {
        &self.grid
    }
}

impl std::fmt::Debug for GridLayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridLayerStack")
            .field("body", &self.body)
            .finish()
    }
}
