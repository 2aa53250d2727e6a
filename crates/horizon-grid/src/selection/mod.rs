//! Cell, column and row selection.
//!
//! A [`SelectionLayer`] passes positions through unchanged and keeps a
//! [`SelectionModel`] of selected cells in its own positions, an anchor (the
//! cell a shift-selection extends from) and the last selected cell (where a
//! move continues from). Selected cells are shown in [`DisplayMode::Select`].
//!
//! Gestures follow the usual conventions: a plain click selects one cell,
//! shift extends a block from the anchor, ctrl toggles a cell and keeps the
//! rest, shift+ctrl adds a block.

mod command;
mod model;
mod traversal;

pub use command::{
    ClearAllSelectionsCommand, Modifiers, MoveSelectionCommand, SelectAllCommand,
    SelectCellCommand, SelectColumnCommand, SelectRowsCommand,
};
pub use model::{CellRegion, CellSelectionModel, RowSelectionModel, SelectionModel};
pub use traversal::{MoveDirection, TraversalScope, TraversalStrategy};

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use horizon_grid_core::logging::targets;

use crate::command::{LayerCommand, convert_command};
use crate::config::labels::{SELECT, SELECTION_ANCHOR};
use crate::config::{DisplayMode, LabelStack};
use crate::coordinate::{CellPosition, Orientation, Range, RangeList};
use crate::event::{LayerEvent, SelectionChange, SelectionKind};
use crate::layer::{Layer, LayerBase, LayerId, relay_event};
use crate::persistence::Properties;

use Orientation::{Horizontal, Vertical};

const ANCHOR_KEY: &str = "selectionAnchor";

#[derive(Debug)]
struct State {
    model: Box<dyn SelectionModel>,
    anchor: Option<CellPosition>,
    last_selected: Option<CellPosition>,
}

/// Tracks the selection over its underlying layer's positions.
pub struct SelectionLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    state: Mutex<State>,
    strategy: RwLock<TraversalStrategy>,
}

impl SelectionLayer {
    /// A selection layer with a [`CellSelectionModel`].
    pub fn new(underlying: Arc<dyn Layer>) -> Arc<Self> {
        Self::with_model(underlying, Box::new(CellSelectionModel::new()))
    }

    pub fn with_model(underlying: Arc<dyn Layer>, model: Box<dyn SelectionModel>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("SelectionLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            Self {
                base,
                underlying,
                state: Mutex::new(State {
                    model,
                    anchor: None,
                    last_selected: None,
                }),
                strategy: RwLock::new(TraversalStrategy::default()),
            }
        })
    }

    pub fn traversal_strategy(&self) -> TraversalStrategy {
        *self.strategy.read()
    }

    /// The strategy used by moves that do not name one.
    pub fn set_traversal_strategy(&self, strategy: TraversalStrategy) {
        *self.strategy.write() = strategy;
    }

    fn bounds(&self) -> CellRegion {
        CellRegion::new(
            Range::new(0, self.count(Horizontal)),
            Range::new(0, self.count(Vertical)),
        )
    }

    fn contains_cell(&self, cell: CellPosition) -> bool {
        cell.column < self.count(Horizontal) && cell.row < self.count(Vertical)
    }

    fn fire_selection(&self, kind: SelectionKind, region: CellRegion, reveal: Option<CellPosition>) {
        let change = SelectionChange {
            kind,
            columns: vec![region.columns],
            rows: vec![region.rows],
            reveal,
        };
        tracing::trace!(target: targets::SELECTION, ?kind, ?region, "selection changed");
        self.fire_layer_event(LayerEvent::selection(self.id(), change));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn anchor(&self) -> Option<CellPosition> {
        self.state.lock().anchor
    }

    pub fn last_selected(&self) -> Option<CellPosition> {
        self.state.lock().last_selected
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().model.is_empty()
    }

    pub fn is_cell_selected(&self, column: usize, row: usize) -> bool {
        self.state.lock().model.is_cell_selected(column, row)
    }

    /// Selected regions within the layer bounds.
    pub fn selected_regions(&self) -> Vec<CellRegion> {
        let bounds = self.bounds();
        self.state.lock().model.selected_regions(bounds)
    }

    /// Selected cells in row-major order.
    pub fn selected_cells(&self) -> Vec<CellPosition> {
        let mut cells: Vec<CellPosition> = self
            .selected_regions()
            .iter()
            .flat_map(|region| {
                region.rows.members().flat_map(move |row| {
                    region.columns.members().map(move |column| CellPosition::new(column, row))
                })
            })
            .collect();
        cells.sort_unstable_by_key(|cell| (cell.row, cell.column));
        cells.dedup();
        cells
    }

    /// Positions along `axis` with at least one selected cell.
    pub fn selected_positions(&self, axis: Orientation) -> Vec<Range> {
        let list = RangeList::from_ranges(self.selected_regions().iter().map(|region| match axis {
            Horizontal => region.columns,
            Vertical => region.rows,
        }));
        list.ranges().to_vec()
    }

    /// Columns (or rows) selected in every row (or column).
    pub fn fully_selected_positions(&self, axis: Orientation) -> Vec<usize> {
        let bounds = self.bounds();
        let state = self.state.lock();
        let candidates: Vec<usize> = RangeList::from_ranges(
            state
                .model
                .selected_regions(bounds)
                .iter()
                .map(|region| match axis {
                    Horizontal => region.columns,
                    Vertical => region.rows,
                }),
        )
        .values()
        .collect();
        candidates
            .into_iter()
            .filter(|&position| match axis {
                Horizontal => state.model.is_column_fully_selected(position, bounds.rows),
                Vertical => state.model.is_row_fully_selected(position, bounds.columns),
            })
            .collect()
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    pub fn select_cell(&self, column: usize, row: usize, modifiers: Modifiers) {
        let cell = CellPosition::new(column, row);
        if !self.contains_cell(cell) {
            return;
        }
        let bounds = self.bounds();
        let affected = {
            let mut state = self.state.lock();
            match (modifiers, state.anchor) {
                (Modifiers { shift: true, ctrl }, Some(anchor)) => {
                    if !ctrl {
                        state.model.clear();
                    }
                    let region = CellRegion::spanning(anchor, cell);
                    state.model.add_selection(region);
                    state.last_selected = Some(cell);
                    if ctrl { region } else { bounds }
                }
                (Modifiers { shift: false, ctrl: true }, _) => {
                    let region = CellRegion::cell(cell);
                    if state.model.is_cell_selected(column, row) {
                        state.model.remove_selection(region);
                    } else {
                        state.model.add_selection(region);
                    }
                    state.anchor = Some(cell);
                    state.last_selected = Some(cell);
                    region
                }
                _ => {
                    state.model.clear();
                    state.model.add_selection(CellRegion::cell(cell));
                    state.anchor = Some(cell);
                    state.last_selected = Some(cell);
                    bounds
                }
            }
        };
        self.fire_selection(SelectionKind::Cells, affected, Some(cell));
    }

    /// Select whole columns, extending from the anchor with shift.
    pub fn select_column(&self, column: usize, modifiers: Modifiers) {
        self.select_lines(Horizontal, &[column], modifiers);
    }

    /// Select whole rows; the last row becomes the anchor row.
    pub fn select_rows(&self, rows: &[usize], modifiers: Modifiers) {
        self.select_lines(Vertical, rows, modifiers);
    }

    fn select_lines(&self, axis: Orientation, positions: &[usize], modifiers: Modifiers) {
        let count = self.count(axis);
        let positions: Vec<usize> = positions.iter().copied().filter(|&p| p < count).collect();
        let Some(&last) = positions.last() else {
            return;
        };
        let bounds = self.bounds();
        let line = |range: Range| match axis {
            Horizontal => CellRegion::new(range, bounds.rows),
            Vertical => CellRegion::new(bounds.columns, range),
        };
        let focus = CellPosition::default().with(axis, last);
        {
            let mut state = self.state.lock();
            let anchor = state.anchor;
            match anchor {
                Some(anchor) if modifiers.shift => {
                    if !modifiers.ctrl {
                        state.model.clear();
                    }
                    let from = anchor.along(axis);
                    let span = Range::new(from.min(last), from.max(last) + 1);
                    state.model.add_selection(line(span));
                }
                _ => {
                    if !modifiers.ctrl {
                        state.model.clear();
                    }
                    for &position in &positions {
                        let region = line(Range::single(position));
                        let selected = match axis {
                            Horizontal => state.model.is_column_fully_selected(position, bounds.rows),
                            Vertical => state.model.is_row_fully_selected(position, bounds.columns),
                        };
                        if modifiers.ctrl && selected {
                            state.model.remove_selection(region);
                        } else {
                            state.model.add_selection(region);
                        }
                    }
                    state.anchor = Some(focus);
                }
            }
            state.last_selected = Some(focus);
        }
        let kind = match axis {
            Horizontal => SelectionKind::Columns,
            Vertical => SelectionKind::Rows,
        };
        self.fire_selection(kind, bounds, Some(focus));
    }

    pub fn select_all(&self) {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.model.add_selection(bounds);
            if state.anchor.is_none() {
                state.anchor = Some(CellPosition::default());
            }
            if state.last_selected.is_none() {
                state.last_selected = state.anchor;
            }
        }
        self.fire_selection(SelectionKind::All, bounds, None);
    }

    pub fn clear_selection(&self) {
        let bounds = self.bounds();
        {
            let mut state = self.state.lock();
            state.model.clear();
            state.anchor = None;
            state.last_selected = None;
        }
        self.fire_selection(SelectionKind::Cleared, bounds, None);
    }

    /// Move from the last selected cell. Without a selection the first cell
    /// is selected.
    pub fn move_selection(
        &self,
        direction: MoveDirection,
        step: usize,
        modifiers: Modifiers,
        strategy: Option<TraversalStrategy>,
    ) {
        let from = {
            let state = self.state.lock();
            state.last_selected.or(state.anchor)
        };
        let Some(from) = from else {
            self.select_cell(0, 0, Modifiers::NONE);
            return;
        };
        let strategy = strategy.unwrap_or_else(|| self.traversal_strategy());
        let next = strategy.next(
            from,
            direction,
            step,
            self.count(Horizontal),
            self.count(Vertical),
        );
        if let Some(next) = next {
            let modifiers = Modifiers::new(modifiers.shift, false);
            self.select_cell(next.column, next.row, modifiers);
        }
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(command) = convert_command::<SelectCellCommand>(command, self) {
            let cell = command.coordinate.cell();
            self.select_cell(cell.column, cell.row, command.modifiers);
            return true;
        }
        if let Some(command) = convert_command::<SelectColumnCommand>(command, self) {
            self.select_column(command.column.position, command.modifiers);
            return true;
        }
        if let Some(command) = convert_command::<SelectRowsCommand>(command, self) {
            self.select_rows(&command.rows(), command.modifiers);
            return true;
        }
        if command.is::<SelectAllCommand>() {
            self.select_all();
            return true;
        }
        if command.is::<ClearAllSelectionsCommand>() {
            self.clear_selection();
            return true;
        }
        if let Some(command) = command.downcast_ref::<MoveSelectionCommand>() {
            self.move_selection(command.direction, command.step, command.modifiers, command.strategy);
            return true;
        }
        false
    }
}

impl Layer for SelectionLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.underlying.count(axis)
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        self.underlying.index_by_position(axis, position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        self.underlying.position_by_index(axis, index)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        (position < self.count(axis)).then_some(position)
    }

    fn underlying_to_local(
        &self,
        _axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize> {
        (source == self.underlying.id()).then_some(underlying_position)
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        self.underlying.extent(axis)
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        self.underlying.size_by_position(axis, position)
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        self.underlying.start_pixel_by_position(axis, position)
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        self.underlying.position_by_pixel(axis, pixel)
    }

    fn display_mode_by_position(&self, column: usize, row: usize) -> DisplayMode {
        let mode = self.underlying.display_mode_by_position(column, row);
        if !self.is_cell_selected(column, row) {
            return mode;
        }
        match mode {
            DisplayMode::Hover | DisplayMode::SelectHover => DisplayMode::SelectHover,
            _ => DisplayMode::Select,
        }
    }

    fn config_labels_by_position(&self, column: usize, row: usize) -> LabelStack {
        let mut labels = self.underlying.config_labels_by_position(column, row);
        self.base.accumulate_labels(
            &mut labels,
            column,
            row,
            self.index_by_position(Horizontal, column),
            self.index_by_position(Vertical, row),
        );
        let (selected, anchor) = {
            let state = self.state.lock();
            (state.model.is_cell_selected(column, row), state.anchor)
        };
        if selected {
            labels.add_label_on_top(SELECT);
        }
        if anchor == Some(CellPosition::new(column, row)) {
            labels.add_label_on_top(SELECTION_ANCHOR);
        }
        labels
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command)
            || self.handle_command(command)
            || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        relay_event(self, event, |event| {
            if Orientation::ALL.iter().any(|&axis| event.changes_positions(axis)) {
                let mut state = self.state.lock();
                if !state.model.is_empty() || state.anchor.is_some() {
                    tracing::debug!(target: targets::SELECTION, "selection cleared by structural change");
                }
                state.model.clear();
                state.anchor = None;
                state.last_selected = None;
            }
        });
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.underlying.save_state(prefix, properties);
        let key = format!("{prefix}.{ANCHOR_KEY}");
        match self.anchor() {
            Some(anchor) => properties.set_list(key, [anchor.column, anchor.row]),
            None => {
                properties.remove(&key);
            }
        }
    }

    fn load_state(&self, prefix: &str, properties: &Properties) {
        self.underlying.load_state(prefix, properties);
        let anchor = properties
            .list::<usize>(&format!("{prefix}.{ANCHOR_KEY}"))
            .and_then(|values| match values[..] {
                [column, row] => Some(CellPosition::new(column, row)),
                _ => None,
            })
            .filter(|&cell| self.contains_cell(cell));
        let mut state = self.state.lock();
        state.anchor = anchor;
        state.last_selected = anchor;
    }
}

static_assertions::assert_impl_all!(SelectionLayer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DummyDataProvider;
    use crate::data_layer::DataLayer;
    use crate::hide_show::HideShowLayer;
    use crate::viewport::ViewportLayer;

    fn layer(columns: usize, rows: usize) -> Arc<SelectionLayer> {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(columns, rows)));
        SelectionLayer::new(data)
    }

    #[test]
    fn test_plain_click_replaces_selection() {
        let s = layer(5, 5);
        s.select_cell(1, 1, Modifiers::NONE);
        s.select_cell(2, 3, Modifiers::NONE);
        assert_eq!(s.selected_cells(), vec![CellPosition::new(2, 3)]);
        assert_eq!(s.anchor(), Some(CellPosition::new(2, 3)));
        assert_eq!(s.display_mode_by_position(2, 3), DisplayMode::Select);
        assert_eq!(s.display_mode_by_position(1, 1), DisplayMode::Normal);
    }

    #[test]
    fn test_shift_extends_from_anchor() {
        let s = layer(5, 5);
        s.select_cell(1, 1, Modifiers::NONE);
        s.select_cell(2, 2, Modifiers::SHIFT);
        assert_eq!(s.selected_cells().len(), 4);
        s.select_cell(0, 1, Modifiers::SHIFT);
        assert_eq!(
            s.selected_cells(),
            vec![CellPosition::new(0, 1), CellPosition::new(1, 1)]
        );
        assert_eq!(s.anchor(), Some(CellPosition::new(1, 1)));
        assert_eq!(s.last_selected(), Some(CellPosition::new(0, 1)));
    }

    #[test]
    fn test_ctrl_toggles() {
        let s = layer(5, 5);
        s.select_cell(0, 0, Modifiers::NONE);
        s.select_cell(3, 3, Modifiers::CTRL);
        assert_eq!(s.selected_cells().len(), 2);
        s.select_cell(0, 0, Modifiers::CTRL);
        assert_eq!(s.selected_cells(), vec![CellPosition::new(3, 3)]);
    }

    #[test]
    fn test_labels() {
        let s = layer(3, 3);
        s.select_cell(1, 1, Modifiers::NONE);
        s.select_cell(2, 1, Modifiers::SHIFT);
        let anchor = s.config_labels_by_position(1, 1);
        assert_eq!(anchor.labels()[0], SELECTION_ANCHOR);
        assert!(anchor.has_label(SELECT));
        let other = s.config_labels_by_position(2, 1);
        assert!(other.has_label(SELECT));
        assert!(!other.has_label(SELECTION_ANCHOR));
    }

    #[test]
    fn test_select_column_and_rows() {
        let s = layer(4, 6);
        let top: Arc<dyn Layer> = s.clone();
        assert!(s.do_command(&SelectColumnCommand::new(top.clone(), 1, Modifiers::NONE)));
        assert_eq!(s.fully_selected_positions(Horizontal), vec![1]);
        assert!(s.do_command(&SelectColumnCommand::new(top.clone(), 3, Modifiers::SHIFT)));
        assert_eq!(s.fully_selected_positions(Horizontal), vec![1, 2, 3]);

        assert!(s.do_command(&SelectRowsCommand::new(top, &[0, 4], Modifiers::NONE)));
        assert_eq!(s.fully_selected_positions(Vertical), vec![0, 4]);
        assert_eq!(s.anchor(), Some(CellPosition::new(0, 4)));
        assert_eq!(s.selected_positions(Vertical), vec![Range::single(0), Range::single(4)]);
    }

    #[test]
    fn test_select_all_and_clear() {
        let s = layer(3, 3);
        assert!(s.do_command(&SelectAllCommand));
        assert_eq!(s.selected_cells().len(), 9);
        assert_eq!(s.anchor(), Some(CellPosition::new(0, 0)));
        assert!(s.do_command(&ClearAllSelectionsCommand));
        assert!(s.is_empty());
        assert_eq!(s.anchor(), None);
    }

    #[test]
    fn test_move_selection_uses_strategy() {
        let s = layer(3, 2);
        s.select_cell(2, 0, Modifiers::NONE);
        s.do_command(&MoveSelectionCommand::new(MoveDirection::Right));
        assert_eq!(s.last_selected(), Some(CellPosition::new(2, 0)));

        s.set_traversal_strategy(TraversalStrategy::TABLE);
        s.do_command(&MoveSelectionCommand::new(MoveDirection::Right));
        assert_eq!(s.last_selected(), Some(CellPosition::new(0, 1)));

        s.do_command(
            &MoveSelectionCommand::new(MoveDirection::Right).with_modifiers(Modifiers::SHIFT),
        );
        assert_eq!(s.anchor(), Some(CellPosition::new(0, 1)));
        assert_eq!(s.selected_cells().len(), 2);
    }

    #[test]
    fn test_row_selection_model() {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(4, 4)));
        let s = SelectionLayer::with_model(data, Box::new(RowSelectionModel::new()));
        s.select_cell(2, 1, Modifiers::NONE);
        assert!(s.is_cell_selected(0, 1));
        assert_eq!(s.fully_selected_positions(Vertical), vec![1]);
    }

    #[test]
    fn test_structural_change_clears_selection() {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(4, 4)));
        let hide = HideShowLayer::new(data.clone());
        let s = SelectionLayer::new(hide.clone());
        s.select_cell(1, 1, Modifiers::NONE);
        data.set_size(Horizontal, 0, 30, false);
        assert!(!s.is_empty());
        hide.hide_positions(Vertical, &[3]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_selection_reveals_in_viewport() {
        let data = DataLayer::new(Arc::new(DummyDataProvider::new(2, 30)));
        let s = SelectionLayer::new(data);
        let viewport = ViewportLayer::new(s.clone());
        viewport.set_client_area(Vertical, 100);
        let top: Arc<dyn Layer> = viewport.clone();
        assert!(top.do_command(&SelectCellCommand::new(top.clone(), 0, 4, Modifiers::NONE)));
        assert_eq!(s.last_selected(), Some(CellPosition::new(0, 4)));
        for _ in 0..3 {
            top.do_command(&MoveSelectionCommand::new(MoveDirection::Down));
        }
        assert_eq!(s.last_selected(), Some(CellPosition::new(0, 7)));
        assert_eq!(viewport.origin(Vertical), 60);
    }

    #[test]
    fn test_anchor_persistence() {
        let s = layer(5, 5);
        s.select_cell(3, 2, Modifiers::NONE);
        let mut properties = Properties::new();
        s.save_state("sel", &mut properties);
        assert_eq!(properties.get("sel.selectionAnchor"), Some("3,2"));

        let restored = layer(5, 5);
        restored.load_state("sel", &properties);
        assert_eq!(restored.anchor(), Some(CellPosition::new(3, 2)));
    }
}
