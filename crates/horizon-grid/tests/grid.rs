//! A full grid: headers and corner around a frozen, scrollable body.

use std::sync::Arc;

use horizon_grid::command::{ClientAreaResizeCommand, PercentageSizingCommand};
use horizon_grid::composite::FROZEN_ROWS;
use horizon_grid::config::labels::{BODY, COLUMN_HEADER, CORNER, ROW_HEADER, SELECT};
use horizon_grid::coordinate::Orientation::{Horizontal, Vertical};
use horizon_grid::data::{CellValue, DataProvider, DummyDataProvider, ListDataProvider};
use horizon_grid::freeze::FreezeCommand;
use horizon_grid::layer::Layer;
use horizon_grid::selection::{Modifiers, SelectCellCommand};
use horizon_grid::stack::{BodyLayerStack, GridLayerStack};
use horizon_grid::viewport::{ScrollAction, ScrollCommand};

fn grid(columns: usize, rows: usize) -> GridLayerStack {
    let body = BodyLayerStack::new(Arc::new(DummyDataProvider::new(columns, rows)));
    let column_header: Arc<dyn DataProvider> = Arc::new(ListDataProvider::from_fn(
        columns,
        1,
        |c, _| CellValue::String(format!("C{c}")),
    ));
    let row_header: Arc<dyn DataProvider> = Arc::new(ListDataProvider::from_fn(1, rows, |_, r| {
        CellValue::Int(r as i64)
    }));
    GridLayerStack::new(body, column_header, row_header)
}

#[test]
fn test_regions() {
    let g = grid(20, 100);
    let layer = g.grid();
    assert_eq!(layer.region_label_by_position(0, 0), Some(CORNER));
    assert_eq!(layer.region_label_by_position(5, 0), Some(COLUMN_HEADER));
    assert_eq!(layer.region_label_by_position(0, 5), Some(ROW_HEADER));
    assert_eq!(layer.region_label_by_position(5, 5), Some(BODY));
    assert_eq!(layer.column_count(), 21);
    assert_eq!(layer.row_count(), 101);
}

#[test]
fn test_client_area_and_scrolling() {
    let g = grid(20, 100);
    let layer = g.grid();
    assert!(layer.do_command(&ClientAreaResizeCommand::new(440, 220)));
    // 40px row header, 20px column header: a 400x200 body.
    assert_eq!(layer.column_count(), 1 + 4);
    assert_eq!(layer.row_count(), 1 + 10);

    let viewport = g.body().viewport();
    assert!(layer.do_command(&ScrollCommand::new(Vertical, ScrollAction::PageForward)));
    assert_eq!(viewport.origin(Vertical), 200);
    assert_eq!(layer.data_value_by_position(0, 1).to_string(), "10");
    assert_eq!(layer.data_value_by_position(1, 1).to_string(), "0,10");
}

#[test]
fn test_freeze_keeps_first_row_while_scrolling() {
    let g = grid(20, 100);
    let layer = g.grid();
    assert!(layer.do_command(&ClientAreaResizeCommand::new(440, 220)));

    let body_top = g.body().top();
    assert!(layer.do_command(&FreezeCommand::rows(body_top, 0)));
    assert!(g.body().freeze().is_frozen());
    assert_eq!(g.body().freeze_layer().frozen_count(Vertical), 1);

    g.body().viewport().set_origin(Vertical, 400);
    assert_eq!(layer.data_value_by_position(1, 1).to_string(), "0,0");
    assert!(layer.config_labels_by_position(1, 1).has_label(FROZEN_ROWS));
    assert_ne!(layer.data_value_by_position(1, 2).to_string(), "0,1");
    // The row header follows the body rows.
    assert_eq!(
        layer.data_value_by_position(0, 2).to_string(),
        layer
            .data_value_by_position(1, 2)
            .to_string()
            .split(',')
            .nth(1)
            .unwrap_or_default()
    );
}

#[test]
fn test_select_body_cell_from_grid() {
    let g = grid(5, 5);
    let layer = g.grid();
    assert!(layer.do_command(&SelectCellCommand::new(layer.clone(), 2, 3, Modifiers::NONE)));
    // Grid (2, 3) is body (1, 2).
    assert!(g.body().selection().is_cell_selected(1, 2));
    assert!(layer.config_labels_by_position(2, 3).has_label(SELECT));
}

#[test]
fn test_hidden_body_column_leaves_header() {
    let g = grid(5, 5);
    let layer = g.grid();
    g.body().hide().hide_positions(Horizontal, &[0]);
    assert_eq!(layer.column_count(), 5);
    assert_eq!(layer.data_value_by_position(1, 0).to_string(), "C1");
    assert_eq!(g.column_header().column_count(), 4);
}

#[test]
fn test_percentage_body_columns_fill_the_space_beside_the_row_header() {
    let g = grid(4, 3);
    let layer = g.grid();
    let top = g.body().top();
    assert!(top.do_command(&PercentageSizingCommand::new(Horizontal, true)));
    assert!(layer.do_command(&ClientAreaResizeCommand::new(540, 220)));

    assert!((0..4).all(|c| top.column_width_by_position(c) == 125));
    assert_eq!(top.width(), 500);
    assert_eq!(layer.width(), 540);
    assert_eq!(g.column_header().column_width_by_position(3), 125);
}
