//! Saving a body stack to disk and restoring it into a fresh one.

use std::sync::Arc;

use horizon_grid::coordinate::CellPosition;
use horizon_grid::coordinate::Orientation::{Horizontal, Vertical};
use horizon_grid::data::DummyDataProvider;
use horizon_grid::layer::Layer;
use horizon_grid::persistence::Properties;
use horizon_grid::selection::Modifiers;
use horizon_grid::stack::BodyLayerStack;
use horizon_grid::tree::{ParentTreeData, TreeRowModel};

fn tree_body() -> BodyLayerStack {
    // Rows 0 and 4 are roots, 1..=3 are children of 0.
    let tree = ParentTreeData::new([None, Some(0), Some(0), Some(0), None, Some(4)]);
    let model = Arc::new(TreeRowModel::new(Arc::new(tree)));
    BodyLayerStack::with_tree(Arc::new(DummyDataProvider::new(6, 6)), model)
}

#[test]
fn test_round_trip_through_file() {
    let original = tree_body();
    original.data().set_size(Horizontal, 1, 42, false);
    original.reorder().reorder_position(Horizontal, 5, 0, true);
    original.hide().hide_indexes(Horizontal, &[2]);
    original.tree().unwrap().collapse_row(4);
    original.freeze().freeze(Vertical, 1);
    original.selection().select_cell(1, 1, Modifiers::NONE);

    let mut properties = Properties::new();
    original.top().save_state("body", &mut properties);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("body.ini");
    properties.save(&path).unwrap();
    let loaded = Properties::load(&path).unwrap();
    assert_eq!(loaded, properties);

    let restored = tree_body();
    restored.top().load_state("body", &loaded);

    assert_eq!(restored.data().column_width_by_position(1), 42);
    assert_eq!(restored.reorder().index_order(Horizontal), vec![5, 0, 1, 2, 3, 4]);
    assert_eq!(restored.hide().hidden_indexes(Horizontal), vec![2]);
    assert_eq!(restored.tree().unwrap().model().collapsed_indexes(), vec![4]);
    assert_eq!(restored.freeze_layer().frozen_count(Vertical), 1);
    assert_eq!(restored.selection().anchor(), Some(CellPosition::new(1, 1)));

    let top = restored.top();
    assert_eq!(top.column_count(), 5);
    assert_eq!(top.row_count(), 5);
    assert_eq!(top.column_index_by_position(0), Some(5));
}

#[test]
fn test_missing_keys_keep_current_state() {
    let body = tree_body();
    body.hide().hide_indexes(Vertical, &[3]);
    body.top().load_state("elsewhere", &Properties::new());
    assert_eq!(body.hide().hidden_indexes(Vertical), vec![3]);
    assert_eq!(body.data().column_width_by_position(0), 100);
}

#[test]
fn test_malformed_values_are_skipped() {
    let body = tree_body();
    let properties = Properties::parse(
        "body.BODY_ignored=1\n\
         body.SCROLLABLE.hiddenColumnIndexes=1,x\n\
         body.SCROLLABLE.tree.collapsedNodes=0\n",
    )
    .unwrap();
    body.top().load_state("body", &properties);
    assert!(body.hide().hidden_indexes(Horizontal).is_empty());
    assert_eq!(body.tree().unwrap().model().collapsed_indexes(), vec![0]);
}
