//! Tree rows in a full body stack.

use std::sync::Arc;

use proptest::prelude::*;

use horizon_grid::config::labels::{TREE_COLLAPSED, TREE_EXPANDED};
use horizon_grid::data::DummyDataProvider;
use horizon_grid::layer::Layer;
use horizon_grid::selection::{Modifiers, SelectRowsCommand};
use horizon_grid::stack::BodyLayerStack;
use horizon_grid::tree::{
    ParentTreeData, TreeCollapseAllCommand, TreeExpandAllCommand, TreeExpandCollapseCommand,
    TreeRowModel,
};

fn body(depths: &[usize]) -> BodyLayerStack {
    let tree = ParentTreeData::from_depths(depths.iter().copied());
    let model = Arc::new(TreeRowModel::new(Arc::new(tree)));
    BodyLayerStack::with_tree(Arc::new(DummyDataProvider::new(3, depths.len())), model)
}

fn visible_rows(layer: &dyn Layer) -> Vec<usize> {
    (0..layer.row_count())
        .filter_map(|p| layer.row_index_by_position(p))
        .collect()
}

#[test]
fn test_toggle_from_top() {
    let body = body(&[0, 1, 1, 0, 1]);
    let top = body.top();
    assert!(top.do_command(&TreeExpandCollapseCommand::new(top.clone(), 0)));
    assert_eq!(visible_rows(&*top), vec![0, 3, 4]);
    assert!(top.config_labels_by_position(0, 0).has_label(TREE_COLLAPSED));

    assert!(top.do_command(&TreeExpandCollapseCommand::new(top.clone(), 0)));
    assert_eq!(visible_rows(&*top), vec![0, 1, 2, 3, 4]);
    assert!(top.config_labels_by_position(0, 0).has_label(TREE_EXPANDED));
}

#[test]
fn test_collapse_all_and_expand_all() {
    let body = body(&[0, 1, 2, 1, 0, 1]);
    let top = body.top();
    assert!(top.do_command(&TreeCollapseAllCommand));
    assert_eq!(visible_rows(&*top), vec![0, 4]);
    assert!(top.do_command(&TreeExpandAllCommand));
    assert_eq!(top.row_count(), 6);
}

#[test]
fn test_collapse_clears_selection() {
    let body = body(&[0, 1, 1, 0]);
    let top = body.top();
    assert!(top.do_command(&SelectRowsCommand::new(top.clone(), &[2], Modifiers::NONE)));
    assert!(!body.selection().is_empty());
    assert!(top.do_command(&TreeExpandCollapseCommand::new(top.clone(), 0)));
    assert!(body.selection().is_empty());
}

/// Depths of a random outline: each row is at most one level below the
/// previous one.
fn outline() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..3, 1..24).prop_map(|steps| {
        let mut depths = Vec::with_capacity(steps.len());
        let mut previous = 0usize;
        for (i, step) in steps.into_iter().enumerate() {
            let depth = if i == 0 { 0 } else { step.min(previous + 1) };
            depths.push(depth);
            previous = depth;
        }
        depths
    })
}

proptest! {
    #[test]
    fn expand_restores_collapsed_rows(
        depths in outline(),
        collapsed in prop::collection::vec(0usize..24, 0..6),
        node in 0usize..24,
    ) {
        let body = body(&depths);
        let tree = body.tree().unwrap().clone();
        let model = tree.model().clone();
        for index in collapsed {
            if let Some(position) = tree.row_position_by_index(index) {
                tree.collapse_row(position);
            }
        }
        let Some(position) = tree.row_position_by_index(node) else {
            return Ok(());
        };
        prop_assume!(!model.is_leaf(node) && !model.is_collapsed(node));

        let before = visible_rows(&*tree);
        let descendants = model.visible_descendants(node);
        tree.collapse_row(position);
        prop_assert_eq!(tree.row_count(), before.len() - descendants.len());
        tree.expand_row(position);
        prop_assert_eq!(visible_rows(&*tree), before);
    }
}
