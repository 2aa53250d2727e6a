//! Commands dispatched from the top of full layer stacks.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use horizon_grid::command::{
    ClientAreaResizeCommand, ConfigureScalingCommand, LayerCommand, MultiResizeCommand,
    PercentageSizingCommand, ResizeCommand, dispatch,
};
use horizon_grid::coordinate::Orientation::{Horizontal, Vertical};
use horizon_grid::data::DummyDataProvider;
use horizon_grid::data_layer::{DpiConverter, FixedScalingDpiConverter};
use horizon_grid::layer::Layer;
use horizon_grid::stack::BodyLayerStack;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn body(columns: usize, rows: usize) -> BodyLayerStack {
    init_tracing();
    BodyLayerStack::new(Arc::new(DummyDataProvider::new(columns, rows)))
}

#[derive(Debug, Clone)]
struct Unrecognized;

impl LayerCommand for Unrecognized {
    fn convert_to_target_layer(&mut self, _target: &dyn Layer) -> bool {
        true
    }
}

#[test]
fn test_unrecognized_command_returns_false() {
    let body = body(10, 10);
    body.freeze().freeze(Vertical, 2);
    assert!(!dispatch(&*body.top(), &Unrecognized));
}

#[test]
fn test_command_is_handled_once() {
    let body = body(10, 10);
    let resizes = Arc::new(Mutex::new(0));
    let sink = resizes.clone();
    body.data().base().add_layer_listener(move |event| {
        if event.kind_name() == "resize" {
            *sink.lock() += 1;
        }
    });
    let top = body.top();
    assert!(dispatch(&*top, &ResizeCommand::new(Horizontal, top.clone(), 3, 150)));
    assert_eq!(*resizes.lock(), 1);
}

#[test]
fn test_resize_position_three() {
    let body = body(10, 10);
    let top = body.top();
    assert!(top.do_command(&ResizeCommand::new(Horizontal, top.clone(), 3, 150)));
    for position in 0..10 {
        let expected = if position == 3 { 150 } else { 100 };
        assert_eq!(top.column_width_by_position(position), expected, "column {position}");
    }
    assert_eq!(top.width(), 1050);
}

#[test]
fn test_multi_resize_with_scaling() {
    let body = body(10, 10);
    let top = body.top();
    let converter: Arc<dyn DpiConverter> = Arc::new(FixedScalingDpiConverter::new(120.0));
    assert!(top.do_command(&ConfigureScalingCommand::new(converter.clone(), converter)));
    assert!(top.do_command(&MultiResizeCommand::new(Horizontal, top.clone(), &[3, 4, 5], 150)));

    for position in [3, 4, 5] {
        assert_eq!(top.column_width_by_position(position), 188);
    }
    assert_eq!(top.column_width_by_position(2), 125);
    assert_eq!(top.column_width_by_position(6), 125);
}

#[test]
fn test_downscaled_resize_reads_back_unchanged() {
    let body = body(4, 4);
    let top = body.top();
    let converter: Arc<dyn DpiConverter> = Arc::new(FixedScalingDpiConverter::new(120.0));
    assert!(top.do_command(&ConfigureScalingCommand::new(converter.clone(), converter)));
    let resize = MultiResizeCommand::new(Horizontal, top.clone(), &[1], 150).downscaled(true);
    assert!(top.do_command(&resize));
    assert_eq!(top.column_width_by_position(1), 150);
}

#[test]
fn test_percentage_sizing_fills_client_area() {
    let body = body(4, 3);
    let top = body.top();
    assert!(top.do_command(&PercentageSizingCommand::new(Horizontal, true)));

    assert!(top.do_command(&ClientAreaResizeCommand::new(500, 200)));
    assert!((0..4).all(|c| top.column_width_by_position(c) == 125));
    assert_eq!(top.width(), 500);

    assert!(top.do_command(&ClientAreaResizeCommand::new(1000, 200)));
    assert!((0..4).all(|c| top.column_width_by_position(c) == 250));
    assert_eq!(top.width(), 1000);
}

#[test]
fn test_percentage_sizing_with_frozen_column() {
    let body = body(4, 3);
    let top = body.top();
    assert!(top.do_command(&PercentageSizingCommand::new(Horizontal, true)));
    assert!(top.do_command(&ClientAreaResizeCommand::new(500, 200)));
    body.freeze().freeze(Horizontal, 1);

    assert!((0..4).all(|c| body.data().column_width_by_position(c) == 125));
    assert_eq!(body.freeze_layer().width(), 125);
    assert_eq!(body.viewport().client_area(Horizontal), Some(375));
    assert_eq!(top.width(), 500);
}

proptest! {
    #[test]
    fn percentage_columns_sum_to_the_client_width(
        columns in 1usize..8,
        width in 200i32..2000,
        frozen in 0usize..8,
    ) {
        let body = body(columns, 3);
        let top = body.top();
        prop_assert!(top.do_command(&PercentageSizingCommand::new(Horizontal, true)));
        prop_assert!(top.do_command(&ClientAreaResizeCommand::new(width, 200)));
        body.freeze().freeze(Horizontal, frozen.min(columns - 1));

        let data = body.data();
        let sum: i32 = (0..columns).map(|c| data.column_width_by_position(c)).sum();
        prop_assert_eq!(sum, width);
        prop_assert_eq!(top.width(), width);
    }
}
