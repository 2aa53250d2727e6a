//! A virtual grid layer stack for large tables and trees.
//!
//! A grid is a stack of layers. The bottom [`DataLayer`](data_layer::DataLayer)
//! reads cells from a [`DataProvider`](data::DataProvider); every layer above
//! transforms the positions of the one below:
//!
//! - **Reorder**: a permutation of column and row indexes
//! - **Hide/show**: removes hidden indexes
//! - **Tree**: hides the rows below collapsed nodes
//! - **Selection**: tracks selected cells and marks them for rendering
//! - **Viewport**: the window of cells visible in the client area
//! - **Freeze**: keeps the first columns and rows in place while scrolling
//! - **Composite**: lays out header, corner and body regions in a grid
//!
//! Positions are what a layer shows; indexes identify entries in the data
//! and are the same in every layer. Lookups of invalid positions return
//! `None` rather than failing.
//!
//! Intents travel down the stack as [commands](command), converted into each
//! layer's positions on the way. Changes travel up as [events](event),
//! converted into each listener's positions.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::command::ClientAreaResizeCommand;
//! use horizon_grid::coordinate::Orientation;
//! use horizon_grid::data::DummyDataProvider;
//! use horizon_grid::layer::Layer;
//! use horizon_grid::stack::BodyLayerStack;
//!
//! let body = BodyLayerStack::new(Arc::new(DummyDataProvider::new(100, 10_000)));
//! let top = body.top();
//! top.do_command(&ClientAreaResizeCommand::new(450, 200));
//!
//! // 100px columns and 20px rows in a 450x200 client area.
//! assert_eq!(top.column_count(), 5);
//! assert_eq!(top.row_count(), 10);
//!
//! body.freeze().freeze(Orientation::Horizontal, 1);
//! assert_eq!(top.data_value_by_position(0, 0).to_string(), "0,0");
//! ```

pub mod command;
pub mod composite;
pub mod config;
pub mod coordinate;
pub mod data;
pub mod data_layer;
pub mod dimensional;
pub mod event;
pub mod fixture;
pub mod freeze;
pub mod hide_show;
pub mod layer;
pub mod persistence;
pub mod reorder;
pub mod selection;
pub mod stack;
pub mod tree;
pub mod viewport;

pub use horizon_grid_core::{GridError, Result};
