//! Core systems for Horizon Grid.
//!
//! This crate provides the foundation shared by the grid layer stack:
//!
//! - **Signal/Slot System**: Copy-on-write listener lists
//! - **Logging**: Tracing targets and performance spans
//! - **Errors**: The [`GridError`] type and [`Result`] alias
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
mod signal;

pub use error::{GridError, Result};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal, Slot, SlotSnapshot};
