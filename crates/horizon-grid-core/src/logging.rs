//! Logging and tracing facilities for Horizon Grid.
//!
//! This module provides:
//! - Target names for filtering `tracing` output per subsystem
//! - Span names for the expensive recalculations
//! - A performance span guard for profiling
//!
//! # Tracing Integration
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_grid::command=trace")
//!         .init();
//! }
//! ```

/// Span names used throughout Horizon Grid for tracing.
pub mod span_names {
    /// Rebuild of a layer's position cache.
    pub const CACHE_REBUILD: &str = "horizon_grid::cache_rebuild";
    /// Percentage size recalculation.
    pub const PERCENTAGE_SIZING: &str = "horizon_grid::percentage_sizing";
    /// Command dispatch through a layer stack.
    pub const DISPATCH: &str = "horizon_grid::dispatch";
    /// Conflated event flush.
    pub const CONFLATION: &str = "horizon_grid::conflation";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Layer structure and cache target.
    pub const LAYER: &str = "horizon_grid::layer";
    /// Command dispatch target.
    pub const COMMAND: &str = "horizon_grid::command";
    /// Event propagation and conflation target.
    pub const EVENT: &str = "horizon_grid::event";
    /// Selection target.
    pub const SELECTION: &str = "horizon_grid::selection";
    /// Tree expand/collapse target.
    pub const TREE: &str = "horizon_grid::tree";
    /// State persistence target.
    pub const PERSISTENCE: &str = "horizon_grid::persistence";
    /// Performance spans target.
    pub const PERF: &str = "horizon_grid::perf";
}

/// Keeps a `perf` span entered until dropped, so subscribers can time the
/// enclosed recalculation.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
