use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::{CompositeLayer, Region};
use crate::command::{ClientAreaResizeCommand, convert_command};
use crate::coordinate::Orientation;
use crate::dimensional::DimensionallyDependentLayer;
use crate::freeze::{FreezeCommand, FreezeLayer, UnfreezeCommand};
use crate::layer::Layer;
use crate::viewport::ViewportLayer;

/// Region label of the frozen top-left block.
pub const FROZEN: &str = "FROZEN";
/// Frozen rows right of the frozen block.
pub const FROZEN_ROWS: &str = "FROZEN_ROWS";
/// Frozen columns below the frozen block.
pub const FROZEN_COLUMNS: &str = "FROZEN_COLUMNS";
/// The scrollable part.
pub const SCROLLABLE: &str = "SCROLLABLE";

/// A body that can freeze its first columns and rows.
///
/// Builds a 2x2 composite over one underlying layer: the frozen block, the
/// frozen rows and frozen columns following the viewport on their free axis,
/// and the viewport itself. [`FreezeCommand`] and [`UnfreezeCommand`] issued
/// on the composite (or above it) are handled here.
///
/// The whole client area goes down to the underlying layer once, so
/// percentage sizes span frozen and scrollable columns alike. The regions
/// only keep their share of it.
pub struct CompositeFreezeLayer {
    composite: Arc<CompositeLayer>,
    freeze: Arc<FreezeLayer>,
    viewport: Arc<ViewportLayer>,
}

impl CompositeFreezeLayer {
    pub fn new(underlying: Arc<dyn Layer>) -> Self {
        let freeze = FreezeLayer::new(underlying.clone());
        let viewport = ViewportLayer::new(underlying.clone());
        let frozen_rows = DimensionallyDependentLayer::new(
            underlying.clone(),
            viewport.clone(),
            freeze.clone(),
        );
        let frozen_columns = DimensionallyDependentLayer::new(
            underlying.clone(),
            freeze.clone(),
            viewport.clone(),
        );
        for region in [&frozen_rows, &frozen_columns] {
            region
                .base()
                .register_command_handler(|_layer: &dyn Layer, _command: &ClientAreaResizeCommand| true);
        }
        let composite = CompositeLayer::build(vec![
            vec![Region::new(FROZEN, freeze.clone()), Region::new(FROZEN_ROWS, frozen_rows)],
            vec![
                Region::new(FROZEN_COLUMNS, frozen_columns),
                Region::new(SCROLLABLE, viewport.clone()),
            ],
        ]);

        let layer = Self {
            composite,
            freeze,
            viewport,
        };
        layer.install(underlying);
        layer
    }

    /// Register the freeze handlers and keep the viewport's minimum origin
    /// at the end of the frozen block.
    fn install(&self, underlying: Arc<dyn Layer>) {
        let composite = Arc::downgrade(&self.composite);
        self.composite.base().register_command_handler(
            move |_layer: &dyn Layer, command: &ClientAreaResizeCommand| {
                let Some(composite) = composite.upgrade() else {
                    return false;
                };
                composite.remember_client_area(command.width, command.height);
                underlying.do_command(command);
                composite.refresh_client_area();
                true
            },
        );
        self.freeze
            .base()
            .register_command_handler(|_layer: &dyn Layer, _command: &ClientAreaResizeCommand| true);
        let viewport = Arc::downgrade(&self.viewport);
        self.viewport.base().register_command_handler(
            move |_layer: &dyn Layer, command: &ClientAreaResizeCommand| {
                if let Some(viewport) = viewport.upgrade() {
                    for axis in Orientation::ALL {
                        viewport.set_client_area(axis, command.extent(axis));
                    }
                }
                true
            },
        );

        let freeze = Arc::downgrade(&self.freeze);
        let viewport = Arc::downgrade(&self.viewport);
        let composite = Arc::downgrade(&self.composite);
        self.freeze.base().add_layer_listener(move |event| {
            let (Some(freeze), Some(viewport)) = (freeze.upgrade(), viewport.upgrade()) else {
                return;
            };
            let mut changed = false;
            for axis in Orientation::ALL {
                if event.affects_axis(axis) {
                    viewport.set_minimum_origin(axis, freeze.frozen_extent(axis));
                    changed = true;
                }
            }
            if let Some(composite) = composite.upgrade().filter(|_| changed) {
                composite.refresh_client_area();
            }
        });

        let (freeze, viewport) = (self.freeze.clone(), self.viewport.clone());
        self.composite.base().register_command_handler(
            move |layer: &dyn Layer, command: &FreezeCommand| {
                let Some(underlying) = viewport.underlying_layers().into_iter().next() else {
                    return false;
                };
                let Some(command) = convert_command::<FreezeCommand>(command, &*underlying) else {
                    tracing::debug!(target: targets::LAYER, layer = layer.name(), "freeze target not visible");
                    return false;
                };
                for axis in Orientation::ALL {
                    if let Some(coordinate) = command.coordinate(axis) {
                        freeze_axis(&freeze, &viewport, axis, coordinate.position + 1);
                    }
                }
                true
            },
        );

        let (freeze, viewport) = (self.freeze.clone(), self.viewport.clone());
        self.composite.base().register_command_handler(
            move |_layer: &dyn Layer, _command: &UnfreezeCommand| {
                for axis in Orientation::ALL {
                    freeze_axis(&freeze, &viewport, axis, 0);
                }
                true
            },
        );
    }

    /// The composite to put in a stack.
    pub fn layer(&self) -> &Arc<CompositeLayer> {
        &self.composite
    }

    pub fn freeze_layer(&self) -> &Arc<FreezeLayer> {
        &self.freeze
    }

    pub fn viewport(&self) -> &Arc<ViewportLayer> {
        &self.viewport
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.is_frozen()
    }

    /// Freeze the first `count` underlying positions along `axis`.
    pub fn freeze(&self, axis: Orientation, count: usize) {
        freeze_axis(&self.freeze, &self.viewport, axis, count);
    }

    pub fn unfreeze(&self) {
        for axis in Orientation::ALL {
            freeze_axis(&self.freeze, &self.viewport, axis, 0);
        }
    }
}

fn freeze_axis(freeze: &FreezeLayer, viewport: &ViewportLayer, axis: Orientation, count: usize) {
    freeze.set_frozen(axis, count);
    let frozen_extent = freeze.frozen_extent(axis);
    viewport.set_minimum_origin(axis, frozen_extent);
    viewport.set_origin(axis, frozen_extent);
}

impl std::fmt::Debug for CompositeFreezeLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeFreezeLayer")
            .field("frozen_columns", &self.freeze.frozen_count(Orientation::Horizontal))
            .field("frozen_rows", &self.freeze.frozen_count(Orientation::Vertical))
            .finish()
    }
}
