//! The scrollable window onto a layer.
//!
//! A [`ViewportLayer`] exposes the underlying positions that intersect its
//! client area. Position 0 is the first position at least partly visible;
//! its start pixel is negative when it is scrolled partly out of view.

mod command;

pub use command::{ScrollAction, ScrollCommand, ShowPositionInViewportCommand};

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;

use crate::command::{ClientAreaResizeCommand, LayerCommand, convert_command};
use crate::coordinate::Orientation;
use crate::event::LayerEvent;
use crate::layer::{Layer, LayerBase, LayerId, relay_event};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AxisState {
    /// Pixel of the underlying layer shown at local pixel 0.
    origin: i32,
    /// The origin never goes below this pixel (frozen area in front).
    min_origin: i32,
    /// Visible pixels; `None` shows everything after the minimum origin.
    client: Option<i32>,
    /// First visible underlying position.
    first: usize,
    count: usize,
}

/// Shows the part of its underlying layer that fits the client area.
pub struct ViewportLayer {
    base: LayerBase,
    underlying: Arc<dyn Layer>,
    state: [RwLock<AxisState>; 2],
}

impl ViewportLayer {
    pub fn new(underlying: Arc<dyn Layer>) -> Arc<Self> {
        let layer = Arc::new_cyclic(|me: &Weak<Self>| {
            let base = LayerBase::new("ViewportLayer");
            let owner: Weak<dyn Layer> = me.clone();
            base.listen_to(owner, &underlying);
            Self {
                base,
                underlying,
                state: [RwLock::default(), RwLock::default()],
            }
        });
        for axis in Orientation::ALL {
            layer.recompute(axis);
        }
        layer
    }

    fn state(&self, axis: Orientation) -> AxisState {
        *self.state[axis.slot()].read()
    }

    /// Clamp the origin and recompute the visible positions. Returns whether
    /// the visible window moved.
    fn recompute(&self, axis: Orientation) -> bool {
        let current = self.state(axis);
        let extent = self.underlying.extent(axis);
        let count = self.underlying.count(axis);
        let client = current
            .client
            .unwrap_or(extent - current.min_origin)
            .max(0);
        let max_origin = current.min_origin.max(extent - client);
        let origin = current.origin.clamp(current.min_origin, max_origin);

        let (first, visible) = match self.underlying.position_by_pixel(axis, origin) {
            Some(first) if client > 0 => {
                let end = (origin + client).min(extent);
                let last = self
                    .underlying
                    .position_by_pixel(axis, end - 1)
                    .unwrap_or(count.saturating_sub(1));
                (first, last + 1 - first)
            }
            Some(first) => (first, 0),
            None => (count, 0),
        };

        let next = AxisState {
            origin,
            first,
            count: visible,
            ..current
        };
        *self.state[axis.slot()].write() = next;
        next.origin != current.origin || next.first != current.first || next.count != current.count
    }

    fn update(&self, axis: Orientation, change: impl FnOnce(&mut AxisState)) {
        change(&mut self.state[axis.slot()].write());
        if self.recompute(axis) {
            self.fire_layer_event(LayerEvent::scroll(self.id(), axis));
        }
    }

    // =========================================================================
    // Client area and origin
    // =========================================================================

    pub fn set_client_area(&self, axis: Orientation, size: i32) {
        self.update(axis, |state| state.client = Some(size.max(0)));
    }

    pub fn client_area(&self, axis: Orientation) -> Option<i32> {
        self.state(axis).client
    }

    /// The underlying pixel shown at local pixel 0.
    pub fn origin(&self, axis: Orientation) -> i32 {
        self.state(axis).origin
    }

    /// Scroll to an underlying pixel; clamped to the scrollable range.
    pub fn set_origin(&self, axis: Orientation, pixel: i32) {
        self.update(axis, |state| state.origin = pixel);
    }

    pub fn minimum_origin(&self, axis: Orientation) -> i32 {
        self.state(axis).min_origin
    }

    /// Keep everything in front of `pixel` out of this viewport.
    pub fn set_minimum_origin(&self, axis: Orientation, pixel: i32) {
        self.update(axis, |state| {
            let shift = pixel.max(0) - state.min_origin;
            state.min_origin = pixel.max(0);
            state.origin += shift;
        });
    }

    /// First visible underlying position.
    pub fn first_position(&self, axis: Orientation) -> usize {
        self.state(axis).first
    }

    pub fn scroll(&self, axis: Orientation, action: ScrollAction) {
        let state = self.state(axis);
        let client = state.client.unwrap_or(0);
        let start = |position: usize| self.underlying.start_pixel_by_position(axis, position);
        let origin = match action {
            ScrollAction::ToPixel(pixel) => pixel,
            ScrollAction::ByPixels(delta) => state.origin.saturating_add(delta),
            ScrollAction::LineForward => match start(state.first + 1) {
                Some(pixel) => pixel,
                None => return,
            },
            ScrollAction::LineBackward => match start(state.first) {
                Some(pixel) if pixel < state.origin => pixel,
                _ => match state.first.checked_sub(1).and_then(start) {
                    Some(pixel) => pixel,
                    None => return,
                },
            },
            ScrollAction::PageForward => state.origin.saturating_add(client),
            ScrollAction::PageBackward => state.origin.saturating_sub(client),
            ScrollAction::Start => state.min_origin,
            ScrollAction::End => i32::MAX,
        };
        tracing::trace!(target: targets::LAYER, axis = axis.noun(), ?action, origin, "scroll");
        self.set_origin(axis, origin);
    }

    /// Scroll the least amount that makes an underlying position fully
    /// visible, or its start if it is larger than the client area.
    pub fn show_position(&self, axis: Orientation, underlying_position: usize) {
        let Some(start) = self.underlying.start_pixel_by_position(axis, underlying_position) else {
            return;
        };
        let end = start + self.underlying.size_by_position(axis, underlying_position);
        let state = self.state(axis);
        if start < state.min_origin {
            return;
        }
        let Some(client) = state.client else {
            return;
        };
        if start < state.origin {
            self.set_origin(axis, start);
        } else if end > state.origin + client {
            self.set_origin(axis, (end - client).min(start));
        }
    }

    fn handle_command(&self, command: &dyn LayerCommand) -> bool {
        if let Some(resize) = command.downcast_ref::<ClientAreaResizeCommand>() {
            for axis in Orientation::ALL {
                self.set_client_area(axis, resize.extent(axis));
            }
            self.underlying.do_command(command);
            return true;
        }
        if let Some(command) = command.downcast_ref::<ScrollCommand>() {
            self.scroll(command.axis, command.action);
            return true;
        }
        if let Some(command) =
            convert_command::<ShowPositionInViewportCommand>(command, &*self.underlying)
        {
            self.show_position(command.axis, command.coordinate.position);
            return true;
        }
        false
    }
}

impl Layer for ViewportLayer {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn count(&self, axis: Orientation) -> usize {
        self.state(axis).count
    }

    fn preferred_count(&self, axis: Orientation) -> usize {
        self.underlying.count(axis)
    }

    fn index_by_position(&self, axis: Orientation, position: usize) -> Option<usize> {
        let underlying_position = self.local_to_underlying(axis, position)?;
        self.underlying.index_by_position(axis, underlying_position)
    }

    fn position_by_index(&self, axis: Orientation, index: usize) -> Option<usize> {
        let underlying_position = self.underlying.position_by_index(axis, index)?;
        self.underlying_to_local(axis, self.underlying.id(), underlying_position)
    }

    fn local_to_underlying(&self, axis: Orientation, position: usize) -> Option<usize> {
        let state = self.state(axis);
        (position < state.count).then(|| state.first + position)
    }

    fn underlying_to_local(
        &self,
        axis: Orientation,
        source: LayerId,
        underlying_position: usize,
    ) -> Option<usize> {
        if source != self.underlying.id() {
            return None;
        }
        let state = self.state(axis);
        (underlying_position >= state.first && underlying_position < state.first + state.count)
            .then(|| underlying_position - state.first)
    }

    fn underlying_layers(&self) -> Vec<Arc<dyn Layer>> {
        vec![self.underlying.clone()]
    }

    fn extent(&self, axis: Orientation) -> i32 {
        let state = self.state(axis);
        if state.count == 0 {
            return 0;
        }
        let available = self.underlying.extent(axis) - state.origin;
        match state.client {
            Some(client) => client.min(available),
            None => available,
        }
    }

    fn preferred_extent(&self, axis: Orientation) -> i32 {
        self.underlying.extent(axis) - self.state(axis).min_origin
    }

    fn size_by_position(&self, axis: Orientation, position: usize) -> i32 {
        match self.local_to_underlying(axis, position) {
            Some(underlying_position) => self.underlying.size_by_position(axis, underlying_position),
            None => 0,
        }
    }

    fn start_pixel_by_position(&self, axis: Orientation, position: usize) -> Option<i32> {
        let underlying_position = self.local_to_underlying(axis, position)?;
        let start = self.underlying.start_pixel_by_position(axis, underlying_position)?;
        Some(start - self.state(axis).origin)
    }

    fn position_by_pixel(&self, axis: Orientation, pixel: i32) -> Option<usize> {
        if pixel < 0 || pixel >= self.extent(axis) {
            return None;
        }
        let state = self.state(axis);
        let underlying_position = self.underlying.position_by_pixel(axis, state.origin + pixel)?;
        underlying_position.checked_sub(state.first)
    }

    fn do_command(&self, command: &dyn LayerCommand) -> bool {
        self.base.do_registered_command(self, command)
            || self.handle_command(command)
            || self.underlying.do_command(command)
    }

    fn handle_layer_event(&self, event: LayerEvent) {
        if event.layer == self.underlying.id() {
            if let Some(cell) = event.selection_change().and_then(|change| change.reveal) {
                self.show_position(Orientation::Horizontal, cell.column);
                self.show_position(Orientation::Vertical, cell.row);
            }
        }
        relay_event(self, event, |event| {
            for axis in Orientation::ALL {
                if event.affects_axis(axis) {
                    self.recompute(axis);
                }
            }
        });
    }
}

static_assertions::assert_impl_all!(ViewportLayer: Send, Sync);
