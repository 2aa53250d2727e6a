//! Repaint batching.
//!
//! Visual events arriving in quick succession are coalesced and delivered
//! once per interval. The host drives the clock by calling
//! [`ConflationScheduler::flush_due`] from its event loop; selection and
//! structural events are delivered immediately.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{ConnectionId, PerfSpan, Signal};

use super::{EventKind, LayerEvent};
use crate::coordinate::RangeList;
use crate::layer::{Layer, LayerId};

/// Default interval between two deliveries of conflated events.
pub const DEFAULT_CONFLATION_INTERVAL: Duration = Duration::from_millis(20);

/// Collects events of some kinds and hands back a smaller equivalent set.
pub trait EventConflater: Send + Sync {
    /// Whether this conflater takes `event`.
    fn accepts(&self, event: &LayerEvent) -> bool;

    fn add_event(&self, event: LayerEvent);

    /// Number of events added since the last drain.
    fn pending(&self) -> usize;

    /// Take the coalesced events, leaving the conflater empty.
    fn drain(&self) -> Vec<LayerEvent>;
}

#[derive(Default)]
struct VisualState {
    added: usize,
    /// Cell changes per firing layer.
    cells: Vec<(LayerId, RangeList, RangeList)>,
    /// Layers that asked for a full repaint.
    refresh: Vec<LayerId>,
}

/// Coalesces cell visual changes per layer and collapses everything into a
/// single refresh once any layer asked for one.
#[derive(Default)]
pub struct VisualChangeConflater {
    state: Mutex<VisualState>,
}

impl VisualChangeConflater {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventConflater for VisualChangeConflater {
    fn accepts(&self, event: &LayerEvent) -> bool {
        event.is_visual()
    }

    fn add_event(&self, event: LayerEvent) {
        let mut state = self.state.lock();
        state.added += 1;
        match event.kind {
            EventKind::CellVisualChange { columns, rows } => {
                let entry = match state.cells.iter().position(|(id, _, _)| *id == event.layer) {
                    Some(i) => &mut state.cells[i],
                    None => {
                        state.cells.push((event.layer, RangeList::new(), RangeList::new()));
                        let last = state.cells.len() - 1;
                        &mut state.cells[last]
                    }
                };
                for range in columns {
                    entry.1.add(range);
                }
                for range in rows {
                    entry.2.add(range);
                }
            }
            _ => {
                if !state.refresh.contains(&event.layer) {
                    state.refresh.push(event.layer);
                }
            }
        }
    }

    fn pending(&self) -> usize {
        self.state.lock().added
    }

    fn drain(&self) -> Vec<LayerEvent> {
        let state = std::mem::take(&mut *self.state.lock());
        if !state.refresh.is_empty() {
            return state
                .refresh
                .into_iter()
                .map(LayerEvent::visual_refresh)
                .collect();
        }
        state
            .cells
            .into_iter()
            .map(|(layer, columns, rows)| {
                LayerEvent::cell_visual_change(layer, columns.ranges().to_vec(), rows.ranges().to_vec())
            })
            .collect()
    }
}

/// Routes layer events either straight to [`delivered`](Self::delivered) or
/// through conflaters that are flushed on an interval.
pub struct ConflationScheduler {
    conflaters: Vec<Box<dyn EventConflater>>,
    interval: Duration,
    last_flush: Mutex<Instant>,
    delivered: Signal<LayerEvent>,
    attached: Mutex<Vec<(Weak<dyn Layer>, ConnectionId)>>,
}

impl ConflationScheduler {
    /// A scheduler with a [`VisualChangeConflater`] and the default interval.
    pub fn new() -> Self {
        Self::with_conflaters(
            vec![Box::new(VisualChangeConflater::new())],
            DEFAULT_CONFLATION_INTERVAL,
        )
    }

    pub fn with_conflaters(conflaters: Vec<Box<dyn EventConflater>>, interval: Duration) -> Self {
        Self {
            conflaters,
            interval,
            last_flush: Mutex::new(Instant::now()),
            delivered: Signal::new(),
            attached: Mutex::new(Vec::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Events ready for the host: immediate ones as they come, conflated ones
    /// on flush.
    pub fn delivered(&self) -> &Signal<LayerEvent> {
        &self.delivered
    }

    /// Feed every event fired by `layer` into this scheduler.
    pub fn attach(self: &Arc<Self>, layer: &Arc<dyn Layer>) {
        let scheduler = Arc::downgrade(self);
        let connection = layer.base().add_layer_listener(move |event: &LayerEvent| {
            if let Some(scheduler) = scheduler.upgrade() {
                scheduler.submit(event.clone());
            }
        });
        self.attached.lock().push((Arc::downgrade(layer), connection));
    }

    /// Stop listening to every attached layer.
    pub fn detach_all(&self) {
        let attached = std::mem::take(&mut *self.attached.lock());
        for (layer, connection) in attached {
            if let Some(layer) = layer.upgrade() {
                layer.base().remove_layer_listener(connection);
            }
        }
    }

    /// Queue `event` in the first conflater that accepts it, or deliver it now.
    pub fn submit(&self, event: LayerEvent) {
        match self.conflaters.iter().find(|c| c.accepts(&event)) {
            Some(conflater) => conflater.add_event(event),
            None => {
                self.delivered.emit(event);
            }
        }
    }

    /// Number of queued events.
    pub fn pending(&self) -> usize {
        self.conflaters.iter().map(|c| c.pending()).sum()
    }

    /// Flush if at least one interval passed since the last flush. Returns the
    /// number of events delivered.
    pub fn flush_due(&self, now: Instant) -> usize {
        {
            let last = self.last_flush.lock();
            if now.saturating_duration_since(*last) < self.interval {
                return 0;
            }
        }
        self.flush_at(now)
    }

    /// Deliver every queued event now.
    pub fn flush(&self) -> usize {
        self.flush_at(Instant::now())
    }

    fn flush_at(&self, now: Instant) -> usize {
        let _span = PerfSpan::new(span_names::CONFLATION);
        *self.last_flush.lock() = now;
        let pending = self.pending();
        let events: Vec<LayerEvent> = self.conflaters.iter().flat_map(|c| c.drain()).collect();
        if pending > 0 {
            tracing::trace!(
                target: targets::EVENT,
                pending,
                delivered = events.len(),
                "flushing conflated events"
            );
        }
        let count = events.len();
        for event in events {
            self.delivered.emit(event);
        }
        count
    }
}

impl Default for ConflationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConflationScheduler {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{Orientation, Range};
    use crate::event::{SelectionChange, SelectionKind};
    use crate::layer::LayerBase;

    fn recorder(scheduler: &ConflationScheduler) -> Arc<Mutex<Vec<LayerEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        scheduler
            .delivered()
            .connect(move |event: &LayerEvent| sink.lock().push(event.clone()));
        seen
    }

    #[test]
    fn test_cell_changes_coalesce_per_layer() {
        let conflater = VisualChangeConflater::new();
        let id = LayerBase::new("Test").id();
        conflater.add_event(LayerEvent::cell_changed(id, 1, 1));
        conflater.add_event(LayerEvent::cell_changed(id, 2, 1));
        conflater.add_event(LayerEvent::cell_changed(id, 2, 5));
        assert_eq!(conflater.pending(), 3);

        let events = conflater.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::CellVisualChange {
                columns: vec![Range::new(1, 3)],
                rows: vec![Range::single(1), Range::single(5)],
            }
        );
        assert_eq!(conflater.pending(), 0);
    }

    #[test]
    fn test_refresh_absorbs_cell_changes() {
        let conflater = VisualChangeConflater::new();
        let id = LayerBase::new("Test").id();
        conflater.add_event(LayerEvent::cell_changed(id, 1, 1));
        conflater.add_event(LayerEvent::scroll(id, Orientation::Vertical));
        conflater.add_event(LayerEvent::visual_refresh(id));
        let events = conflater.drain();
        assert_eq!(events, vec![LayerEvent::visual_refresh(id)]);
    }

    #[test]
    fn test_selection_bypasses_conflation() {
        let scheduler = ConflationScheduler::new();
        let seen = recorder(&scheduler);
        let id = LayerBase::new("Test").id();

        scheduler.submit(LayerEvent::cell_changed(id, 0, 0));
        scheduler.submit(LayerEvent::selection(
            id,
            SelectionChange {
                kind: SelectionKind::Cells,
                columns: vec![Range::single(0)],
                rows: vec![Range::single(0)],
                reveal: None,
            },
        ));
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].is_selection());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_flush_due_waits_for_interval() {
        let scheduler =
            ConflationScheduler::with_conflaters(vec![Box::new(VisualChangeConflater::new())], Duration::from_millis(20));
        let seen = recorder(&scheduler);
        let id = LayerBase::new("Test").id();
        let start = Instant::now();
        *scheduler.last_flush.lock() = start;

        scheduler.submit(LayerEvent::visual_refresh(id));
        assert_eq!(scheduler.flush_due(start + Duration::from_millis(5)), 0);
        assert!(seen.lock().is_empty());

        assert_eq!(scheduler.flush_due(start + Duration::from_millis(25)), 1);
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }
}
