//! Signal/slot system for Horizon Grid.
//!
//! Signals are how layers, models and hosts observe each other. A layer's
//! listener list is a [`Signal`] of layer events; the tree row model reports
//! expand/collapse through one as well.
//!
//! # Copy-on-write connections
//!
//! Connections live in an immutable snapshot behind a read/write lock.
//! Connecting or disconnecting builds a new snapshot and swaps it in under the
//! write lock. Emission clones the current snapshot under the read lock and
//! invokes every slot *without* holding the lock, so a slot may connect or
//! disconnect other slots (or itself) while the signal is being emitted. Such
//! changes take effect from the next emission.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let resized = Signal::<(usize, i32)>::new();
//!
//! let conn_id = resized.connect(|(position, width)| {
//!     println!("column {} is now {}px wide", position, width);
//! });
//!
//! resized.emit((3, 150));
//! resized.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connection, passed back to [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// A connected slot.
pub type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// An immutable view of the connections at one point in time.
pub type SlotSnapshot<Args> = Arc<SlotMap<ConnectionId, Slot<Args>>>;

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(usize, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots are invoked synchronously on the
/// emitting thread.
pub struct Signal<Args> {
    connections: RwLock<SlotSnapshot<Args>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(Arc::new(SlotMap::with_key())),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut guard = self.connections.write();
        let mut next = SlotMap::clone(&guard);
        let id = next.insert(Arc::new(slot));
        *guard = Arc::new(next);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut guard = self.connections.write();
        if !guard.contains_key(id) {
            return false;
        }
        let mut next = SlotMap::clone(&guard);
        next.remove(id);
        *guard = Arc::new(next);
        true
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        *self.connections.write() = Arc::new(SlotMap::with_key());
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// While blocked, `emit` invokes nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// The connections as of now.
    pub fn snapshot(&self) -> SlotSnapshot<Args> {
        self.connections.read().clone()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// Returns the number of slots invoked.
    #[tracing::instrument(skip_all, target = "horizon_grid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        self.emit_ref(&args)
    }

    /// Emit the signal with borrowed arguments.
    pub fn emit_ref(&self, args: &Args) -> usize {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return 0;
        }

        let snapshot = self.snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for slot in snapshot.values() {
            slot(args);
        }
        snapshot.len()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &T| sink.lock().push(value.clone()))
    }

    #[test]
    fn test_emit_reaches_slots_in_order() {
        let resized = Signal::<(usize, i32)>::new();
        let (first, slot) = recorder();
        resized.connect(slot);
        let (second, slot) = recorder();
        resized.connect(slot);

        assert_eq!(resized.emit((3, 150)), 2);
        resized.emit((4, 80));

        assert_eq!(*first.lock(), vec![(3, 150), (4, 80)]);
        assert_eq!(*second.lock(), *first.lock());
    }

    #[test]
    fn test_disconnected_slot_stops_receiving() {
        let hidden = Signal::<usize>::new();
        let (seen, slot) = recorder();
        let id = hidden.connect(slot);

        hidden.emit(7);
        assert!(hidden.disconnect(id));
        assert!(!hidden.disconnect(id));
        hidden.emit(8);

        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn test_blocked_signal_skips_slots() {
        let changed = Signal::<usize>::new();
        let (seen, slot) = recorder();
        changed.connect(slot);

        changed.set_blocked(true);
        assert!(changed.is_blocked());
        assert_eq!(changed.emit(1), 0);
        changed.set_blocked(false);
        changed.emit(2);

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();
        for _ in 0..5 {
            signal.connect(|_| {});
        }
        assert_eq!(signal.connection_count(), 5);

        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
        assert_eq!(signal.emit(()), 0);
    }

    #[test]
    fn test_connect_during_emit_applies_next_time() {
        let signal = Arc::new(Signal::<()>::new());
        let count = Arc::new(Mutex::new(0));

        let signal_clone = Arc::downgrade(&signal);
        let count_clone = count.clone();
        signal.connect(move |_| {
            *count_clone.lock() += 1;
            if let Some(signal) = signal_clone.upgrade() {
                let count_inner = count_clone.clone();
                signal.connect(move |_| *count_inner.lock() += 10);
            }
        });

        assert_eq!(signal.emit(()), 1);
        assert_eq!(*count.lock(), 1);
        assert_eq!(signal.connection_count(), 2);

        assert_eq!(signal.emit(()), 2);
        assert_eq!(*count.lock(), 12);
    }

    #[test]
    fn test_disconnect_self_during_emit() {
        let signal = Arc::new(Signal::<i32>::new());
        let id_slot = Arc::new(Mutex::new(None));
        let hits = Arc::new(Mutex::new(0));

        let weak = Arc::downgrade(&signal);
        let id_clone = id_slot.clone();
        let hits_clone = hits.clone();
        let id = signal.connect(move |_| {
            *hits_clone.lock() += 1;
            if let (Some(signal), Some(id)) = (weak.upgrade(), *id_clone.lock()) {
                signal.disconnect(id);
            }
        });
        *id_slot.lock() = Some(id);

        signal.emit(1);
        signal.emit(2);
        assert_eq!(*hits.lock(), 1);
        assert_eq!(signal.connection_count(), 0);
    }
}
