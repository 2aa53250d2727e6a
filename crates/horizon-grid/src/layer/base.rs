use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{ConnectionId, Signal};

use super::Layer;
use crate::command::LayerCommand;
use crate::config::{ConfigLabelAccumulator, LabelStack};
use crate::event::LayerEvent;

/// Counter for generating unique layer IDs.
static LAYER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a layer instance, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    fn next() -> Self {
        LayerId(LAYER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type HandlerFn = Arc<dyn Fn(&dyn Layer, &dyn LayerCommand) -> bool + Send + Sync>;

#[derive(Clone)]
struct RegisteredHandler {
    command_type: TypeId,
    handler: HandlerFn,
}

/// A listener this layer registered on an underlying layer.
struct Registration {
    underlying: Weak<dyn Layer>,
    connection: ConnectionId,
}

/// State every layer carries: identity, listeners, custom command handlers
/// and the label accumulator.
pub struct LayerBase {
    id: LayerId,
    name: &'static str,
    listeners: Signal<LayerEvent>,
    command_handlers: RwLock<Arc<Vec<RegisteredHandler>>>,
    label_accumulator: RwLock<Option<Arc<dyn ConfigLabelAccumulator>>>,
    registrations: Mutex<Vec<Registration>>,
    disposed: AtomicBool,
}

impl LayerBase {
    pub fn new(name: &'static str) -> Self {
        Self {
            id: LayerId::next(),
            name,
            listeners: Signal::new(),
            command_handlers: RwLock::new(Arc::new(Vec::new())),
            label_accumulator: RwLock::new(None),
            registrations: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// The listeners of this layer's events.
    pub fn listeners(&self) -> &Signal<LayerEvent> {
        &self.listeners
    }

    /// Register a host-side listener. Each listener receives its own clone.
    pub fn add_layer_listener<F>(&self, listener: F) -> ConnectionId
    where
        F: Fn(&LayerEvent) + Send + Sync + 'static,
    {
        self.listeners.connect(listener)
    }

    pub fn remove_layer_listener(&self, id: ConnectionId) -> bool {
        self.listeners.disconnect(id)
    }

    /// Deliver an event to every listener.
    pub fn fire_layer_event(&self, event: LayerEvent) {
        tracing::trace!(
            target: targets::EVENT,
            layer = self.name,
            id = %self.id,
            kind = event.kind_name(),
            "firing layer event"
        );
        self.listeners.emit(event);
    }

    /// Make `owner` receive the events fired by `underlying`.
    ///
    /// The listener holds `owner` weakly; once `owner` is dropped events are
    /// ignored until [`dispose`](Self::dispose) removes the registration.
    pub fn listen_to(&self, owner: Weak<dyn Layer>, underlying: &Arc<dyn Layer>) {
        let connection = underlying.base().listeners.connect(move |event: &LayerEvent| {
            if let Some(owner) = owner.upgrade() {
                owner.handle_layer_event(event.clone());
            }
        });
        self.registrations.lock().push(Registration {
            underlying: Arc::downgrade(underlying),
            connection,
        });
    }

    // =========================================================================
    // Command handlers
    // =========================================================================

    /// Register a handler tried before the layer's built-in handling.
    ///
    /// The handler receives the command as issued; it converts coordinates
    /// itself with [`LayerCommand::convert_to_target_layer`] on a clone.
    /// Returning `true` ends dispatch.
    pub fn register_command_handler<C, F>(&self, handler: F)
    where
        C: LayerCommand,
        F: Fn(&dyn Layer, &C) -> bool + Send + Sync + 'static,
    {
        let handler: HandlerFn = Arc::new(move |layer: &dyn Layer, command: &dyn LayerCommand| {
            command
                .downcast_ref::<C>()
                .is_some_and(|command| handler(layer, command))
        });
        let mut guard = self.command_handlers.write();
        let mut next = Vec::clone(&guard);
        next.push(RegisteredHandler {
            command_type: TypeId::of::<C>(),
            handler,
        });
        *guard = Arc::new(next);
    }

    /// Remove every handler registered for command type `C`.
    pub fn unregister_command_handler<C: LayerCommand>(&self) {
        let mut guard = self.command_handlers.write();
        let next: Vec<_> = guard
            .iter()
            .filter(|h| h.command_type != TypeId::of::<C>())
            .cloned()
            .collect();
        *guard = Arc::new(next);
    }

    /// Run the registered handlers for `command` against `layer`.
    pub fn do_registered_command(&self, layer: &dyn Layer, command: &dyn LayerCommand) -> bool {
        let handlers = self.command_handlers.read().clone();
        let command_type = command.as_any().type_id();
        handlers
            .iter()
            .filter(|h| h.command_type == command_type)
            .any(|h| (h.handler)(layer, command))
    }

    // =========================================================================
    // Labels
    // =========================================================================

    pub fn set_label_accumulator(&self, accumulator: Option<Arc<dyn ConfigLabelAccumulator>>) {
        *self.label_accumulator.write() = accumulator;
    }

    pub fn accumulate_labels(
        &self,
        labels: &mut LabelStack,
        column_position: usize,
        row_position: usize,
        column_index: Option<usize>,
        row_index: Option<usize>,
    ) {
        let accumulator = self.label_accumulator.read().clone();
        if let Some(accumulator) = accumulator {
            accumulator.accumulate_labels(
                labels,
                column_position,
                row_position,
                column_index,
                row_index,
            );
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Disconnect from underlying layers and drop listeners and handlers.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let registrations = std::mem::take(&mut *self.registrations.lock());
        for registration in registrations {
            if let Some(underlying) = registration.underlying.upgrade() {
                underlying.base().listeners.disconnect(registration.connection);
            }
        }
        self.listeners.disconnect_all();
        *self.command_handlers.write() = Arc::new(Vec::new());
        tracing::debug!(target: targets::LAYER, layer = self.name, id = %self.id, "layer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for LayerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBase")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("listeners", &self.listeners.connection_count())
            .finish()
    }
}
