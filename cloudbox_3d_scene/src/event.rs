//! Typed publish/subscribe registry for scene notifications.
//!
//! The coordinator *owns* a registry rather than inheriting dispatcher
//! behavior; viewports and UI layers subscribe per event kind and receive
//! callbacks in registration order. Listener handles are stable slotmap
//! keys, so unsubscribing one listener never invalidates another's handle.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle for a subscribed listener.
    ///
    /// Returned by [`EventRegistry::subscribe`]; pass it back to
    /// [`EventRegistry::unsubscribe`] to detach.
    pub struct ListenerKey;
}

/// Notification emitted by the shared scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// Objects were added to (or updated in) the box pool
    AddObject { ids: Vec<String> },
    /// Objects were removed from the box pool
    RemoveObject { ids: Vec<String> },
    /// The selection was replaced wholesale
    Select { ids: Vec<String> },
    /// All annotation data was cleared
    ClearData,
    /// The point-cloud dataset changed
    PointsChange,
    /// A coalesced frame pass is about to run
    RenderBefore,
    /// A coalesced frame pass just finished
    RenderAfter,
}

/// Discriminant of [`SceneEvent`], used to key subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AddObject,
    RemoveObject,
    Select,
    ClearData,
    PointsChange,
    RenderBefore,
    RenderAfter,
}

impl SceneEvent {
    /// The subscription kind this event dispatches under.
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::AddObject { .. } => EventKind::AddObject,
            SceneEvent::RemoveObject { .. } => EventKind::RemoveObject,
            SceneEvent::Select { .. } => EventKind::Select,
            SceneEvent::ClearData => EventKind::ClearData,
            SceneEvent::PointsChange => EventKind::PointsChange,
            SceneEvent::RenderBefore => EventKind::RenderBefore,
            SceneEvent::RenderAfter => EventKind::RenderAfter,
        }
    }
}

/// Listener callback type.
pub type Callback = Box<dyn FnMut(&SceneEvent) + Send>;

struct Listener {
    kind: EventKind,
    callback: Callback,
}

/// Publish/subscribe registry keyed by event kind.
///
/// Dispatch order among multiple subscribers to the same kind is
/// registration order. Dispatch is synchronous: callbacks run on the
/// caller's stack before the emitting operation returns.
#[derive(Default)]
pub struct EventRegistry {
    listeners: SlotMap<ListenerKey, Listener>,
    /// Registration order per kind
    order: FxHashMap<EventKind, Vec<ListenerKey>>,
}

impl EventRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
            order: FxHashMap::default(),
        }
    }

    /// Subscribe a callback to one event kind.
    ///
    /// Returns a stable key that remains valid until unsubscribed.
    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> ListenerKey
    where
        F: FnMut(&SceneEvent) + Send + 'static,
    {
        let key = self.listeners.insert(Listener {
            kind,
            callback: Box::new(callback),
        });
        self.order.entry(kind).or_default().push(key);
        key
    }

    /// Detach a listener. Unknown or already-removed keys are ignored.
    pub fn unsubscribe(&mut self, key: ListenerKey) {
        if let Some(listener) = self.listeners.remove(key) {
            if let Some(order) = self.order.get_mut(&listener.kind) {
                order.retain(|k| *k != key);
            }
        }
    }

    /// Dispatch an event to every subscriber of its kind, in
    /// registration order.
    pub fn dispatch(&mut self, event: &SceneEvent) {
        let keys = match self.order.get(&event.kind()) {
            Some(keys) => keys.clone(),
            None => return,
        };
        for key in keys {
            if let Some(listener) = self.listeners.get_mut(key) {
                (listener.callback)(event);
            }
        }
    }

    /// Number of attached listeners across all kinds
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Detach all listeners
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.order.clear();
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
