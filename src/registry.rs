//! Connection registry: id allocation, bulk close, and event routing.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::connection::Bridge;
use crate::message::ForeignEvent;

/// Process-unique connection identifier.
///
/// The same value is handed to the engine as the routing handle for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(i64);

impl ConnectionId {
    /// Wrap a raw identifier received from the engine.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier as passed to the engine.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks every live connection of a process.
///
/// There are two tables. The live table answers "which connections are
/// open" and is emptied by [`close_all_connections`](Self::close_all_connections).
/// The routing table maps handles to bridges for [`dispatch`](Self::dispatch)
/// and keeps an entry until the connection is dropped, so the close events
/// triggered by a bulk close still arrive.
///
/// Both tables hold weak references; the [`Connection`](crate::Connection)
/// owns its bridge.
pub struct ConnectionRegistry {
    next_id: AtomicI64,
    live: Mutex<HashMap<ConnectionId, Weak<Bridge>>>,
    routes: Mutex<HashMap<ConnectionId, Weak<Bridge>>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(0),
            live: Mutex::new(HashMap::new()),
            routes: Mutex::new(HashMap::new()),
        }
    }
}

impl ConnectionRegistry {
    /// Create an empty registry. The first allocated id is 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind an `Arc`, ready to share.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Allocate the next identifier. Never returns the same value twice.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a bridge to both tables.
    pub fn register(&self, id: ConnectionId, bridge: &Arc<Bridge>) {
        let weak = Arc::downgrade(bridge);
        self.routes.lock().insert(id, weak.clone());
        self.live.lock().insert(id, weak);
        debug!(%id, "registered connection");
    }

    /// Remove a bridge from both tables.
    pub fn unregister(&self, id: ConnectionId) {
        self.live.lock().remove(&id);
        self.routes.lock().remove(&id);
        debug!(%id, "unregistered connection");
    }

    /// Ask every live connection to close.
    ///
    /// The live table is swapped for an empty one first, so connections
    /// registered during the call are left alone. Returns the number of
    /// connections that were asked to close.
    pub fn close_all_connections(&self) -> usize {
        let detached = std::mem::take(&mut *self.live.lock());
        let mut closed = 0;
        for bridge in detached.into_values().filter_map(|weak| weak.upgrade()) {
            bridge.close_async();
            closed += 1;
        }
        debug!(closed, "closed all connections");
        closed
    }

    /// Deliver an engine event to the connection registered under `handle`.
    ///
    /// Returns `false` if no such connection exists any more.
    pub fn dispatch(&self, handle: i64, event: ForeignEvent) -> bool {
        let id = ConnectionId::from_raw(handle);
        let bridge = self.routes.lock().get(&id).and_then(Weak::upgrade);
        match bridge {
            Some(bridge) => {
                bridge.handle_event(event);
                true
            }
            None => {
                warn!(%id, event = event.name(), "event for unknown connection dropped");
                false
            }
        }
    }

    /// Look up a routable bridge.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<Arc<Bridge>> {
        self.routes.lock().get(&id).and_then(Weak::upgrade)
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    /// Check if there are no live connections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.lock().is_empty()
    }

    /// Check if `id` is a live connection.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.live.lock().contains_key(&id)
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("live", &self.len())
            .field("routes", &self.routes.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_ids_start_at_zero_and_increase() {
        let registry = ConnectionRegistry::new();
        let ids: Vec<_> = (0..4).map(|_| registry.next_id().as_i64()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_concurrent_ids_distinct() {
        let registry = ConnectionRegistry::shared();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || (0..500).map(|_| registry.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8 * 500);
    }

    #[test]
    fn test_dispatch_unknown_handle() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.dispatch(42, ForeignEvent::Text("lost".into())));
        assert!(registry.is_empty());
        assert_eq!(registry.close_all_connections(), 0);
    }
}
