//! Hand-off of engine events to a consumer of the application's choosing.
//!
//! The engine delivers events on its own threads. Calling
//! [`ConnectionRegistry::dispatch`] there runs delegates on those threads.
//! To run them elsewhere, post events into an [`EventQueue`] and deliver
//! them from an [`EventPump`], either by polling [`EventPump::drain`] from a
//! frame loop or by spawning [`EventPump::run`] on a tokio runtime.
//!
//! Events are delivered in the order they were posted.
//!
//! ```rust,ignore
//! let (queue, pump) = event_queue(registry.clone());
//! tokio::spawn(pump.run());
//!
//! // engine thread
//! queue.post(handle, ForeignEvent::Text("hi".into()));
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::message::ForeignEvent;
use crate::registry::ConnectionRegistry;

type Posted = (i64, ForeignEvent);

/// Create a connected queue and pump over `registry`.
pub fn event_queue(registry: Arc<ConnectionRegistry>) -> (EventQueue, EventPump) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventQueue { tx }, EventPump { registry, rx })
}

/// Sending side. Cheap to clone, usable from any thread.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Posted>,
}

impl EventQueue {
    /// Queue `event` for the connection with routing handle `handle`.
    ///
    /// Returns `false` if the pump has been dropped.
    pub fn post(&self, handle: i64, event: ForeignEvent) -> bool {
        trace!(handle, event = event.name(), "posting event");
        self.tx.send((handle, event)).is_ok()
    }
}

/// Receiving side. Delivers queued events through the registry.
#[derive(Debug)]
pub struct EventPump {
    registry: Arc<ConnectionRegistry>,
    rx: mpsc::UnboundedReceiver<Posted>,
}

impl EventPump {
    /// Deliver every event queued so far without waiting.
    ///
    /// Returns how many events reached a connection.
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok((handle, event)) = self.rx.try_recv() {
            delivered += usize::from(self.registry.dispatch(handle, event));
        }
        delivered
    }

    /// Deliver events until every [`EventQueue`] has been dropped.
    ///
    /// Returns how many events reached a connection.
    pub async fn run(mut self) -> usize {
        let mut delivered = 0;
        while let Some((handle, event)) = self.rx.recv().await {
            delivered += usize::from(self.registry.dispatch(handle, event));
        }
        debug!(delivered, "event pump finished");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_fails_after_pump_dropped() {
        let (queue, pump) = event_queue(ConnectionRegistry::shared());
        assert!(queue.post(0, ForeignEvent::Text("a".into())));
        drop(pump);
        assert!(!queue.post(0, ForeignEvent::Text("b".into())));
    }

    #[test]
    fn test_drain_unknown_handles() {
        let (queue, mut pump) = event_queue(ConnectionRegistry::shared());
        queue.post(7, ForeignEvent::Text("a".into()));
        queue.post(8, ForeignEvent::Binary(bytes::Bytes::from_static(b"b")));
        assert_eq!(pump.drain(), 0);
        assert_eq!(pump.drain(), 0);
    }

    #[tokio::test]
    async fn test_run_ends_when_queues_dropped() {
        let (queue, pump) = event_queue(ConnectionRegistry::shared());
        let task = tokio::spawn(pump.run());
        queue.post(1, ForeignEvent::Text("x".into()));
        drop(queue);
        assert_eq!(task.await.unwrap(), 0);
    }
}
