//! # wsbridge - WebSocket bridge to a foreign socket engine
//!
//! `wsbridge` drives a WebSocket client whose network stack runs in another
//! runtime, reachable only through typed method calls and asynchronous
//! callbacks. The crate does not speak the WebSocket protocol itself.
//!
//! ## Features
//!
//! - **Typed call marshaling** with signatures derived from argument types
//! - **Scoped reference cleanup** for every transient foreign object
//! - **Per-connection state machine** reconciling commands and events
//! - **Registry** for id allocation, event routing and bulk close
//! - **Optional tokio hand-off** to run delegates off the engine's threads
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wsbridge::{BridgeConfig, CallMarshaler, Connection, ConnectionRegistry};
//!
//! let registry = ConnectionRegistry::shared();
//! let marshaler = CallMarshaler::new(runtime);
//! let conn = Connection::open(
//!     &registry,
//!     &marshaler,
//!     &BridgeConfig::default(),
//!     Arc::new(MyDelegate),
//!     "wss://example.com/socket",
//!     &[],
//!     "",
//! )?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod extensions;
pub mod loopback;
pub mod marshal;
pub mod message;
pub mod registry;

#[cfg(feature = "async-tokio")]
pub mod dispatch;

pub use config::{BridgeConfig, DEFAULT_COUNTERPART_CLASS};
pub use connection::{Bridge, Connection, ConnectionState, Delegate, ResponseHeaders};
pub use error::{Error, Result};
pub use extensions::{ExtensionOffer, ExtensionParam};
pub use loopback::LoopbackRuntime;
pub use marshal::{Arg, CallMarshaler, ForeignRuntime, GlobalRef};
pub use message::{CloseCode, CloseEvent, ErrorCode, ForeignEvent, MessageData};
pub use registry::{ConnectionId, ConnectionRegistry};

#[cfg(feature = "async-tokio")]
pub use dispatch::{EventPump, EventQueue, event_queue};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_public_types_are_send() {
        assert_send::<Error>();
        assert_send::<BridgeConfig>();
        assert_send::<Bridge>();
        assert_send::<Connection>();
        assert_send::<ConnectionRegistry>();
        assert_send::<CallMarshaler>();
        assert_send::<GlobalRef>();
        assert_send::<ForeignEvent>();
        assert_send::<MessageData>();
        assert_send::<ConnectionState>();
    }

    #[test]
    fn test_public_types_are_sync() {
        assert_sync::<Error>();
        assert_sync::<BridgeConfig>();
        assert_sync::<Bridge>();
        assert_sync::<Connection>();
        assert_sync::<ConnectionRegistry>();
        assert_sync::<CallMarshaler>();
        assert_sync::<GlobalRef>();
        assert_sync::<LoopbackRuntime>();
        assert_sync::<MessageData>();
    }

    #[cfg(feature = "async-tokio")]
    #[test]
    fn test_event_queue_is_send() {
        assert_send::<EventQueue>();
        assert_send::<EventPump>();
    }
}
