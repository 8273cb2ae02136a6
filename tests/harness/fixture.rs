use std::sync::{Arc, Once};

use wsbridge::loopback::LoopbackRuntime;
use wsbridge::{
    BridgeConfig, CallMarshaler, Connection, ConnectionRegistry, DEFAULT_COUNTERPART_CLASS,
    Delegate, ForeignEvent,
};

use super::RecordingDelegate;

/// Install a `tracing` subscriber once per test binary.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `Open` event with the given protocol and header blob.
pub fn open_event(protocol: &str, headers: &str) -> ForeignEvent {
    ForeignEvent::Open {
        protocol: protocol.to_string(),
        headers: headers.to_string(),
    }
}

/// Loopback runtime, registry and marshaler wired together.
pub struct Fixture {
    pub runtime: Arc<LoopbackRuntime>,
    pub registry: Arc<ConnectionRegistry>,
    pub marshaler: CallMarshaler,
    pub config: BridgeConfig,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let runtime = Arc::new(LoopbackRuntime::new());
        runtime.define_socket_class(DEFAULT_COUNTERPART_CLASS);
        let marshaler = CallMarshaler::new(runtime.clone());
        Self {
            runtime,
            registry: ConnectionRegistry::shared(),
            marshaler,
            config: BridgeConfig::default(),
        }
    }

    /// Open a connection with `delegate`, left in `Connecting`.
    pub fn open_with(&self, delegate: Arc<dyn Delegate>) -> Connection {
        Connection::open(
            &self.registry,
            &self.marshaler,
            &self.config,
            delegate,
            "wss://echo.example.com/socket",
            &["chat".to_string()],
            "",
        )
        .expect("loopback counterpart is declared")
    }

    /// Open a connection with a fresh recording delegate.
    pub fn open(&self) -> (Connection, Arc<RecordingDelegate>) {
        let delegate = RecordingDelegate::new();
        (self.open_with(delegate.clone()), delegate)
    }

    /// Open a connection and deliver its `Open` event.
    pub fn open_and_accept(&self) -> (Connection, Arc<RecordingDelegate>) {
        let (conn, delegate) = self.open();
        assert!(self.deliver(&conn, open_event("chat", "")));
        (conn, delegate)
    }

    /// Route `event` to `conn` through the registry.
    pub fn deliver(&self, conn: &Connection, event: ForeignEvent) -> bool {
        self.registry.dispatch(conn.id().as_i64(), event)
    }
}
