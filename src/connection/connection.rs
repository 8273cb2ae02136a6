use std::ops::Deref;
use std::sync::Arc;

use tracing::{debug, error};

use super::bridge::Bridge;
use super::delegate::Delegate;
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::marshal::{Arg, CallMarshaler};
use crate::registry::ConnectionRegistry;

/// An application-owned bridged WebSocket connection.
///
/// Opening a `Connection` constructs the foreign counterpart and asks it to
/// connect; events then arrive through [`ConnectionRegistry::dispatch`].
/// Dropping it unregisters the connection, detaches the engine's handler and
/// releases the foreign object, whatever state the connection is in.
///
/// `Connection` derefs to [`Bridge`] for sending, closing and inspection.
///
/// ## Example
///
/// ```rust,ignore
/// use wsbridge::{BridgeConfig, CallMarshaler, Connection, ConnectionRegistry};
///
/// let registry = ConnectionRegistry::shared();
/// let marshaler = CallMarshaler::new(runtime);
/// let conn = Connection::open(
///     &registry,
///     &marshaler,
///     &BridgeConfig::default(),
///     delegate,
///     "wss://echo.example.com",
///     &["chat".to_string()],
///     "",
/// )?;
///
/// // later, from the engine's thread:
/// registry.dispatch(handle, ForeignEvent::Text("hi".into()));
///
/// conn.send_text("hello");
/// conn.close();
/// ```
pub struct Connection {
    bridge: Arc<Bridge>,
    registry: Arc<ConnectionRegistry>,
}

impl Connection {
    /// Create the foreign counterpart and start connecting.
    ///
    /// The connection is left in `Connecting`. An empty `ca_file_path`
    /// selects the platform trust store.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` does not validate.
    /// - [`Error::CounterpartUnavailable`] if the counterpart cannot be
    ///   constructed. Nothing is registered in that case.
    pub fn open(
        registry: &Arc<ConnectionRegistry>,
        marshaler: &CallMarshaler,
        config: &BridgeConfig,
        delegate: Arc<dyn Delegate>,
        url: &str,
        protocols: &[String],
        ca_file_path: &str,
    ) -> Result<Self> {
        config.validate()?;

        let id = registry.next_id();
        let handle = id.as_i64();
        let protocol = protocols.join(", ");
        let headers = config.header_list();

        let counterpart = marshaler
            .try_new_object(
                &config.class_name,
                &[
                    Arg::from(id.as_i64()),
                    Arg::from(handle),
                    Arg::from(&headers),
                    Arg::from(config.tcp_no_delay),
                    Arg::from(config.per_message_deflate),
                    Arg::from(config.timeout_millis()),
                ],
            )
            .map_err(|err| {
                error!(
                    %id,
                    class = %config.class_name,
                    error = %err,
                    "failed to create socket counterpart"
                );
                Error::CounterpartUnavailable(err.to_string())
            })?;

        let bridge = Arc::new(Bridge::new(
            id,
            url.to_string(),
            protocol,
            config.class_name.clone(),
            delegate,
            marshaler.clone(),
            counterpart,
        ));
        registry.register(id, &bridge);
        bridge.connect(ca_file_path);

        Ok(Self {
            bridge,
            registry: Arc::clone(registry),
        })
    }

    /// The shared bridge behind this connection.
    #[must_use]
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// The registry this connection is registered in.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

impl Deref for Connection {
    type Target = Bridge;

    fn deref(&self) -> &Bridge {
        &self.bridge
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let id = self.bridge.id();
        debug!(%id, state = %self.bridge.state(), "dropping connection");
        self.registry.unregister(id);
        self.bridge.detach();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Connection").field(&self.bridge).finish()
    }
}
