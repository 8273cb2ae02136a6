//! Per-connection state machine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::delegate::Delegate;
use super::headers::ResponseHeaders;
use super::state::ConnectionState;
use crate::error::Result;
use crate::extensions::ExtensionOffer;
use crate::marshal::{Arg, CallMarshaler, GlobalRef};
use crate::message::{CloseCode, CloseEvent, ErrorCode, ForeignEvent, MessageData};
use crate::registry::ConnectionId;

const METHOD_CONNECT: &str = "_connect";
const METHOD_SEND: &str = "_send";
const METHOD_CLOSE: &str = "_close";
const METHOD_BUFFERED_AMOUNT: &str = "_getBufferedAmountID";
const METHOD_REMOVE_HANDLER: &str = "_removeHandler";

/// Reason sent with a default close request.
pub const NORMAL_CLOSURE_REASON: &str = "normal closure";

#[derive(Debug, Default)]
struct Inner {
    state: ConnectionState,
    negotiated_protocol: String,
    headers: ResponseHeaders,
    extensions: String,
    error_notified: bool,
    close_notified: bool,
}

/// Shared core of a connection.
///
/// A `Bridge` reconciles commands issued by the application with events
/// delivered by the engine. It is owned by its [`Connection`](super::Connection)
/// and borrowed by the registry while an event is being handled.
///
/// All state transitions happen under one lock. Delegate callbacks and
/// foreign calls run after the lock is released.
pub struct Bridge {
    id: ConnectionId,
    url: String,
    protocol: String,
    class_name: String,
    delegate: Arc<dyn Delegate>,
    marshaler: CallMarshaler,
    handle: GlobalRef,
    inner: Mutex<Inner>,
    detached: AtomicBool,
}

impl Bridge {
    pub(crate) fn new(
        id: ConnectionId,
        url: String,
        protocol: String,
        class_name: String,
        delegate: Arc<dyn Delegate>,
        marshaler: CallMarshaler,
        handle: GlobalRef,
    ) -> Self {
        Self {
            id,
            url,
            protocol,
            class_name,
            delegate,
            marshaler,
            handle,
            inner: Mutex::new(Inner::default()),
            detached: AtomicBool::new(false),
        }
    }

    /// Connection identifier, also used as the routing handle.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// URL the connection was opened with.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Requested subprotocols joined with `", "`.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Subprotocol selected by the server, empty until open.
    #[must_use]
    pub fn negotiated_protocol(&self) -> String {
        self.inner.lock().negotiated_protocol.clone()
    }

    /// Raw `Sec-WebSocket-Extensions` value, empty if absent.
    #[must_use]
    pub fn extensions(&self) -> String {
        self.inner.lock().extensions.clone()
    }

    /// Negotiated extensions, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`](crate::Error::InvalidExtension) if
    /// the server sent an unparsable value.
    pub fn negotiated_extensions(&self) -> Result<Vec<ExtensionOffer>> {
        ExtensionOffer::parse_header(&self.extensions())
    }

    /// Response headers received when the connection opened.
    #[must_use]
    pub fn response_headers(&self) -> ResponseHeaders {
        self.inner.lock().headers.clone()
    }

    /// The delegate receiving this connection's events.
    #[must_use]
    pub fn delegate(&self) -> &Arc<dyn Delegate> {
        &self.delegate
    }

    /// Whether the owning connection has been dropped.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    /// Send a text message. Ignored unless the connection is open.
    pub fn send_text(&self, text: &str) {
        if self.check_sendable("text") {
            trace!(id = %self.id, len = text.len(), "sending text");
            self.call_void(METHOD_SEND, &[Arg::from(text)]);
        }
    }

    /// Send a binary message. Ignored unless the connection is open.
    pub fn send_binary(&self, data: &[u8]) {
        if self.check_sendable("binary") {
            trace!(id = %self.id, len = data.len(), "sending binary");
            self.call_void(METHOD_SEND, &[Arg::array(data)]);
        }
    }

    fn check_sendable(&self, kind: &str) -> bool {
        let state = self.state();
        if !state.can_send() {
            warn!(id = %self.id, %state, kind, "send ignored, connection is not open");
            return false;
        }
        true
    }

    /// Request a normal close. Never blocks.
    pub fn close(&self) {
        self.close_async();
    }

    /// Request a normal close (1000, "normal closure").
    pub fn close_async(&self) {
        self.close_async_with(CloseCode::Normal, NORMAL_CLOSURE_REASON);
    }

    /// Request a close with a custom code and reason.
    ///
    /// No-op if a close was already requested or the connection is closed.
    /// Reserved codes such as 1005 and 1006 are ignored and leave the state
    /// unchanged.
    pub fn close_async_with(&self, code: CloseCode, reason: &str) {
        if !code.is_valid() {
            warn!(id = %self.id, %code, "close ignored, code is reserved");
            return;
        }
        {
            let mut inner = self.inner.lock();
            if inner.state.is_closing_or_closed() {
                warn!(id = %self.id, state = %inner.state, "close ignored, already closing");
                return;
            }
            inner.state.advance(ConnectionState::Closing);
        }
        debug!(id = %self.id, %code, reason, "closing");
        self.call_void(
            METHOD_CLOSE,
            &[Arg::from(i32::from(code.as_u16())), Arg::from(reason)],
        );
    }

    /// Bytes queued in the engine but not yet sent. 0 on failure.
    #[must_use]
    pub fn buffered_amount(&self) -> u64 {
        let amount = self.marshaler.call_long(
            self.handle.as_object(),
            &self.class_name,
            METHOD_BUFFERED_AMOUNT,
            &[],
        );
        u64::try_from(amount).unwrap_or(0)
    }

    /// The handshake finished.
    ///
    /// Headers and the selected protocol are always recorded. The open is
    /// absorbed if a close was already requested.
    pub fn on_open(&self, protocol: &str, header_blob: &str) {
        let headers = ResponseHeaders::parse(header_blob);
        let extensions = headers.extensions();
        let opened = {
            let mut inner = self.inner.lock();
            inner.negotiated_protocol = protocol.to_string();
            inner.headers = headers;
            inner.extensions = extensions;
            if inner.state.is_closing_or_closed() {
                false
            } else {
                inner.state.advance(ConnectionState::Open)
            }
        };

        if !opened {
            debug!(id = %self.id, state = %self.state(), "open absorbed, connection is closing");
            return;
        }
        debug!(id = %self.id, protocol, "open");
        if !self.is_detached() {
            self.delegate.on_open(self);
        }
    }

    /// A message arrived. Delivered whatever the state.
    pub fn on_message(&self, message: MessageData) {
        trace!(id = %self.id, len = message.len(), binary = message.is_binary, "message");
        if !self.is_detached() {
            self.delegate.on_message(self, &message);
        }
    }

    /// The connection closed. The delegate hears about it once.
    pub fn on_close(&self, event: CloseEvent) {
        let first = {
            let mut inner = self.inner.lock();
            inner.state.advance(ConnectionState::Closed);
            !std::mem::replace(&mut inner.close_notified, true)
        };

        if !first {
            trace!(id = %self.id, "duplicate close dropped");
            return;
        }
        debug!(
            id = %self.id,
            code = %event.code,
            reason = %event.reason,
            clean = event.was_clean,
            "closed"
        );
        if !self.is_detached() {
            self.delegate.on_close(self, &event);
        }
    }

    /// The engine failed.
    ///
    /// Unless already closed, the state becomes `Closed` and the delegate's
    /// error callback runs once. An unclean close follows in every case.
    pub fn on_error(&self, code: i32, reason: &str) {
        let notify = {
            let mut inner = self.inner.lock();
            let notify = inner.state != ConnectionState::Closed && !inner.error_notified;
            if notify {
                inner.state.advance(ConnectionState::Closed);
                inner.error_notified = true;
            }
            notify
        };

        let error = ErrorCode::from_code(code);
        warn!(id = %self.id, %error, reason, "engine error");
        if notify && !self.is_detached() {
            self.delegate.on_error(self, error);
        }
        self.on_close(CloseEvent::abnormal(reason));
    }

    /// Route one engine event to its handler.
    pub fn handle_event(&self, event: ForeignEvent) {
        match event {
            ForeignEvent::Open { protocol, headers } => self.on_open(&protocol, &headers),
            ForeignEvent::Text(text) => self.on_message(MessageData::text(text)),
            ForeignEvent::Binary(payload) => self.on_message(MessageData::binary(payload)),
            ForeignEvent::Closed { code, reason } => {
                self.on_close(CloseEvent::new(CloseCode::from_foreign(code), reason, true));
            }
            ForeignEvent::Error { code, reason } => self.on_error(code, &reason),
        }
    }

    /// Stop delegate notification and tell the engine to drop its handler.
    pub(crate) fn detach(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(id = %self.id, state = %self.state(), "detaching");
        self.call_void(METHOD_REMOVE_HANDLER, &[]);
    }

    pub(crate) fn connect(&self, ca_file_path: &str) {
        debug!(id = %self.id, url = %self.url, protocol = %self.protocol, "connecting");
        self.call_void(
            METHOD_CONNECT,
            &[
                Arg::from(self.url.as_str()),
                Arg::from(self.protocol.as_str()),
                Arg::from(ca_file_path),
            ],
        );
    }

    fn call_void(&self, method: &str, args: &[Arg<'_>]) {
        self.marshaler
            .call_void(self.handle.as_object(), &self.class_name, method, args);
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("state", &self.state())
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
