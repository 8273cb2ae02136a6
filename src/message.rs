//! Events crossing the bridge and the values handed to delegates.

use bytes::Bytes;
use std::fmt;

/// WebSocket close status code per RFC 6455 Section 7.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000).
    #[default]
    Normal,
    /// Going away (1001). Endpoint is going away.
    GoingAway,
    /// Protocol error (1002).
    ProtocolError,
    /// Unsupported data (1003).
    UnsupportedData,
    /// No status received (1005). Never sent, only reported.
    NoStatus,
    /// Abnormal closure (1006). Never sent; reported when the connection
    /// dropped without a close handshake.
    Abnormal,
    /// Invalid payload (1007).
    InvalidPayload,
    /// Policy violation (1008).
    PolicyViolation,
    /// Message too big (1009).
    MessageTooBig,
    /// Mandatory extension (1010).
    MandatoryExtension,
    /// Internal error (1011).
    InternalError,
    /// Any other code, including application codes 3000-4999.
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::InternalError,
            other => CloseCode::Other(other),
        }
    }

    /// Map a code received from the foreign engine, which reports it as a
    /// signed int. Values outside `u16` become [`CloseCode::Abnormal`].
    #[must_use]
    pub fn from_foreign(code: i32) -> Self {
        u16::try_from(code).map_or(CloseCode::Abnormal, Self::from_u16)
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::NoStatus => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::MandatoryExtension => 1010,
            CloseCode::InternalError => 1011,
            CloseCode::Other(code) => *code,
        }
    }

    /// Check if an endpoint may put this code in a close request.
    ///
    /// 1000-1003, 1007-1014 and 3000-4999 are sendable; 1004-1006 and 1015
    /// are reserved.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.as_u16(), 1000..=1003 | 1007..=1014 | 3000..=4999)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Close context passed to [`Delegate::on_close`](crate::Delegate::on_close).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close code reported by the engine.
    pub code: CloseCode,
    /// Reason text, possibly empty.
    pub reason: String,
    /// `false` when the close was forced by an error.
    pub was_clean: bool,
}

impl CloseEvent {
    /// Create a close event.
    #[must_use]
    pub fn new(code: CloseCode, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }

    /// The close that follows an error.
    #[must_use]
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(CloseCode::Abnormal, reason, false)
    }
}

/// An inbound message.
///
/// Text payloads are carried as their UTF-8 bytes with `is_binary == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageData {
    /// Message bytes.
    pub payload: Bytes,
    /// Whether the message arrived as a binary frame.
    pub is_binary: bool,
}

impl MessageData {
    /// A text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload: Bytes::from(text.into()),
            is_binary: false,
        }
    }

    /// A binary message.
    #[must_use]
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            is_binary: true,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, for text messages that are valid UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if self.is_binary {
            return None;
        }
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Error category surfaced through
/// [`Delegate::on_error`](crate::Delegate::on_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The engine gave up waiting.
    TimeOut,
    /// The connection could not be established or was lost.
    ConnectionFailure,
    /// Anything else.
    Unknown,
}

impl ErrorCode {
    /// Decode the integer code reported by the foreign engine.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => ErrorCode::TimeOut,
            1 => ErrorCode::ConnectionFailure,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::TimeOut => write!(f, "timeout"),
            ErrorCode::ConnectionFailure => write!(f, "connection failure"),
            ErrorCode::Unknown => write!(f, "unknown error"),
        }
    }
}

/// An event delivered by the foreign engine for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignEvent {
    /// Handshake finished.
    Open {
        /// Negotiated subprotocol, empty if none.
        protocol: String,
        /// Response headers as `\n`-separated `Key: Value` records.
        headers: String,
    },
    /// Text message.
    Text(String),
    /// Binary message.
    Binary(Bytes),
    /// Close handshake finished.
    Closed {
        /// Close code.
        code: i32,
        /// Close reason.
        reason: String,
    },
    /// The engine failed.
    Error {
        /// Engine error code, see [`ErrorCode::from_code`].
        code: i32,
        /// Human-readable reason.
        reason: String,
    },
}

impl ForeignEvent {
    /// Short event name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ForeignEvent::Open { .. } => "open",
            ForeignEvent::Text(_) => "text",
            ForeignEvent::Binary(_) => "binary",
            ForeignEvent::Closed { .. } => "closed",
            ForeignEvent::Error { .. } => "error",
        }
    }
}
