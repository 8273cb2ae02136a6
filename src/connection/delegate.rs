//! Application callbacks.

use super::bridge::Bridge;
use crate::message::{CloseEvent, ErrorCode, MessageData};

/// Receives the events of one connection.
///
/// Callbacks run on whichever thread delivered the event, after the
/// connection's internal lock has been released, so implementations may
/// call back into [`Bridge::send_text`] or [`Bridge::close`].
///
/// Every method has an empty default body.
pub trait Delegate: Send + Sync {
    /// The handshake finished.
    fn on_open(&self, _bridge: &Bridge) {}

    /// A message arrived.
    fn on_message(&self, _bridge: &Bridge, _message: &MessageData) {}

    /// The connection closed. Called at most once.
    fn on_close(&self, _bridge: &Bridge, _event: &CloseEvent) {}

    /// The engine failed. Called at most once and always followed by
    /// [`on_close`](Self::on_close).
    fn on_error(&self, _bridge: &Bridge, _error: ErrorCode) {}
}
