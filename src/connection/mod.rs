//! Bridged connections and their state machine.
//!
//! A [`Connection`] is the application's handle. It owns a shared
//! [`Bridge`] which holds the state, the delegate and the foreign
//! counterpart.
//!
//! ## Connection Lifecycle
//!
//! 1. **Connecting** - counterpart created, engine handshaking
//! 2. **Open** - engine reported the handshake; sends are forwarded
//! 3. **Closing** - close requested locally, waiting for the engine
//! 4. **Closed** - engine reported the close or an error
//!
//! States only move forward. An error moves any state straight to
//! `Closed`.

mod bridge;
mod delegate;
mod headers;
mod state;

pub use bridge::{Bridge, NORMAL_CLOSURE_REASON};
pub use delegate::Delegate;
pub use headers::{EXTENSIONS_HEADER, ResponseHeaders};
pub use state::ConnectionState;

#[allow(clippy::module_inception)]
mod connection;

pub use connection::Connection;
