//! Shared fixtures for the bridge integration tests.
//!
//! Every test runs against an in-process [`LoopbackRuntime`] with the socket
//! counterpart declared, and records delegate callbacks for assertions.

#![allow(dead_code, unused_imports)]

mod delegate;
mod fixture;

pub use delegate::{Callback, RecordingDelegate};
pub use fixture::{Fixture, open_event};
