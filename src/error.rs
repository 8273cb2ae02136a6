//! Error types for the bridge and call-marshaling layers.
//!
//! Only marshaling and configuration problems are reported through
//! [`Error`]. Commands issued in the wrong connection state are absorbed
//! with a diagnostic instead, and remote failures reach the delegate as an
//! [`ErrorCode`](crate::message::ErrorCode).

use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the foreign runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No method matched the derived signature.
    #[error("Method not found: {class}.{method}{signature}")]
    MethodNotFound {
        /// Foreign class name, slash separated.
        class: String,
        /// Method name (`<init>` for constructors).
        method: String,
        /// Full method signature, including the return code.
        signature: String,
    },

    /// The method was resolved but the call itself failed.
    #[error("Invocation of {class}.{method} failed: {reason}")]
    Invocation {
        /// Foreign class name.
        class: String,
        /// Method name.
        method: String,
        /// Failure reported by the runtime.
        reason: String,
    },

    /// An argument or result could not be converted.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// A reference did not point at an object of the expected kind.
    #[error("Invalid foreign object: {0}")]
    InvalidObject(String),

    /// A response header record could not be parsed.
    #[error("Malformed header record: {0:?}")]
    MalformedHeader(String),

    /// A negotiated extension could not be parsed.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    /// Bridge configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The foreign counterpart object could not be created.
    #[error("Foreign counterpart unavailable: {0}")]
    CounterpartUnavailable(String),
}

impl Error {
    /// Check if this error came from method resolution rather than the call.
    #[must_use]
    pub const fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::MethodNotFound { .. })
    }
}
