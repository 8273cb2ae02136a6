//! Configuration for bridged connections.

use std::time::Duration;

use crate::error::{Error, Result};

/// Foreign class that implements the socket counterpart.
pub const DEFAULT_COUNTERPART_CLASS: &str = "org/cocos2dx/lib/websocket/CocosWebSocket";

/// Default engine timeout: one hour.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Settings passed to the foreign counterpart when a connection is created.
///
/// # Example
///
/// ```rust,ignore
/// let config = BridgeConfig::new()
///     .with_header("Authorization", "Bearer abc")
///     .with_tcp_no_delay(true)
///     .with_timeout(Duration::from_secs(30));
/// config.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Slash-separated class name of the counterpart.
    ///
    /// Default: [`DEFAULT_COUNTERPART_CLASS`]
    pub class_name: String,

    /// Extra request headers, in insertion order.
    pub headers: Vec<(String, String)>,

    /// Disable Nagle's algorithm on the engine's socket.
    ///
    /// Default: false
    pub tcp_no_delay: bool,

    /// Offer `permessage-deflate`.
    ///
    /// Default: true
    pub per_message_deflate: bool,

    /// Connect, read and write timeout applied by the engine.
    ///
    /// Default: 1 hour
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_COUNTERPART_CLASS.to_string(),
            headers: Vec::new(),
            tcp_no_delay: false,
            per_message_deflate: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the counterpart class.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Append a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set `TCP_NODELAY`.
    #[must_use]
    pub const fn with_tcp_no_delay(mut self, enabled: bool) -> Self {
        self.tcp_no_delay = enabled;
        self
    }

    /// Enable or disable `permessage-deflate`.
    #[must_use]
    pub const fn with_per_message_deflate(mut self, enabled: bool) -> Self {
        self.per_message_deflate = enabled;
        self
    }

    /// Set the engine timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in whole milliseconds, as the counterpart expects it.
    ///
    /// Saturates at `i64::MAX`; [`validate`](Self::validate) rejects such
    /// values.
    #[must_use]
    pub fn timeout_millis(&self) -> i64 {
        i64::try_from(self.timeout.as_millis()).unwrap_or(i64::MAX)
    }

    /// Headers flattened to `[name0, value0, name1, value1, ...]`.
    #[must_use]
    pub fn header_list(&self) -> Vec<String> {
        self.headers
            .iter()
            .flat_map(|(name, value)| [name.clone(), value.clone()])
            .collect()
    }

    /// Check the configuration before it is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the class name is empty, the
    /// timeout is zero or does not fit in `i64` milliseconds, or a header
    /// has an empty name or contains CR or LF.
    pub fn validate(&self) -> Result<()> {
        if self.class_name.trim().is_empty() {
            return Err(Error::InvalidConfig("counterpart class name is empty".into()));
        }
        if self.timeout.as_millis() == 0 {
            return Err(Error::InvalidConfig("timeout must be at least 1ms".into()));
        }
        if i64::try_from(self.timeout.as_millis()).is_err() {
            return Err(Error::InvalidConfig(format!(
                "timeout {:?} exceeds i64 milliseconds",
                self.timeout
            )));
        }
        for (name, value) in &self.headers {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig("header with empty name".into()));
            }
            if [name, value].iter().any(|s| s.contains(['\r', '\n'])) {
                return Err(Error::InvalidConfig(format!(
                    "header {name:?} contains a line break"
                )));
            }
        }
        Ok(())
    }
}
