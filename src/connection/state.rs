//! Connection lifecycle states.

/// Lifecycle state of a bridged connection.
///
/// States are ordered by lifecycle position. A connection only ever moves
/// forward through this order; see [`ConnectionState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[non_exhaustive]
pub enum ConnectionState {
    /// Waiting for the engine to finish the handshake.
    #[default]
    Connecting,
    /// Handshake done, messages may be sent.
    Open,
    /// Close requested, waiting for the engine to report it.
    Closing,
    /// Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` for every state except `Closed`.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Closed)
    }

    /// Returns `true` only for `Open`.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Returns `true` once a close was requested or completed.
    #[must_use]
    #[inline]
    pub const fn is_closing_or_closed(&self) -> bool {
        matches!(self, ConnectionState::Closing | ConnectionState::Closed)
    }

    /// Move to `next` if it lies ahead of the current state.
    ///
    /// Returns `false` and leaves `self` untouched for backward or same-state
    /// moves.
    #[inline]
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closing => write!(f, "Closing"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConnectionState; 4] = [
        ConnectionState::Connecting,
        ConnectionState::Open,
        ConnectionState::Closing,
        ConnectionState::Closed,
    ];

    #[test]
    fn test_initial_state() {
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
    }

    #[test]
    fn test_can_send_only_when_open() {
        let senders: Vec<_> = ALL.iter().filter(|s| s.can_send()).collect();
        assert_eq!(senders, [&ConnectionState::Open]);
    }

    #[test]
    fn test_advance_never_goes_back() {
        for from in ALL {
            for to in ALL {
                let mut state = from;
                let moved = state.advance(to);
                assert_eq!(moved, to > from, "{from} -> {to}");
                assert_eq!(state, from.max(to));
            }
        }
    }

    #[test]
    fn test_any_active_state_can_close() {
        for from in ALL.into_iter().filter(ConnectionState::is_active) {
            let mut state = from;
            assert!(state.advance(ConnectionState::Closed));
        }
    }

    #[test]
    fn test_state_display() {
        let names: Vec<_> = ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["Connecting", "Open", "Closing", "Closed"]);
    }
}
