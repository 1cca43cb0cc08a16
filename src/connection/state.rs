//! Per-connection lifecycle phase.

/// WebSocket connection state.
///
/// `Accepted -> Open -> Closed`, or `Accepted -> Closed` when the handshake
/// fails. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// TCP connection accepted, handshake not yet completed.
    #[default]
    Accepted,
    /// Handshake complete, frames expected.
    Open,
    /// Connection torn down and removed from the active set.
    Closed,
}

impl ConnectionState {
    /// Check if the connection is in an active state.
    ///
    /// Returns `true` for `Accepted` or `Open` states.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Closed)
    }

    /// Check if the handshake is still pending.
    #[must_use]
    #[inline]
    pub const fn awaits_handshake(&self) -> bool {
        matches!(self, ConnectionState::Accepted)
    }

    /// Check if frames may be exchanged in this state.
    ///
    /// Returns `true` only for `Open` state.
    #[must_use]
    #[inline]
    pub const fn can_exchange_frames(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Accepted => write!(f, "Accepted"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}
