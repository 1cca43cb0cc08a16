//! Error types for the WebSocket server.
//!
//! Every error belongs to one of three classes (see [`ErrorKind`]): transport
//! failures and protocol violations tear the connection down, resource
//! failures only abort the response being built.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Short read/write, peer disconnect, payload buffer allocation failure.
    Transport,
    /// Malformed handshake or frame.
    Protocol,
    /// Allocation failure while building a response frame.
    Resource,
}

/// Errors that can occur while serving WebSocket connections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Peer closed the stream before a complete unit was read.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Buffer ended before a complete frame was available.
    #[error("Incomplete frame: need {needed} more bytes")]
    IncompleteFrame {
        /// Number of additional bytes needed.
        needed: usize,
    },

    /// Payload buffer for an incoming frame could not be allocated.
    #[error("Failed to allocate {size} byte payload buffer")]
    PayloadAllocation {
        /// Requested payload size.
        size: usize,
    },

    /// Invalid WebSocket handshake.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// Handshake request does not fit in the bounded buffer.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Reserved bits set without extension.
    #[error("Reserved bits set without negotiated extension")]
    ReservedBitsSet,

    /// 64-bit extended length with the most significant bit set.
    #[error("Invalid payload length: {0:#x} (most significant bit must be 0)")]
    InvalidPayloadLength(u64),

    /// Frame size exceeds configured maximum.
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Declared payload size.
        size: u64,
        /// Maximum allowed size.
        max: usize,
    },

    /// Payload length does not fit in this platform's address space.
    #[error("Payload too large for platform: {size} bytes (max: {max})")]
    PayloadTooLargeForPlatform {
        /// Declared payload size.
        size: u64,
        /// Platform maximum.
        max: u64,
    },

    /// Operation not valid in the connection's current state.
    #[error("Operation not allowed in state {0}")]
    InvalidState(ConnectionState),

    /// Buffer for an outgoing frame could not be allocated.
    #[error("Failed to allocate {size} byte response buffer")]
    ResponseAllocation {
        /// Requested buffer size.
        size: usize,
    },
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_)
            | Error::ConnectionClosed
            | Error::IncompleteFrame { .. }
            | Error::PayloadAllocation { .. } => ErrorKind::Transport,
            Error::InvalidHandshake(_)
            | Error::HandshakeTooLarge { .. }
            | Error::ReservedBitsSet
            | Error::InvalidPayloadLength(_)
            | Error::FrameTooLarge { .. }
            | Error::PayloadTooLargeForPlatform { .. }
            | Error::InvalidState(_) => ErrorKind::Protocol,
            Error::ResponseAllocation { .. } => ErrorKind::Resource,
        }
    }

    /// Whether the connection that produced this error must be closed.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Resource)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
            _ => Error::Io(err.to_string()),
        }
    }
}
