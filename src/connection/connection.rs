use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::debug;

use crate::codec::WebSocketCodec;
use crate::config::Config;
use crate::connection::dispatcher::Dispatcher;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::protocol::{Frame, HandshakeRequest, HandshakeResponse};

/// Identifier the multiplexer assigns to each accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A server-side connection: an I/O stream plus its lifecycle phase.
///
/// The connection starts `Accepted`. [`handshake`](Self::handshake) moves it
/// to `Open`; after that, each [`process_frame`](Self::process_frame) call
/// decodes one frame, dispatches it, and writes the response. Any fatal error
/// leaves the connection `Closed`, and the owner is expected to drop it.
///
/// ## Example
///
/// ```rust,ignore
/// use wsmux::{Config, Connection, ConnectionId};
///
/// let mut conn = Connection::new(ConnectionId::new(1), stream, &Config::server());
/// conn.handshake().await?;
/// while conn.is_open() {
///     conn.process_frame().await?;
/// }
/// ```
pub struct Connection<T> {
    id: ConnectionId,
    codec: WebSocketCodec<T>,
    state: ConnectionState,
    dispatcher: Dispatcher,
}

impl<T> Connection<T> {
    /// Wrap a freshly accepted stream.
    pub fn new(id: ConnectionId, io: T, config: &Config) -> Self {
        Self {
            id,
            codec: WebSocketCodec::new(io, config),
            state: ConnectionState::Accepted,
            dispatcher: Dispatcher::new(config.role),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the handshake has completed and the connection is not closed.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.codec.get_ref()
    }

    /// Consume the connection, returning the underlying stream.
    pub fn into_inner(self) -> T {
        self.codec.into_inner()
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> Connection<T> {
    /// Run the server side of the opening handshake.
    ///
    /// Reads once into a buffer bounded by `limits.max_handshake_size`,
    /// extracts the client key, and writes the `101 Switching Protocols`
    /// response. The state becomes `Open` only after the response has been
    /// written in full; on any error it becomes `Closed` and, if the request
    /// was rejected, no response bytes have been sent.
    ///
    /// ## Errors
    ///
    /// - `Error::InvalidState` if the handshake already ran
    /// - `Error::ConnectionClosed` if the peer closed before sending anything
    /// - `Error::HandshakeTooLarge` if the request exceeds the bounded buffer
    /// - `Error::InvalidHandshake` if the client key is missing or unterminated
    /// - I/O errors from the underlying stream
    pub async fn handshake(&mut self) -> Result<HandshakeRequest> {
        if !self.state.awaits_handshake() {
            return Err(Error::InvalidState(self.state));
        }

        match self.exchange_handshake().await {
            Ok(request) => {
                self.state = ConnectionState::Open;
                Ok(request)
            }
            Err(err) => {
                self.state = ConnectionState::Closed;
                Err(err)
            }
        }
    }

    async fn exchange_handshake(&mut self) -> Result<HandshakeRequest> {
        let max = self.codec.limits().max_handshake_size;
        // One spare byte distinguishes "exactly at the limit" from "over it".
        let mut buf = vec![0u8; max.saturating_add(1)];

        let n = self.codec.get_mut().read(&mut buf).await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        let request = HandshakeRequest::parse_with_limit(&buf[..n], max)?;
        let response = HandshakeResponse::from_request(&request);
        self.codec.write_raw(&response.to_bytes()).await?;

        debug!(conn = %self.id, accept = %response.accept, "handshake response sent");
        Ok(request)
    }

    /// Decode one frame, dispatch it, and send the response if there is one.
    ///
    /// After a close frame has been answered the state is `Closed`. A failed
    /// decode, or a failed response write, closes the connection too; only a
    /// response that could not be allocated leaves it open.
    ///
    /// ## Errors
    ///
    /// - `Error::InvalidState` if the connection is not `Open`
    /// - Decode errors from [`WebSocketCodec::read_frame`]
    /// - Encode errors from [`WebSocketCodec::write_frame`]
    pub async fn process_frame(&mut self) -> Result<()> {
        if !self.state.can_exchange_frames() {
            return Err(Error::InvalidState(self.state));
        }

        let frame = match self.codec.read_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                self.state = ConnectionState::Closed;
                return Err(err);
            }
        };
        debug!(conn = %self.id, opcode = %frame.opcode, len = frame.payload_length(), "frame received");

        let action = self.dispatcher.dispatch(frame);
        let sent = match action.frame() {
            Some(reply) => self.codec.write_frame(reply).await,
            None => Ok(()),
        };

        if action.closes() {
            self.state = ConnectionState::Closed;
        }
        if let Err(err) = sent {
            if err.is_fatal() {
                self.state = ConnectionState::Closed;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Send a frame on an open connection.
    ///
    /// ## Errors
    ///
    /// - `Error::InvalidState` if the connection is not `Open`
    /// - Encode errors from [`WebSocketCodec::write_frame`]
    pub async fn send(&mut self, frame: &Frame) -> Result<()> {
        if !self.state.can_exchange_frames() {
            return Err(Error::InvalidState(self.state));
        }
        let result = self.codec.write_frame(frame).await;
        if matches!(&result, Err(err) if err.is_fatal()) {
            self.state = ConnectionState::Closed;
        }
        result
    }

    /// Mark the connection closed and shut down its write half.
    ///
    /// The peer is not waited for.
    pub async fn close(&mut self) -> Result<()> {
        self.state = ConnectionState::Closed;
        self.codec.shutdown().await
    }
}
