//! Single-threaded connection multiplexer.
//!
//! [`Server`] owns the listener and every accepted connection. Each loop
//! iteration waits, bounded by `Config::poll_interval`, until the listener or
//! some connection is readable, then services whatever is ready:
//!
//! - a new connection is admitted in the `Accepted` state;
//! - a connection whose non-destructive peek returns zero bytes is dropped;
//! - an `Accepted` connection runs the handshake;
//! - an `Open` connection decodes and dispatches one frame.
//!
//! Reads and writes of a serviced connection are awaited to completion before
//! the next connection is looked at, so frames on one connection are handled
//! strictly in arrival order. A slow peer stalls the loop for that long.
//! No task is ever spawned; the connection set has exactly one owner.

mod shutdown;

pub use shutdown::{Shutdown, ShutdownHandle, channel};

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;

use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connection::{Connection, ConnectionId};
use crate::error::Result;

enum Event {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Readable(Vec<(ConnectionId, io::Result<()>)>),
    Idle,
}

/// WebSocket echo server multiplexing many connections on one task.
///
/// ## Example
///
/// ```rust,ignore
/// use wsmux::{Config, Server, server};
///
/// let server = Server::bind("0.0.0.0:8080", Config::server()).await?;
/// let (handle, shutdown) = server::channel();
/// // hand `handle` to a signal handler
/// server.run(shutdown).await?;
/// ```
pub struct Server {
    listener: TcpListener,
    config: Config,
    connections: BTreeMap<ConnectionId, Connection<TcpStream>>,
    next_id: u64,
}

impl Server {
    /// Serve connections arriving on an already listening socket.
    #[must_use]
    pub fn new(listener: TcpListener, config: Config) -> Self {
        Self {
            listener,
            config,
            connections: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Bind a listener and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs, config: Config) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, config))
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of tracked connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run the multiplexer loop until `shutdown` fires.
    ///
    /// On shutdown no further connections are accepted, every tracked
    /// connection is closed, and the listener is dropped.
    ///
    /// # Errors
    ///
    /// Per-connection failures never end the loop; they only tear down the
    /// affected connection. Accept failures are logged and skipped.
    pub async fn run(mut self, mut shutdown: Shutdown) -> Result<()> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "websocket server listening");
        }

        while !shutdown.is_triggered() {
            match self.poll(&mut shutdown).await {
                Event::Shutdown => break,
                Event::Idle => {}
                Event::Accepted(Ok((stream, peer))) => self.admit(stream, peer),
                Event::Accepted(Err(err)) => warn!(error = %err, "accept failed"),
                Event::Readable(ready) => {
                    for (id, readiness) in ready {
                        self.service(id, readiness).await;
                    }
                }
            }
        }

        info!(connections = self.connections.len(), "shutting down");
        self.close_all().await;
        Ok(())
    }

    async fn poll(&self, shutdown: &mut Shutdown) -> Event {
        let mut readable: FuturesUnordered<_> = self
            .connections
            .iter()
            .map(|(&id, conn)| async move { (id, conn.get_ref().readable().await) })
            .collect();

        let mut event = tokio::select! {
            () = shutdown.triggered() => Event::Shutdown,
            accepted = self.listener.accept() => Event::Accepted(accepted),
            Some(first) = readable.next(), if !readable.is_empty() => Event::Readable(vec![first]),
            () = tokio::time::sleep(self.config.poll_interval) => Event::Idle,
        };

        if let Event::Readable(ready) = &mut event {
            while let Some(Some(next)) = readable.next().now_or_never() {
                ready.push(next);
            }
            ready.sort_unstable_by_key(|(id, _)| *id);
        }
        event
    }

    fn admit(&mut self, stream: TcpStream, peer: SocketAddr) {
        if self.connections.len() >= self.config.max_connections {
            warn!(%peer, max = self.config.max_connections, "connection limit reached, refusing");
            return;
        }

        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        info!(conn = %id, %peer, "connection accepted");
        self.connections
            .insert(id, Connection::new(id, stream, &self.config));
    }

    async fn service(&mut self, id: ConnectionId, readiness: io::Result<()>) {
        let Some(conn) = self.connections.get_mut(&id) else {
            return;
        };

        if let Err(err) = readiness {
            warn!(conn = %id, error = %err, "readiness poll failed");
            self.remove(id).await;
            return;
        }

        let mut probe = [0u8; 1];
        match conn.get_ref().peek(&mut probe).now_or_never() {
            // Spurious wakeup; readiness has been cleared.
            None => return,
            Some(Ok(0)) => {
                info!(conn = %id, "peer disconnected");
                self.remove(id).await;
                return;
            }
            Some(Err(err)) => {
                warn!(conn = %id, error = %err, "peek failed");
                self.remove(id).await;
                return;
            }
            Some(Ok(_)) => {}
        }

        let result = if conn.state().awaits_handshake() {
            conn.handshake().await.map(|_| {
                info!(conn = %id, "handshake complete");
            })
        } else {
            conn.process_frame().await
        };

        match result {
            Ok(()) => {}
            Err(err) if !err.is_fatal() => {
                warn!(conn = %id, error = %err, "response dropped");
            }
            Err(err) => {
                warn!(conn = %id, kind = ?err.kind(), error = %err, "closing connection");
            }
        }

        if !conn.state().is_active() {
            self.remove(id).await;
        }
    }

    async fn remove(&mut self, id: ConnectionId) {
        if let Some(mut conn) = self.connections.remove(&id) {
            if let Err(err) = conn.close().await {
                debug!(conn = %id, error = %err, "shutdown on close failed");
            }
            debug!(conn = %id, remaining = self.connections.len(), "connection removed");
        }
    }

    async fn close_all(&mut self) {
        let ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        for id in ids {
            self.remove(id).await;
        }
    }
}
