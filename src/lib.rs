//! # wsmux - single-threaded WebSocket echo server
//!
//! `wsmux` accepts many WebSocket clients over plain TCP and services all of
//! them from one task: it waits for readiness across the listener and every
//! connection, then handshakes, decodes, and answers frames in place.
//!
//! ## Layers
//!
//! - [`protocol`]: RFC 6455 frame codec, opening handshake, masking
//! - [`codec`]: async frame I/O over any `AsyncRead + AsyncWrite`
//! - [`connection`]: per-connection lifecycle and opcode dispatch
//! - [`server`]: the readiness-driven multiplexer loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsmux::{Config, Server, server};
//!
//! let server = Server::bind("0.0.0.0:8080", Config::server()).await?;
//! let (handle, shutdown) = server::channel();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     handle.trigger();
//! });
//! server.run(shutdown).await?;
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod server;

pub use codec::WebSocketCodec;
pub use config::{Config, Limits};
pub use connection::{Action, Connection, ConnectionId, ConnectionState, Dispatcher, Role};
pub use error::{Error, ErrorKind, Result};
pub use protocol::{
    Frame, HandshakeRequest, HandshakeResponse, OpCode, WS_GUID, compute_accept_key,
};
pub use server::{Server, Shutdown, ShutdownHandle};
