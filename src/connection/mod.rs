//! WebSocket connection lifecycle and frame dispatch.
//!
//! A [`Connection`] wraps one accepted stream and moves through
//! [`ConnectionState`]:
//!
//! 1. **Accepted** - stream accepted, waiting for the HTTP upgrade request
//! 2. **Open** - handshake answered, frames are decoded and dispatched
//! 3. **Closed** - torn down; the owner drops it
//!
//! The [`Dispatcher`] decides how each decoded frame is answered.

mod dispatcher;
mod state;

pub use dispatcher::{Action, Dispatcher, Role};
pub use state::ConnectionState;

#[allow(clippy::module_inception)]
mod connection;

pub use connection::{Connection, ConnectionId};
