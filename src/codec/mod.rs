//! WebSocket codec for async I/O.
//!
//! This module provides frame-level decoding/encoding over async streams.

mod framed;

pub use framed::WebSocketCodec;
