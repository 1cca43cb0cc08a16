//! WebSocket protocol core implementation (RFC 6455).

pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;

pub use frame::Frame;
pub use handshake::{HandshakeRequest, HandshakeResponse, WS_GUID, compute_accept_key};
pub use mask::{MaskGenerator, apply_mask, apply_mask_fast};
pub use opcode::OpCode;
