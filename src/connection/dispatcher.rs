//! Opcode dispatch: decides how an open connection answers a decoded frame.

use std::fmt;

use tracing::debug;

use crate::protocol::{Frame, OpCode};

/// Which end of the connection this process plays.
///
/// Clients mask every frame they send; servers never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Client,
    #[default]
    Server,
}

impl Role {
    #[inline]
    #[must_use]
    pub const fn must_mask(self) -> bool {
        matches!(self, Role::Client)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Client => "client",
            Role::Server => "server",
        })
    }
}

/// What the connection does in response to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the frame and keep the connection open.
    Reply(Frame),
    /// Send the frame, then terminate the connection.
    ReplyAndClose(Frame),
    /// Send nothing.
    Ignore,
}

impl Action {
    /// The frame to send, if any.
    #[must_use]
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Action::Reply(frame) | Action::ReplyAndClose(frame) => Some(frame),
            Action::Ignore => None,
        }
    }

    /// Whether the connection ends after this action.
    #[must_use]
    pub const fn closes(&self) -> bool {
        matches!(self, Action::ReplyAndClose(_))
    }
}

/// Maps decoded frames to response actions.
///
/// | Opcode | Action |
/// |---|---|
/// | Text | echo the payload in a final text frame |
/// | Binary | accept, no response |
/// | Ping | pong with the same payload |
/// | Close | echo the close payload, then close |
/// | Continuation, Pong, reserved | ignore |
///
/// Response frames are masked only when the local role requires it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    role: Role,
}

impl Dispatcher {
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self { role }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Consume `frame` and decide the response. The payload buffer moves into
    /// the response frame; nothing is copied.
    #[must_use]
    pub fn dispatch(&self, frame: Frame) -> Action {
        let opcode = frame.opcode;
        match opcode {
            OpCode::Text => Action::Reply(self.respond(OpCode::Text, frame)),
            OpCode::Ping => Action::Reply(self.respond(OpCode::Pong, frame)),
            OpCode::Close => Action::ReplyAndClose(self.respond(OpCode::Close, frame)),
            OpCode::Binary => {
                debug!(len = frame.payload_length(), "binary frame accepted");
                Action::Ignore
            }
            OpCode::Continuation | OpCode::Pong | OpCode::Reserved(_) => {
                debug!(%opcode, "ignoring frame");
                Action::Ignore
            }
        }
    }

    fn respond(&self, opcode: OpCode, request: Frame) -> Frame {
        let frame = Frame::new(true, opcode, request.into_payload());
        if self.role.must_mask() {
            frame.masked()
        } else {
            frame
        }
    }
}
