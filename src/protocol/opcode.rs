//! WebSocket frame opcodes as defined in RFC 6455.

/// WebSocket frame opcode.
///
/// Defines the interpretation of the payload data. Opcodes the protocol
/// reserves for future use are carried as [`OpCode::Reserved`] so a decoder
/// can hand them up instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Continuation frame (0x0).
    ///
    /// Used for fragmented messages after the initial frame.
    Continuation,

    /// Text frame (0x1).
    Text,

    /// Binary frame (0x2).
    Binary,

    /// Close frame (0x8).
    ///
    /// Initiates connection close. May contain status code and reason.
    Close,

    /// Ping frame (0x9).
    ///
    /// Receiver must respond with Pong.
    Ping,

    /// Pong frame (0xA).
    Pong,

    /// Any of 0x3-0x7 and 0xB-0xF.
    Reserved(u8),
}

impl OpCode {
    /// Create an OpCode from the low four bits of `byte`.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Self {
        match byte & 0x0F {
            0x0 => OpCode::Continuation,
            0x1 => OpCode::Text,
            0x2 => OpCode::Binary,
            0x8 => OpCode::Close,
            0x9 => OpCode::Ping,
            0xA => OpCode::Pong,
            other => OpCode::Reserved(other),
        }
    }

    /// Convert OpCode to its 4-bit wire value.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
            OpCode::Reserved(value) => value & 0x0F,
        }
    }

    /// Check if this is a control frame opcode.
    ///
    /// Control frames: Close (0x8), Ping (0x9), Pong (0xA).
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    /// Check if this is a data frame opcode.
    ///
    /// Data frames: Continuation (0x0), Text (0x1), Binary (0x2).
    #[inline]
    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, OpCode::Continuation | OpCode::Text | OpCode::Binary)
    }

    /// Check if this opcode is reserved.
    #[inline]
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, OpCode::Reserved(_))
    }

    /// Get human-readable name for this opcode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
            OpCode::Reserved(_) => "Reserved",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpCode::Reserved(value) => write!(f, "Reserved({value:#x})"),
            other => write!(f, "{}", other.name()),
        }
    }
}
