//! WebSocket frame parsing and serialization (RFC 6455).
//!
//! The header parser here is shared by the in-memory [`Frame::parse`] and the
//! streaming decoder in [`crate::codec`].

use crate::error::{Error, Result};
use crate::protocol::OpCode;
use crate::protocol::mask::{apply_mask, apply_mask_fast};

/// Largest possible header: 2 base bytes, 8 length bytes, 4 mask bytes.
pub const MAX_HEADER_SIZE: usize = 14;

/// Largest payload that fits in the 7-bit length field.
pub const MAX_SHORT_PAYLOAD: u64 = 125;

/// Largest payload that fits in the 16-bit extended length field.
pub const MAX_MEDIUM_PAYLOAD: u64 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub(crate) fin: bool,
    pub(crate) opcode: OpCode,
    pub(crate) mask: Option<[u8; 4]>,
    pub(crate) payload_len: u64,
    pub(crate) header_len: usize,
}

/// Total header length announced by the second header byte.
#[inline]
pub(crate) const fn header_len(byte1: u8) -> usize {
    let extended = match byte1 & 0x7F {
        126 => 2,
        127 => 8,
        _ => 0,
    };
    let mask = if byte1 & 0x80 != 0 { 4 } else { 0 };
    2 + extended + mask
}

/// Parse frame header from buffer.
///
/// # Errors
///
/// - `Error::IncompleteFrame` if not enough data is available
/// - `Error::ReservedBitsSet` if any RSV bit is set
/// - `Error::InvalidPayloadLength` if the 64-bit length has its top bit set
#[inline]
pub(crate) fn parse_header(buf: &[u8]) -> Result<FrameHeader> {
    if buf.len() < 2 {
        return Err(Error::IncompleteFrame {
            needed: 2 - buf.len(),
        });
    }

    let byte0 = buf[0];
    let byte1 = buf[1];

    if byte0 & 0x70 != 0 {
        return Err(Error::ReservedBitsSet);
    }
    let fin = (byte0 & 0x80) != 0;
    let opcode = OpCode::from_u8(byte0);

    let masked = (byte1 & 0x80) != 0;
    let total_header_len = header_len(byte1);
    if buf.len() < total_header_len {
        return Err(Error::IncompleteFrame {
            needed: total_header_len - buf.len(),
        });
    }

    let (payload_len, mask_offset) = match byte1 & 0x7F {
        126 => (u64::from(u16::from_be_bytes([buf[2], buf[3]])), 4),
        127 => {
            let len = u64::from_be_bytes([
                buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
            ]);
            if len & (1 << 63) != 0 {
                return Err(Error::InvalidPayloadLength(len));
            }
            (len, 10)
        }
        short => (u64::from(short), 2),
    };

    let mask = if masked {
        Some([
            buf[mask_offset],
            buf[mask_offset + 1],
            buf[mask_offset + 2],
            buf[mask_offset + 3],
        ])
    } else {
        None
    };

    Ok(FrameHeader {
        fin,
        opcode,
        mask,
        payload_len,
        header_len: total_header_len,
    })
}

/// Convert a wire length into an in-memory size.
pub(crate) fn payload_size(len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| Error::PayloadTooLargeForPlatform {
        size: len,
        max: usize::MAX as u64,
    })
}

/// A WebSocket frame as defined in RFC 6455.
///
/// A frame exclusively owns its payload. Decoded frames always hold the
/// logical (unmasked) payload; `masked` and `masking_key` only record how the
/// frame travelled or should travel on the wire.
///
/// ## Frame Structure
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-------+-+-------------+-------------------------------+
/// |F|R|R|R| opcode |M| Payload len |    Extended payload length    |
/// |I|S|S|S|  (4)   |A|     (7)     |             (16/64)           |
/// |N|V|V|V|       |S|             |   (if payload len==126/127)   |
/// | |1|2|3|       |K|             |                               |
/// +-+-+-+-+-------+-+-------------+-------------------------------+
/// |                         Masking key (if present)              |
/// +---------------------------------------------------------------+
/// |                     Payload data                              |
/// +---------------------------------------------------------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag.
    pub fin: bool,
    /// Frame opcode defining the interpretation of payload data.
    pub opcode: OpCode,
    /// Whether the payload is masked on the wire.
    pub masked: bool,
    /// Masking key. Always present on decoded masked frames; when encoding a
    /// masked frame without a key, the encoder picks one.
    pub masking_key: Option<[u8; 4]>,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a new unmasked frame with the given parameters.
    #[must_use]
    pub fn new(fin: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin,
            opcode,
            masked: false,
            masking_key: None,
            payload,
        }
    }

    pub(crate) fn from_header(header: &FrameHeader, payload: Vec<u8>) -> Self {
        Self {
            fin: header.fin,
            opcode: header.opcode,
            masked: header.mask.is_some(),
            masking_key: header.mask,
            payload,
        }
    }

    /// Create a text frame.
    #[must_use]
    pub fn text(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Text, data.into())
    }

    /// Create a binary frame.
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Binary, data.into())
    }

    /// Create a close frame with optional status code and reason.
    #[must_use]
    pub fn close(code: Option<u16>, reason: &str) -> Self {
        let payload = if let Some(code) = code {
            let mut data = code.to_be_bytes().to_vec();
            data.extend_from_slice(reason.as_bytes());
            data
        } else {
            Vec::new()
        };
        Self::new(true, OpCode::Close, payload)
    }

    /// Create a ping frame.
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Ping, data.into())
    }

    /// Create a pong frame.
    #[must_use]
    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self::new(true, OpCode::Pong, data.into())
    }

    /// Mark the frame as masked with a specific key.
    #[must_use]
    pub fn with_mask(mut self, key: [u8; 4]) -> Self {
        self.masked = true;
        self.masking_key = Some(key);
        self
    }

    /// Mark the frame as masked, leaving key choice to the encoder.
    #[must_use]
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self.masking_key = None;
        self
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length as carried in the header.
    #[inline]
    #[must_use]
    pub fn payload_length(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Parse a frame from a buffer.
    ///
    /// Returns the parsed frame and the number of bytes consumed. A masked
    /// payload is unmasked exactly once.
    ///
    /// ## Errors
    ///
    /// - `Error::IncompleteFrame` if not enough data is available
    /// - `Error::ReservedBitsSet` if an RSV bit is set
    /// - `Error::InvalidPayloadLength` on a malformed 64-bit length
    #[inline]
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let header = parse_header(buf)?;
        let payload_len = payload_size(header.payload_len)?;

        let total_size = header.header_len.checked_add(payload_len).ok_or(
            Error::PayloadTooLargeForPlatform {
                size: header.payload_len,
                max: usize::MAX as u64,
            },
        )?;

        if buf.len() < total_size {
            return Err(Error::IncompleteFrame {
                needed: total_size - buf.len(),
            });
        }

        let mut payload = buf[header.header_len..total_size].to_vec();
        if let Some(mask) = header.mask {
            apply_mask_fast(&mut payload, mask);
        }

        Ok((Self::from_header(&header, payload), total_size))
    }

    /// Append the wire form of this frame to `buf`.
    ///
    /// With `mask` set, the MASK bit and key are written and a copy of the
    /// payload is XORed; `self` is never modified. The `masked` and
    /// `masking_key` fields are ignored, the caller decides via `mask`.
    ///
    /// Returns the number of bytes appended.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResponseAllocation` if the buffer cannot grow.
    pub fn write(&self, buf: &mut Vec<u8>, mask: Option<[u8; 4]>) -> Result<usize> {
        let payload = self.payload();
        let payload_len = self.payload_length();
        let total_size = self.wire_size(mask.is_some());

        buf.try_reserve(total_size)
            .map_err(|_| Error::ResponseAllocation { size: total_size })?;

        let mut byte0 = self.opcode.as_u8();
        if self.fin {
            byte0 |= 0x80;
        }
        buf.push(byte0);

        let mask_bit = if mask.is_some() { 0x80 } else { 0x00 };
        if payload_len <= MAX_SHORT_PAYLOAD {
            buf.push(mask_bit | payload_len as u8);
        } else if payload_len <= MAX_MEDIUM_PAYLOAD {
            buf.push(mask_bit | 126);
            buf.extend_from_slice(&(payload_len as u16).to_be_bytes());
        } else {
            buf.push(mask_bit | 127);
            buf.extend_from_slice(&payload_len.to_be_bytes());
        }

        let payload_start = buf.len() + if mask.is_some() { 4 } else { 0 };
        if let Some(mask_key) = mask {
            buf.extend_from_slice(&mask_key);
        }
        buf.extend_from_slice(payload);
        if let Some(mask_key) = mask {
            apply_mask(&mut buf[payload_start..], mask_key);
        }

        Ok(total_size)
    }

    /// Calculate the size needed to write this frame.
    #[must_use]
    pub fn wire_size(&self, masked: bool) -> usize {
        let payload_len = self.payload.len();
        let extended_len_size = if payload_len as u64 <= MAX_SHORT_PAYLOAD {
            0
        } else if payload_len as u64 <= MAX_MEDIUM_PAYLOAD {
            2
        } else {
            8
        };
        let mask_size = if masked { 4 } else { 0 };
        2 + extended_len_size + mask_size + payload_len
    }
}
