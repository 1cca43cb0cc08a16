//! WebSocket handshake implementation (RFC 6455).
//!
//! This module handles the HTTP Upgrade mechanism: locating the client key in
//! the request, deriving the accept key, and producing the `101` response.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Header line prefix carrying the client key. Matched case-sensitively.
pub const KEY_HEADER_PREFIX: &[u8] = b"Sec-WebSocket-Key: ";

const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Parse HTTP headers from an iterator of lines into a case-insensitive HashMap.
fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers: HashMap<String, String> = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    headers
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use wsmux::protocol::handshake::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// let accept = compute_accept_key(key);
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    let hash = hasher.finalize();
    BASE64.encode(hash)
}

/// WebSocket upgrade request from a client.
///
/// Only the client key is interpreted; the rest of the request is kept as
/// received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    raw: Vec<u8>,
    key: String,
}

impl HandshakeRequest {
    /// Extract the client key from raw request bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if:
    /// - No `Sec-WebSocket-Key: ` header line is present.
    /// - The key line has no `\r\n` terminator.
    /// - The key is empty or not valid UTF-8.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let start = find(data, KEY_HEADER_PREFIX)
            .ok_or_else(|| Error::InvalidHandshake("Missing Sec-WebSocket-Key header".into()))?
            + KEY_HEADER_PREFIX.len();

        let len = find(&data[start..], LINE_TERMINATOR).ok_or_else(|| {
            Error::InvalidHandshake("Unterminated Sec-WebSocket-Key header".into())
        })?;

        let key = std::str::from_utf8(&data[start..start + len])
            .map_err(|_| Error::InvalidHandshake("Invalid UTF-8 in Sec-WebSocket-Key".into()))?
            .trim();
        if key.is_empty() {
            return Err(Error::InvalidHandshake("Empty Sec-WebSocket-Key".into()));
        }

        Ok(Self {
            raw: data.to_vec(),
            key: key.to_string(),
        })
    }

    /// Parse a handshake request with size limit.
    ///
    /// # Errors
    ///
    /// - `Error::HandshakeTooLarge` if data exceeds max_size
    /// - Other handshake errors as per `parse()`
    pub fn parse_with_limit(data: &[u8], max_size: usize) -> Result<Self> {
        if data.len() > max_size {
            return Err(Error::HandshakeTooLarge {
                size: data.len(),
                max: max_size,
            });
        }
        Self::parse(data)
    }

    /// The Sec-WebSocket-Key value.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The request bytes as received.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// WebSocket handshake response from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// The Sec-WebSocket-Accept value.
    pub accept: String,
}

impl HandshakeResponse {
    /// Create a handshake response from a parsed request.
    #[must_use]
    pub fn from_request(req: &HandshakeRequest) -> Self {
        Self {
            accept: compute_accept_key(req.key()),
        }
    }

    /// Write the HTTP response to a buffer.
    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"HTTP/1.1 101 Switching Protocols\r\n");
        buf.extend_from_slice(b"Upgrade: websocket\r\n");
        buf.extend_from_slice(b"Connection: Upgrade\r\n");
        buf.extend_from_slice(format!("Sec-WebSocket-Accept: {}\r\n", self.accept).as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    /// Serialize the HTTP response.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        self.write(&mut buf);
        buf
    }

    /// Parse a WebSocket handshake response from raw HTTP data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if:
    /// - The data is not valid UTF-8.
    /// - The status code is not `101 Switching Protocols`.
    /// - The `Upgrade` header is missing or not `websocket`.
    /// - The `Sec-WebSocket-Accept` header is missing.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidHandshake("Invalid UTF-8".into()))?;

        let mut lines = text.lines();

        let status_line = lines
            .next()
            .ok_or_else(|| Error::InvalidHandshake("Empty response".into()))?;

        if !status_line.starts_with("HTTP/1.1 101") {
            return Err(Error::InvalidHandshake(format!(
                "Expected 101 status, got: {}",
                status_line
            )));
        }

        let headers = parse_headers(lines);

        let upgrade = headers
            .get("upgrade")
            .ok_or_else(|| Error::InvalidHandshake("Missing Upgrade header in response".into()))?;
        if !upgrade.eq_ignore_ascii_case("websocket") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid Upgrade header: {}",
                upgrade
            )));
        }

        let accept = headers
            .get("sec-websocket-accept")
            .ok_or_else(|| Error::InvalidHandshake("Missing Sec-WebSocket-Accept header".into()))?
            .clone();

        Ok(Self { accept })
    }
}
