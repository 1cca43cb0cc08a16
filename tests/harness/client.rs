//! Minimal masking client speaking to the server under test.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wsmux::{Config, Frame, HandshakeResponse, OpCode, WebSocketCodec, compute_accept_key};

pub const KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";
const TIMEOUT: Duration = Duration::from_secs(5);

pub fn request(key: &str) -> String {
    format!(
        "GET /chat HTTP/1.1\r\n\
         Host: localhost\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    )
}

pub struct TestClient {
    codec: WebSocketCodec<TcpStream>,
}

impl TestClient {
    /// Connect and complete the opening handshake.
    pub async fn connect(addr: SocketAddr) -> wsmux::Result<Self> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(request(KEY).as_bytes()).await?;

        let response = read_response(&mut stream).await?;
        let parsed = HandshakeResponse::parse(&response)?;
        assert_eq!(parsed.accept, compute_accept_key(KEY));

        Ok(Self {
            codec: WebSocketCodec::new(stream, &Config::client()),
        })
    }

    pub async fn send(&mut self, frame: Frame) -> wsmux::Result<()> {
        self.codec.write_frame(&frame.masked()).await
    }

    pub async fn send_text(&mut self, text: &str) -> wsmux::Result<()> {
        self.send(Frame::text(text)).await
    }

    /// Write bytes verbatim, bypassing framing.
    pub async fn send_raw(&mut self, data: &[u8]) -> wsmux::Result<()> {
        self.codec.write_raw(data).await
    }

    pub async fn recv(&mut self) -> wsmux::Result<Frame> {
        tokio::time::timeout(TIMEOUT, self.codec.read_frame())
            .await
            .expect("timed out waiting for frame")
    }

    pub async fn recv_text(&mut self) -> wsmux::Result<String> {
        let frame = self.recv().await?;
        assert_eq!(frame.opcode, OpCode::Text);
        Ok(String::from_utf8(frame.into_payload()).expect("utf-8 echo"))
    }

    /// Wait for the server to close the TCP connection.
    pub async fn expect_eof(self) {
        let mut stream = self.codec.into_inner();
        assert_closed(&mut stream).await;
    }
}

/// Read until the blank line ending an HTTP response header.
async fn read_response(stream: &mut TcpStream) -> wsmux::Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut byte = [0u8; 1];
    while !response.ends_with(b"\r\n\r\n") {
        let n = tokio::time::timeout(TIMEOUT, stream.read(&mut byte))
            .await
            .expect("timed out waiting for handshake")?;
        if n == 0 {
            return Err(wsmux::Error::ConnectionClosed);
        }
        response.push(byte[0]);
    }
    Ok(response)
}

/// Assert the peer closed the stream without sending anything more.
pub async fn assert_closed(stream: &mut TcpStream) {
    let mut rest = Vec::new();
    let read = tokio::time::timeout(TIMEOUT, stream.read_to_end(&mut rest))
        .await
        .expect("timed out waiting for close");
    // A reset is as good as a FIN here.
    if read.is_ok() {
        assert!(rest.is_empty(), "unexpected trailing bytes: {rest:?}");
    }
}
