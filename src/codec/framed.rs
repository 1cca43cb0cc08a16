use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::{Config, Limits};
use crate::error::{Error, Result};
use crate::protocol::frame::{MAX_HEADER_SIZE, header_len, parse_header, payload_size};
use crate::protocol::{Frame, MaskGenerator, apply_mask_fast};

/// Frame decoder/encoder over an async byte stream.
///
/// Reads are exact: a frame is either returned whole or the read fails, and
/// nothing of a partially received frame is kept.
pub struct WebSocketCodec<T> {
    io: T,
    write_buf: Vec<u8>,
    limits: Limits,
    masks: MaskGenerator,
}

impl<T> WebSocketCodec<T> {
    #[must_use]
    pub fn new(io: T, config: &Config) -> Self {
        Self {
            io,
            write_buf: Vec::with_capacity(config.write_buffer_size),
            limits: config.limits.clone(),
            masks: MaskGenerator::new(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    #[must_use]
    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.io
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> WebSocketCodec<T> {
    /// Decode the next frame from the stream.
    ///
    /// # Errors
    ///
    /// - `Error::ConnectionClosed` if the stream ends mid-frame
    /// - `Error::ReservedBitsSet`, `Error::InvalidPayloadLength` on malformed headers
    /// - `Error::FrameTooLarge` if the payload exceeds `limits.max_frame_size`
    /// - `Error::PayloadAllocation` if the payload buffer cannot be allocated
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; MAX_HEADER_SIZE];
        self.io.read_exact(&mut header[..2]).await?;

        let len = header_len(header[1]);
        self.io.read_exact(&mut header[2..len]).await?;
        let header = parse_header(&header[..len])?;

        self.limits.check_frame_size(header.payload_len)?;
        let size = payload_size(header.payload_len)?;

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(size)
            .map_err(|_| Error::PayloadAllocation { size })?;
        payload.resize(size, 0);
        self.io.read_exact(&mut payload).await?;

        if let Some(mask) = header.mask {
            apply_mask_fast(&mut payload, mask);
        }

        Ok(Frame::from_header(&header, payload))
    }

    /// Encode `frame` and write it in full.
    ///
    /// A masked frame without a key gets a fresh key from the codec's
    /// generator. The frame itself is left untouched.
    ///
    /// # Errors
    ///
    /// - `Error::ResponseAllocation` if the encode buffer cannot grow; nothing
    ///   has been written in that case
    /// - `Error::Io` on a failed or short write
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mask = if frame.masked {
            Some(
                frame
                    .masking_key
                    .unwrap_or_else(|| self.masks.next_mask()),
            )
        } else {
            None
        };

        self.write_buf.clear();
        frame.write(&mut self.write_buf, mask)?;
        self.io.write_all(&self.write_buf).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Write raw bytes in full, bypassing framing.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.io.write_all(data).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Shut down the write half of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}
