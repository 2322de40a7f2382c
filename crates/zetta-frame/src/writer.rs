use std::io::{ErrorKind, Write};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame, FrameConfig, MAX_WIRE_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::integrity::{Crc8, Integrity};

/// Pause before retrying a write or flush that returned `WouldBlock`.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T, I = Crc8> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    integrity: I,
}

impl<T: Write> FrameWriter<T> {
    /// Create a frame writer with the default configuration and CRC-8.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default(), Crc8)
    }
}

impl<T: Write, I: Integrity> FrameWriter<T, I> {
    /// Create a frame writer with explicit configuration and integrity function.
    pub fn with_config(inner: T, config: FrameConfig, integrity: I) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_WIRE_FRAME_SIZE),
            config,
            integrity,
        }
    }

    /// Write a frame's type and payload, recomputing the integrity byte.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.frame_type(), frame.payload())
    }

    /// Encode and send a typed payload (blocking).
    pub fn send(&mut self, frame_type: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(
            &self.config,
            &self.integrity,
            frame_type,
            payload,
            &mut self.buf,
        )?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WOULD_BLOCK_BACKOFF)
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WOULD_BLOCK_BACKOFF)
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current wire configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
