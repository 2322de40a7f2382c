use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::integrity::{Crc8, Integrity};
use crate::parser::FrameParser;

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 512;

/// Reads verified frames from any `Read` stream.
///
/// Bytes are run through a [`FrameParser`], so line noise and corrupted
/// frames are skipped instead of failing the stream. Rejections are logged
/// at debug level and counted. Bytes following a completed frame are kept
/// for the next call.
pub struct FrameReader<T, I = Crc8> {
    inner: T,
    buf: BytesMut,
    parser: FrameParser,
    integrity: I,
    rejections: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a frame reader with the default configuration and CRC-8.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default(), Crc8)
    }
}

impl<T: Read, I: Integrity> FrameReader<T, I> {
    /// Create a frame reader with explicit configuration and integrity function.
    pub fn with_config(inner: T, config: FrameConfig, integrity: I) -> Self {
        Self::with_parser(inner, FrameParser::new(config), integrity)
    }

    /// Create a frame reader around a preconfigured parser.
    pub fn with_parser(inner: T, parser: FrameParser, integrity: I) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            parser,
            integrity,
            rejections: 0,
        }
    }

    /// Read the next verified frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if !self.buf.is_empty() {
                let mut rejected = 0u64;
                let outcome = self.parser.push_slice(&self.buf, &self.integrity, |err| {
                    debug!(%err, "discarding frame bytes");
                    rejected += 1;
                });
                self.rejections += rejected;
                self.buf.advance(outcome.consumed);

                if outcome.complete {
                    if let Some(frame) = self.parser.completed() {
                        return Ok(frame.clone());
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of receive-path rejections seen so far.
    pub fn rejections(&self) -> u64 {
        self.rejections
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current wire configuration.
    pub fn config(&self) -> &FrameConfig {
        self.parser.config()
    }
}
