use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{SendStatus, Transport};

/// Pause before retrying a write that returned `WouldBlock`.
pub const WRITE_BACKOFF: Duration = Duration::from_millis(1);

/// Transport over any blocking `Read + Write` byte stream.
///
/// Works for TCP and Unix sockets as well as serial device files opened as
/// regular files. Sends complete synchronously: every call writes the whole
/// frame and flushes before returning [`SendStatus::Complete`].
#[derive(Debug)]
pub struct StreamTransport<S> {
    inner: S,
}

impl<S: Read + Write> StreamTransport<S> {
    /// Wrap a connected stream.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(WRITE_BACKOFF),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    fn send(&mut self, frame: &[u8]) -> Result<SendStatus> {
        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(WRITE_BACKOFF),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        self.flush()?;
        trace!(bytes = frame.len(), "frame written to stream");
        Ok(SendStatus::Complete)
    }

    fn receive_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}
