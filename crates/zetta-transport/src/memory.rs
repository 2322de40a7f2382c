use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{SendStatus, Transport};

/// In-memory transport.
///
/// Records every frame handed to [`Transport::send`] and serves inbound
/// bytes queued with [`MemoryTransport::push_inbound`]. With deferred
/// completion enabled, sends report [`SendStatus::Pending`] the way a DMA
/// driven UART would, leaving the caller to signal completion later.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
    deferred: bool,
    failing: bool,
    closed: bool,
}

impl MemoryTransport {
    /// Create an empty transport that completes sends synchronously.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every send as [`SendStatus::Pending`].
    pub fn with_deferred_completion(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Make subsequent sends fail with an I/O error.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Mark the inbound side as closed once the queue drains.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Queue bytes for delivery through [`Transport::receive_into`].
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Take the recorded frames, leaving the record empty.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }

    /// Number of inbound bytes not yet delivered.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &[u8]) -> Result<SendStatus> {
        if self.failing {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "memory transport set to fail",
            )));
        }
        self.sent.push(frame.to_vec());
        trace!(bytes = frame.len(), deferred = self.deferred, "frame captured");
        if self.deferred {
            Ok(SendStatus::Pending)
        } else {
            Ok(SendStatus::Complete)
        }
    }

    fn receive_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.inbound.is_empty() {
            return if self.closed && !buf.is_empty() {
                Err(TransportError::Closed)
            } else {
                Ok(0)
            };
        }
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sent_frames_in_order() {
        let mut transport = MemoryTransport::new();
        assert_eq!(transport.send(b"one").unwrap(), SendStatus::Complete);
        assert_eq!(transport.send(b"two").unwrap(), SendStatus::Complete);

        assert_eq!(transport.sent(), &[b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(transport.take_sent().len(), 2);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn deferred_completion_reports_pending() {
        let mut transport = MemoryTransport::new().with_deferred_completion();
        assert_eq!(transport.send(&[0xAA]).unwrap(), SendStatus::Pending);
    }

    #[test]
    fn failing_send_is_not_recorded() {
        let mut transport = MemoryTransport::new();
        transport.set_failing(true);
        assert!(matches!(
            transport.send(&[0xAA]),
            Err(TransportError::Io(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn receive_into_drains_queue_in_chunks() {
        let mut transport = MemoryTransport::new();
        transport.push_inbound(&[1, 2, 3]);

        let mut buf = [0u8; 2];
        assert_eq!(transport.receive_into(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(transport.receive_into(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 3);
        assert_eq!(transport.receive_into(&mut buf).unwrap(), 0);
        assert_eq!(transport.pending_inbound(), 0);
    }

    #[test]
    fn closed_transport_reports_closed_after_drain() {
        let mut transport = MemoryTransport::new();
        transport.push_inbound(&[9]);
        transport.close();

        let mut buf = [0u8; 1];
        assert_eq!(transport.receive_into(&mut buf).unwrap(), 1);
        assert!(matches!(
            transport.receive_into(&mut buf),
            Err(TransportError::Closed)
        ));
    }
}
