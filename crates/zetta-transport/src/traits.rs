use crate::error::Result;

/// Outcome of handing a frame to [`Transport::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The bytes are fully written; the transmit path may be reused at once.
    Complete,
    /// The transfer was started and finishes later (DMA, interrupt driven
    /// UART). The owner must report completion back to the protocol instance.
    Pending,
}

/// A byte transport: the only thing the protocol needs from the link layer.
///
/// `send` is fire-and-forget from the protocol's point of view. Transports
/// that cannot finish synchronously return [`SendStatus::Pending`] and keep
/// the frame bytes alive themselves until the transfer is done.
pub trait Transport {
    /// Hand one complete wire frame to the link.
    fn send(&mut self, frame: &[u8]) -> Result<SendStatus>;

    /// Arm a read into `buf` and return how many bytes were delivered.
    ///
    /// `Ok(0)` means nothing is available right now; it is not end of stream.
    /// A closed stream is reported as [`TransportError::Closed`](crate::TransportError::Closed).
    fn receive_into(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Transport name for diagnostics.
    fn name(&self) -> &'static str {
        "transport"
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<SendStatus> {
        (**self).send(frame)
    }

    fn receive_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive_into(buf)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<SendStatus> {
        (**self).send(frame)
    }

    fn receive_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive_into(buf)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
