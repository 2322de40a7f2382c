use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use zetta_frame::{Crc8, Integrity, RxStatus};
use zetta_transport::Transport;

use crate::error::{LinkError, Result};
use crate::handler::{LinkHandler, LoggingHandler};
use crate::link::Link;

/// A [`Link`] reachable from two call sites, such as an interrupt-like
/// receive thread and the main line.
///
/// The `try_*` operations never wait: contention surfaces as
/// [`LinkError::RxBusy`] or [`LinkError::TxBusy`] and the caller retries.
///
/// Both directions sit behind one lock. While another call site holds the
/// link for any reason, including feeding an RX byte, `try_send` reports
/// `TxBusy` even though [`Link::tx_gate`] is `Ready`. The error names the
/// operation that was refused, not the gate that was held.
pub struct SharedLink<T, I = Crc8, H = LoggingHandler> {
    inner: Mutex<Link<T, I, H>>,
}

impl<T: Transport, I: Integrity, H: LinkHandler> SharedLink<T, I, H> {
    pub fn new(link: Link<T, I, H>) -> Self {
        Self {
            inner: Mutex::new(link),
        }
    }

    /// Send unless another call site is using the link.
    pub fn try_send(&self, frame_type: u8, payload: &[u8]) -> Result<()> {
        self.try_lock(LinkError::TxBusy)?.send(frame_type, payload)
    }

    /// Feed one byte unless another call site is using the link.
    pub fn try_feed_byte(&self, byte: u8) -> Result<RxStatus> {
        self.try_lock(LinkError::RxBusy)?.feed_byte(byte)
    }

    /// Report transmit completion, waiting briefly for the link if needed.
    pub fn tx_complete(&self) {
        self.lock().tx_complete();
    }

    /// Run `f` with exclusive access to the link.
    pub fn with<R>(&self, f: impl FnOnce(&mut Link<T, I, H>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn into_inner(self) -> Link<T, I, H> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, Link<T, I, H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self, busy: LinkError) -> Result<MutexGuard<'_, Link<T, I, H>>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(guard),
            // Link state stays consistent across a panicking handler.
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(busy),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use zetta_transport::MemoryTransport;

    use super::*;
    use crate::config::LinkConfig;
    use crate::link::Gate;

    const REFERENCE: [u8; 7] = [0xAA, 0x01, 0x02, 0x01, 0x02, 0xDB, 0xBC];

    fn shared() -> SharedLink<MemoryTransport> {
        SharedLink::new(Link::new(MemoryTransport::new(), Crc8, LinkConfig::default()))
    }

    #[test]
    fn contention_maps_to_gate_errors() {
        let shared = shared();

        shared.with(|link| {
            assert!(matches!(shared.try_feed_byte(0xAA), Err(LinkError::RxBusy)));
            assert!(matches!(shared.try_send(1, b"x"), Err(LinkError::TxBusy)));
            // Lock contention, not the transmit gate, refused the send.
            assert_eq!(link.tx_gate(), Gate::Ready);
        });

        shared.try_feed_byte(0xAA).unwrap();
        shared.try_send(1, b"x").unwrap();
    }

    #[test]
    fn deferred_completion_through_shared_handle() {
        let shared = SharedLink::new(Link::new(
            MemoryTransport::new().with_deferred_completion(),
            Crc8,
            LinkConfig::default(),
        ));

        shared.try_send(1, b"a").unwrap();
        assert!(matches!(shared.try_send(1, b"b"), Err(LinkError::TxBusy)));

        shared.tx_complete();
        assert_eq!(shared.with(|link| link.tx_gate()), Gate::Ready);
        shared.try_send(1, b"b").unwrap();
    }

    #[test]
    fn feeder_thread_and_main_line_share_one_link() {
        let shared = Arc::new(shared());
        let feeder = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..10 {
                    for byte in REFERENCE {
                        loop {
                            match shared.try_feed_byte(byte) {
                                Err(LinkError::RxBusy) => thread::yield_now(),
                                other => {
                                    other.unwrap();
                                    break;
                                }
                            }
                        }
                    }
                }
            })
        };

        let mut sent = 0;
        while sent < 10 {
            match shared.try_send(2, b"tick") {
                Ok(()) => sent += 1,
                Err(LinkError::TxBusy) => thread::yield_now(),
                Err(err) => panic!("unexpected {err}"),
            }
        }
        feeder.join().unwrap();

        let link = Arc::try_unwrap(shared).ok().unwrap().into_inner();
        assert_eq!(link.stats().frames_received, 10);
        assert_eq!(link.stats().frames_sent, 10);
        assert_eq!(link.transport().sent().len(), 10);
    }
}
