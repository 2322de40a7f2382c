use std::time::Duration;

use tracing::{debug, trace};
use zetta_frame::{
    write_frame, Crc8, FeedOutcome, Frame, FrameError, FrameParser, Integrity, RxState, RxStatus,
    TypeFilter, MAX_WIRE_FRAME_SIZE,
};
use zetta_transport::{SendStatus, Transport};

use crate::clock::{Clock, MonotonicClock};
use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::handler::{LinkHandler, LoggingHandler};
use crate::stats::LinkStats;

/// Two-state flag guarding one direction of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Ready,
    Busy,
}

struct TxContext {
    gate: Gate,
    buf: [u8; MAX_WIRE_FRAME_SIZE],
    last: Option<Frame>,
}

struct RxContext {
    parser: FrameParser,
    last_byte_at: Option<Duration>,
}

/// One protocol instance: a transport, an integrity function and a handler
/// bound to a single transmit context and a single receive context.
///
/// The transmit buffer lives inside the instance and is sized for the
/// largest possible wire frame, so two links never share state.
pub struct Link<T, I = Crc8, H = LoggingHandler> {
    transport: T,
    integrity: I,
    handler: H,
    clock: Box<dyn Clock + Send>,
    config: LinkConfig,
    tx: TxContext,
    rx: RxContext,
    stats: LinkStats,
}

impl<T: Transport, I: Integrity> Link<T, I> {
    /// Create a link with both gates ready and the default logging handler.
    pub fn new(transport: T, integrity: I, config: LinkConfig) -> Self {
        Self {
            transport,
            integrity,
            handler: LoggingHandler,
            clock: Box::new(MonotonicClock::new()),
            config,
            tx: TxContext {
                gate: Gate::Ready,
                buf: [0; MAX_WIRE_FRAME_SIZE],
                last: None,
            },
            rx: RxContext {
                parser: FrameParser::new(config.frame),
                last_byte_at: None,
            },
            stats: LinkStats::default(),
        }
    }
}

impl<T: Transport, I: Integrity, H: LinkHandler> Link<T, I, H> {
    /// Replace the event handler.
    pub fn with_handler<H2: LinkHandler>(self, handler: H2) -> Link<T, I, H2> {
        Link {
            transport: self.transport,
            integrity: self.integrity,
            handler,
            clock: self.clock,
            config: self.config,
            tx: self.tx,
            rx: self.rx,
            stats: self.stats,
        }
    }

    /// Replace the time source used for the idle timeout.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Reject frames whose type byte fails `filter`.
    pub fn with_type_filter(mut self, filter: TypeFilter) -> Self {
        self.rx.parser = FrameParser::new(self.config.frame).with_type_filter(filter);
        self
    }

    /// Encode and hand one frame to the transport without blocking.
    ///
    /// Fails with [`LinkError::TxBusy`] while an earlier transmission is
    /// still pending. A payload over the configured maximum is rejected
    /// before the transport is touched.
    pub fn send(&mut self, frame_type: u8, payload: &[u8]) -> Result<()> {
        let frame = match Frame::sealed(&self.config.frame, &self.integrity, frame_type, payload) {
            Ok(frame) => frame,
            Err(err) => return Err(self.tx_failed(err.into())),
        };

        if self.tx.gate == Gate::Busy {
            return Err(LinkError::TxBusy);
        }

        let written = {
            let mut dst = &mut self.tx.buf[..];
            write_frame(&self.config.frame, &frame, &mut dst)
        };
        let len = match written {
            Ok(len) => len,
            Err(err) => return Err(self.tx_failed(err.into())),
        };

        self.tx.gate = Gate::Busy;
        self.tx.last = Some(frame);
        debug!(
            frame_type,
            len = payload.len(),
            transport = self.transport.name(),
            "sending frame"
        );

        match self.transport.send(&self.tx.buf[..len]) {
            Ok(SendStatus::Complete) => {
                self.tx_complete();
                Ok(())
            }
            Ok(SendStatus::Pending) => Ok(()),
            Err(err) => {
                self.tx.gate = Gate::Ready;
                Err(self.tx_failed(err.into()))
            }
        }
    }

    /// Report that the transport finished the pending transmission.
    ///
    /// Called from the transport's completion context. A completion with
    /// nothing in flight is ignored.
    pub fn tx_complete(&mut self) {
        if self.tx.gate == Gate::Ready {
            trace!("transmit completion with nothing in flight");
            return;
        }
        self.tx.gate = Gate::Ready;
        self.stats.frames_sent += 1;
        self.handler.on_tx_complete();
    }

    /// Feed one inbound byte to the receive state machine.
    ///
    /// Never blocks and never allocates. Rejections are passed to the
    /// handler and returned; the partial frame is already discarded by then.
    pub fn feed_byte(&mut self, byte: u8) -> Result<RxStatus> {
        if self.config.idle_timeout.is_some() {
            let now = self.clock.now();
            if let Some(idle) = self.idle_expired(now) {
                self.expire(idle);
            }
            self.rx.last_byte_at = Some(now);
        }

        self.stats.bytes_received += 1;
        match self.rx.parser.push_byte(byte, &self.integrity) {
            Ok(RxStatus::Complete) => {
                self.stats.frames_received += 1;
                if let Some(frame) = self.rx.parser.completed() {
                    self.handler.on_frame(frame);
                }
                Ok(RxStatus::Complete)
            }
            Ok(RxStatus::Pending) => Ok(RxStatus::Pending),
            Err(err) => {
                match err {
                    FrameError::InvalidStart { .. } => self.stats.noise_bytes += 1,
                    FrameError::CrcMismatch { .. } => self.stats.crc_errors += 1,
                    _ => self.stats.frame_errors += 1,
                }
                Err(self.dispatch(err.into()))
            }
        }
    }

    /// Feed bytes until the first frame completes.
    ///
    /// Rejections are dispatched to the handler and scanning continues.
    /// Bytes after the completed frame are left for the caller.
    pub fn feed(&mut self, bytes: &[u8]) -> FeedOutcome {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Ok(RxStatus::Complete) = self.feed_byte(byte) {
                return FeedOutcome {
                    consumed: i + 1,
                    complete: true,
                };
            }
        }
        FeedOutcome {
            consumed: bytes.len(),
            complete: false,
        }
    }

    /// Arm a one-byte receive on the transport and feed what arrives.
    ///
    /// Returns `Ok(None)` when the transport has nothing to deliver.
    pub fn poll(&mut self) -> Result<Option<RxStatus>> {
        let mut byte = [0u8; 1];
        let received = match self.transport.receive_into(&mut byte) {
            Ok(n) => n,
            Err(err) => return Err(self.dispatch(err.into())),
        };
        if received == 0 {
            return Ok(None);
        }
        self.feed_byte(byte[0]).map(Some)
    }

    /// Discard a partial frame that has been idle longer than the bound.
    ///
    /// Lets a caller expire a stalled frame when no further byte arrives.
    pub fn check_timeout(&mut self) -> Result<()> {
        if self.config.idle_timeout.is_none() {
            return Ok(());
        }
        let now = self.clock.now();
        match self.idle_expired(now) {
            Some(idle) => {
                self.expire(idle);
                Err(LinkError::Timeout { idle })
            }
            None => Ok(()),
        }
    }

    /// Drop any partial frame. The last verified frame stays available.
    pub fn reset_rx(&mut self) {
        self.rx.parser.reset();
        self.rx.last_byte_at = None;
    }

    /// The most recent verified frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.rx.parser.completed()
    }

    pub fn last_payload(&self) -> Option<&[u8]> {
        self.last_frame().map(Frame::payload)
    }

    pub fn last_type(&self) -> Option<u8> {
        self.last_frame().map(Frame::frame_type)
    }

    /// Copy the last verified payload into `dst`.
    ///
    /// Returns `None` if no frame is ready or `dst` cannot hold the payload.
    pub fn copy_payload(&self, dst: &mut [u8]) -> Option<usize> {
        let payload = self.last_payload()?;
        let slot = dst.get_mut(..payload.len())?;
        slot.copy_from_slice(payload);
        Some(payload.len())
    }

    /// Take the last verified frame, leaving nothing ready.
    pub fn take_frame(&mut self) -> Option<Frame> {
        let frame = self.rx.parser.completed().cloned();
        self.rx.parser.clear_completed();
        frame
    }

    /// The frame handed to the transport most recently.
    pub fn last_sent(&self) -> Option<&Frame> {
        self.tx.last.as_ref()
    }

    pub fn tx_gate(&self) -> Gate {
        self.tx.gate
    }

    pub fn rx_state(&self) -> RxState {
        self.rx.parser.state()
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn idle_expired(&self, now: Duration) -> Option<Duration> {
        let idle = self.config.idle_timeout?;
        let last = self.rx.last_byte_at?;
        (self.rx.parser.in_frame() && now.saturating_sub(last) > idle).then_some(idle)
    }

    fn expire(&mut self, idle: Duration) {
        self.rx.parser.reset();
        self.stats.timeouts += 1;
        self.dispatch(LinkError::Timeout { idle });
    }

    fn tx_failed(&mut self, err: LinkError) -> LinkError {
        self.stats.tx_errors += 1;
        self.dispatch(err)
    }

    fn dispatch(&mut self, err: LinkError) -> LinkError {
        self.handler.on_error(&err);
        err
    }
}
