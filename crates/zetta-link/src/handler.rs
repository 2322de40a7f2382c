use tracing::{debug, trace, warn};
use zetta_frame::{packet_type, Frame, FrameError};

use crate::error::LinkError;

/// Callbacks invoked synchronously from inside a [`Link`](crate::Link).
///
/// Every method has an empty default body, so implementors override only
/// what they need. Callbacks run in the caller's context (possibly an
/// interrupt handler) and must not block.
pub trait LinkHandler {
    /// A verified frame is ready for retrieval.
    fn on_frame(&mut self, _frame: &Frame) {}

    /// The transmit gate was released.
    fn on_tx_complete(&mut self) {}

    /// A failure was raised on the transmit or receive path.
    ///
    /// For receive-path failures the partial frame is already gone.
    fn on_error(&mut self, _error: &LinkError) {}
}

impl<H: LinkHandler + ?Sized> LinkHandler for &mut H {
    fn on_frame(&mut self, frame: &Frame) {
        (**self).on_frame(frame)
    }

    fn on_tx_complete(&mut self) {
        (**self).on_tx_complete()
    }

    fn on_error(&mut self, error: &LinkError) {
        (**self).on_error(error)
    }
}

impl<H: LinkHandler + ?Sized> LinkHandler for Box<H> {
    fn on_frame(&mut self, frame: &Frame) {
        (**self).on_frame(frame)
    }

    fn on_tx_complete(&mut self) {
        (**self).on_tx_complete()
    }

    fn on_error(&mut self, error: &LinkError) {
        (**self).on_error(error)
    }
}

/// Default handler: reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl LinkHandler for LoggingHandler {
    fn on_frame(&mut self, frame: &Frame) {
        debug!(
            frame_type = packet_type::type_name(frame.frame_type()),
            len = frame.len(),
            "frame received"
        );
    }

    fn on_error(&mut self, error: &LinkError) {
        match error {
            // Line noise between frames.
            LinkError::Frame(FrameError::InvalidStart { byte }) => {
                trace!(byte = *byte, "byte outside frame dropped");
            }
            LinkError::Frame(err) if err.is_rx_rejection() => {
                debug!(%err, "frame discarded");
            }
            LinkError::Timeout { idle } => warn!(?idle, "partial frame expired"),
            other => warn!(error = %other, "link error"),
        }
    }
}
