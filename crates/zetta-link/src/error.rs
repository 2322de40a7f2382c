use std::time::Duration;

/// Errors raised by a protocol instance.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Encoding or receive-path rejection.
    #[error("frame error: {0}")]
    Frame(#[from] zetta_frame::FrameError),

    /// The transport failed to send or receive.
    #[error("transport error: {0}")]
    Transport(#[from] zetta_transport::TransportError),

    /// A transmission is still in flight.
    #[error("transmit path busy")]
    TxBusy,

    /// Another call site is feeding the receive path.
    #[error("receive path busy")]
    RxBusy,

    /// A partially received frame sat idle longer than the configured bound.
    #[error("frame idle for longer than {idle:?}")]
    Timeout { idle: Duration },
}

impl LinkError {
    /// True for gate contention, which callers are expected to retry.
    pub fn is_busy(&self) -> bool {
        matches!(self, LinkError::TxBusy | LinkError::RxBusy)
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
