/// Errors raised while encoding, receiving or transporting frames.
///
/// The receive-side variants carry the offending byte so an error handler can
/// log exactly what arrived on the wire.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A byte other than the start delimiter arrived while waiting for a frame.
    #[error("invalid start byte {byte:#04x}")]
    InvalidStart { byte: u8 },

    /// The type byte was rejected by the configured type filter.
    #[error("invalid packet type {byte:#04x}")]
    InvalidType { byte: u8 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The received integrity byte does not match the computed one.
    #[error("crc mismatch (computed {expected:#04x}, received {actual:#04x})")]
    CrcMismatch { expected: u8, actual: u8 },

    /// A byte other than the stop delimiter terminated the frame.
    #[error("invalid stop byte {byte:#04x}")]
    InvalidStop { byte: u8 },

    /// The receive state machine reached a state it cannot continue from.
    #[error("receive state machine in invalid state")]
    InvalidState,

    /// The destination buffer cannot hold the encoded frame.
    #[error("buffer too small ({needed} bytes needed, {available} available)")]
    BufferTooSmall { needed: usize, available: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors raised by the byte-wise receive path.
    pub fn is_rx_rejection(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidStart { .. }
                | FrameError::InvalidType { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::CrcMismatch { .. }
                | FrameError::InvalidStop { .. }
                | FrameError::InvalidState
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
