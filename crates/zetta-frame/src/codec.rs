use std::fmt;

use bytes::BufMut;

use crate::error::{FrameError, Result};
use crate::integrity::{checksum_byte, Integrity};

/// Default start delimiter.
pub const START_BYTE: u8 = 0xAA;

/// Default stop delimiter.
pub const STOP_BYTE: u8 = 0xBC;

/// Default maximum payload size in bytes.
pub const DEFAULT_MAX_PAYLOAD: u8 = 25;

/// Largest payload the one-byte length field can describe.
pub const PAYLOAD_CAPACITY: usize = u8::MAX as usize;

/// Bytes before the payload: start + type + len.
pub const HEADER_SIZE: usize = 3;

/// Bytes after the payload: crc + stop.
pub const TRAILER_SIZE: usize = 2;

/// Largest frame any configuration can put on the wire.
pub const MAX_WIRE_FRAME_SIZE: usize = HEADER_SIZE + PAYLOAD_CAPACITY + TRAILER_SIZE;

/// type + len + payload storage.
const BODY_CAPACITY: usize = 2 + PAYLOAD_CAPACITY;

/// Wire format parameters shared by both ends of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Start delimiter. Default: `0xAA`.
    pub start_byte: u8,
    /// Stop delimiter. Default: `0xBC`.
    pub stop_byte: u8,
    /// Maximum payload length accepted or produced. Default: 25.
    pub max_payload_size: u8,
    /// When false the CRC byte is sent as zero and not checked on receive.
    pub crc_enabled: bool,
    /// Treat a rejected byte that equals the start delimiter as the start of
    /// a new frame instead of dropping it. Default: false.
    pub rescan_rejected_byte: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            start_byte: START_BYTE,
            stop_byte: STOP_BYTE,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            crc_enabled: true,
            rescan_rejected_byte: false,
        }
    }
}

impl FrameConfig {
    pub fn is_valid_start(&self, byte: u8) -> bool {
        byte == self.start_byte
    }

    pub fn is_valid_length(&self, len: usize) -> bool {
        len <= usize::from(self.max_payload_size)
    }

    pub fn is_valid_stop(&self, byte: u8) -> bool {
        byte == self.stop_byte
    }

    /// Bytes on the wire for a payload of `len` bytes.
    pub fn wire_size(len: usize) -> usize {
        HEADER_SIZE + len + TRAILER_SIZE
    }

    /// Upper bound of a frame under this configuration, used for buffer sizing.
    pub fn max_frame_size(&self) -> usize {
        Self::wire_size(usize::from(self.max_payload_size))
    }

    fn check_length(&self, len: usize) -> Result<()> {
        if self.is_valid_length(len) {
            Ok(())
        } else {
            Err(FrameError::PayloadTooLarge {
                size: len,
                max: usize::from(self.max_payload_size),
            })
        }
    }
}

/// One frame: type tag, payload and integrity byte.
///
/// Type, length and payload are stored back to back, exactly as they are
/// laid out on the wire, so the integrity span is a plain slice.
#[derive(Clone)]
pub struct Frame {
    body: [u8; BODY_CAPACITY],
    crc: u8,
}

impl Frame {
    /// An empty frame of type 0.
    pub const fn empty() -> Self {
        Self {
            body: [0; BODY_CAPACITY],
            crc: 0,
        }
    }

    /// Build an unsealed frame (crc 0) from a type tag and payload.
    pub fn new(frame_type: u8, payload: &[u8]) -> Result<Self> {
        if payload.len() > PAYLOAD_CAPACITY {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: PAYLOAD_CAPACITY,
            });
        }
        let mut frame = Self::empty();
        frame.body[0] = frame_type;
        frame.body[1] = payload.len() as u8;
        frame.body[2..2 + payload.len()].copy_from_slice(payload);
        Ok(frame)
    }

    /// Build a frame and compute its integrity byte under `config`.
    pub fn sealed<I: Integrity + ?Sized>(
        config: &FrameConfig,
        integrity: &I,
        frame_type: u8,
        payload: &[u8],
    ) -> Result<Self> {
        config.check_length(payload.len())?;
        let mut frame = Self::new(frame_type, payload)?;
        if config.crc_enabled {
            frame.crc = checksum_byte(integrity, frame.checked_span());
        }
        Ok(frame)
    }

    pub fn frame_type(&self) -> u8 {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        usize::from(self.body[1])
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn payload(&self) -> &[u8] {
        &self.body[2..2 + self.len()]
    }

    pub fn crc(&self) -> u8 {
        self.crc
    }

    /// The bytes covered by the integrity check: `type ++ len ++ payload`.
    pub fn checked_span(&self) -> &[u8] {
        &self.body[..2 + self.len()]
    }

    /// Bytes this frame occupies on the wire.
    pub fn wire_size(&self) -> usize {
        FrameConfig::wire_size(self.len())
    }

    pub(crate) fn set_type(&mut self, frame_type: u8) {
        self.body[0] = frame_type;
    }

    pub(crate) fn set_len(&mut self, len: u8) {
        self.body[1] = len;
    }

    /// Store one payload byte; `false` if `index` is outside the buffer.
    pub(crate) fn set_payload_byte(&mut self, index: usize, byte: u8) -> bool {
        match self.body.get_mut(2 + index) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_crc(&mut self, crc: u8) {
        self.crc = crc;
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.checked_span() == other.checked_span() && self.crc == other.crc
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("type", &self.frame_type())
            .field("len", &self.len())
            .field("payload", &self.payload())
            .field("crc", &self.crc)
            .finish()
    }
}

/// Write a sealed frame to `dst` in wire order.
///
/// Returns the number of bytes written. Nothing is written on error.
pub fn write_frame<B: BufMut>(
    config: &FrameConfig,
    frame: &Frame,
    dst: &mut B,
) -> Result<usize> {
    config.check_length(frame.len())?;
    let needed = frame.wire_size();
    if dst.remaining_mut() < needed {
        return Err(FrameError::BufferTooSmall {
            needed,
            available: dst.remaining_mut(),
        });
    }
    dst.put_u8(config.start_byte);
    dst.put_slice(frame.checked_span());
    dst.put_u8(frame.crc());
    dst.put_u8(config.stop_byte);
    Ok(needed)
}

/// Encode a typed payload into the wire format.
///
/// ```text
/// START | TYPE | LEN | PAYLOAD[..LEN] | CRC(TYPE ++ LEN ++ PAYLOAD) | STOP
/// ```
pub fn encode_frame<I, B>(
    config: &FrameConfig,
    integrity: &I,
    frame_type: u8,
    payload: &[u8],
    dst: &mut B,
) -> Result<usize>
where
    I: Integrity + ?Sized,
    B: BufMut,
{
    let frame = Frame::sealed(config, integrity, frame_type, payload)?;
    write_frame(config, &frame, dst)
}
