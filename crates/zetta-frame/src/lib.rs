//! Frame codec and byte-wise receive state machine for the zetta protocol.
//!
//! Every packet travels as a self-delimited frame:
//!
//! ```text
//! ┌───────┬──────┬─────┬──────────────┬─────┬──────┐
//! │ START │ TYPE │ LEN │ PAYLOAD      │ CRC │ STOP │
//! │ 0xAA  │ (1B) │ (1B)│ (LEN bytes)  │ (1B)│ 0xBC │
//! └───────┴──────┴─────┴──────────────┴─────┴──────┘
//! ```
//!
//! The CRC byte covers `TYPE ++ LEN ++ PAYLOAD`. Inbound bytes are consumed
//! one at a time by [`FrameParser`], which never blocks and never allocates,
//! so it can be driven straight from an interrupt or a one-byte DMA
//! completion.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod integrity;
pub mod packet_type;
pub mod parser;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::ZettaCodec;
pub use codec::{
    encode_frame, write_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    MAX_WIRE_FRAME_SIZE, PAYLOAD_CAPACITY, START_BYTE, STOP_BYTE, TRAILER_SIZE,
};
pub use error::{FrameError, Result};
pub use integrity::{
    checksum_byte, verify, Crc32Mpeg2, Crc8, Crc8Ff, Integrity, NoIntegrity,
};
pub use packet_type::{PacketType, ACK, PUBLISH, SUBSCRIBE};
pub use parser::{FeedOutcome, FrameParser, RxState, RxStatus, TypeFilter};
pub use reader::FrameReader;
pub use writer::FrameWriter;
