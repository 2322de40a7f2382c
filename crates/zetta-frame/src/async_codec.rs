use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::integrity::{Crc8, Integrity};
use crate::parser::FrameParser;

/// `tokio_util` codec over the byte-wise receive state machine.
///
/// Decoding skips noise and corrupted frames the same way
/// [`FrameReader`](crate::FrameReader) does. Encoding reseals each frame with
/// the codec's integrity function.
#[derive(Debug, Clone)]
pub struct ZettaCodec<I = Crc8> {
    parser: FrameParser,
    integrity: I,
}

impl ZettaCodec {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default(), Crc8)
    }
}

impl Default for ZettaCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Integrity> ZettaCodec<I> {
    pub fn with_config(config: FrameConfig, integrity: I) -> Self {
        Self {
            parser: FrameParser::new(config),
            integrity,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        self.parser.config()
    }
}

impl<I: Integrity> Decoder for ZettaCodec<I> {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        let outcome = self.parser.push_slice(&src[..], &self.integrity, |err| {
            debug!(%err, "discarding frame bytes");
        });
        src.advance(outcome.consumed);
        if outcome.complete {
            Ok(self.parser.completed().cloned())
        } else {
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if self.parser.in_frame() {
            self.parser.reset();
            return Err(FrameError::ConnectionClosed);
        }
        Ok(None)
    }
}

impl<I: Integrity> Encoder<Frame> for ZettaCodec<I> {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        let config = *self.parser.config();
        encode_frame(
            &config,
            &self.integrity,
            item.frame_type(),
            item.payload(),
            dst,
        )?;
        Ok(())
    }
}
