//! Byte-wise receive state machine.
//!
//! ```text
//! WaitStart ─start─▶ GetType ─▶ GetLen ─len>0─▶ GetPayload ─len bytes─▶ GetCrc ─▶ GetStop
//!     ▲                           │ len=0                                 ▲          │
//!     │                           └───────────────────────────────────────┘          │
//!     └──────────────────── complete, or any rejection ─────────────────────────────┘
//! ```
//!
//! [`FrameParser::push_byte`] does a bounded amount of work per byte, holds
//! no locks and never allocates. Every rejection discards the partial frame
//! and returns the machine to [`RxState::WaitStart`].

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::integrity::{verify, Integrity};

/// Receive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    WaitStart,
    GetType,
    GetLen,
    GetPayload,
    GetCrc,
    GetStop,
}

/// Result of feeding one accepted byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStatus {
    /// More bytes are needed.
    Pending,
    /// A frame was completed and verified.
    Complete,
}

/// Result of feeding a run of bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Bytes taken from the input, including the one that completed a frame.
    pub consumed: usize,
    /// Whether a verified frame is now available.
    pub complete: bool,
}

/// Predicate deciding whether a type byte is acceptable.
pub type TypeFilter = fn(u8) -> bool;

/// Reassembles frames from a byte stream, one byte per call.
#[derive(Debug, Clone)]
pub struct FrameParser {
    config: FrameConfig,
    state: RxState,
    index: usize,
    work: Frame,
    completed: Frame,
    ready: bool,
    type_filter: Option<TypeFilter>,
}

impl FrameParser {
    /// Create a parser in [`RxState::WaitStart`].
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            state: RxState::WaitStart,
            index: 0,
            work: Frame::empty(),
            completed: Frame::empty(),
            ready: false,
            type_filter: None,
        }
    }

    /// Reject type bytes for which `filter` returns false.
    pub fn with_type_filter(mut self, filter: TypeFilter) -> Self {
        self.type_filter = Some(filter);
        self
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    /// True while a frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.state != RxState::WaitStart
    }

    /// The most recent verified frame, if any.
    pub fn completed(&self) -> Option<&Frame> {
        self.ready.then_some(&self.completed)
    }

    /// Forget the most recent verified frame.
    pub fn clear_completed(&mut self) {
        self.ready = false;
    }

    /// Drop any partial frame and wait for a start delimiter.
    ///
    /// The last verified frame stays available.
    pub fn reset(&mut self) {
        self.state = RxState::WaitStart;
        self.index = 0;
    }

    /// Feed one byte.
    ///
    /// On error the partial frame is discarded and the machine is back in
    /// [`RxState::WaitStart`]. With
    /// [`rescan_rejected_byte`](FrameConfig::rescan_rejected_byte) a rejected
    /// byte equal to the start delimiter opens a new frame instead.
    pub fn push_byte<I: Integrity + ?Sized>(
        &mut self,
        byte: u8,
        integrity: &I,
    ) -> Result<RxStatus> {
        match self.step(byte, integrity) {
            Ok(status) => Ok(status),
            Err(err) => {
                self.reset();
                if self.config.rescan_rejected_byte && self.config.is_valid_start(byte) {
                    self.begin_frame();
                }
                Err(err)
            }
        }
    }

    /// Feed bytes until the first frame completes.
    ///
    /// Returns as soon as a frame is verified; the rest of `bytes` is left
    /// for the caller. Rejections are handed to `on_error` and scanning
    /// continues with the next byte.
    pub fn push_slice<I, E>(&mut self, bytes: &[u8], integrity: &I, mut on_error: E) -> FeedOutcome
    where
        I: Integrity + ?Sized,
        E: FnMut(FrameError),
    {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.push_byte(byte, integrity) {
                Ok(RxStatus::Complete) => {
                    return FeedOutcome {
                        consumed: i + 1,
                        complete: true,
                    }
                }
                Ok(RxStatus::Pending) => {}
                Err(err) => on_error(err),
            }
        }
        FeedOutcome {
            consumed: bytes.len(),
            complete: false,
        }
    }

    fn begin_frame(&mut self) {
        self.index = 0;
        self.state = RxState::GetType;
    }

    fn step<I: Integrity + ?Sized>(&mut self, byte: u8, integrity: &I) -> Result<RxStatus> {
        match self.state {
            RxState::WaitStart => {
                if !self.config.is_valid_start(byte) {
                    return Err(FrameError::InvalidStart { byte });
                }
                self.begin_frame();
            }
            RxState::GetType => {
                if let Some(accept) = self.type_filter {
                    if !accept(byte) {
                        return Err(FrameError::InvalidType { byte });
                    }
                }
                self.work.set_type(byte);
                self.state = RxState::GetLen;
            }
            RxState::GetLen => {
                if !self.config.is_valid_length(usize::from(byte)) {
                    return Err(FrameError::PayloadTooLarge {
                        size: usize::from(byte),
                        max: usize::from(self.config.max_payload_size),
                    });
                }
                self.work.set_len(byte);
                self.state = if byte == 0 {
                    RxState::GetCrc
                } else {
                    RxState::GetPayload
                };
            }
            RxState::GetPayload => {
                if !self.work.set_payload_byte(self.index, byte) {
                    return Err(FrameError::InvalidState);
                }
                self.index += 1;
                if self.index >= self.work.len() {
                    self.state = RxState::GetCrc;
                }
            }
            RxState::GetCrc => {
                self.work.set_crc(byte);
                self.state = RxState::GetStop;
            }
            RxState::GetStop => {
                if !self.config.is_valid_stop(byte) {
                    return Err(FrameError::InvalidStop { byte });
                }
                if self.config.crc_enabled {
                    verify(integrity, self.work.checked_span(), self.work.crc())?;
                }
                self.completed.clone_from(&self.work);
                self.ready = true;
                self.reset();
                return Ok(RxStatus::Complete);
            }
        }
        Ok(RxStatus::Pending)
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new(FrameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::integrity::{Crc8, NoIntegrity};

    fn wire(frame_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(&FrameConfig::default(), &Crc8, frame_type, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    fn feed_all(parser: &mut FrameParser, bytes: &[u8]) -> Vec<Result<RxStatus>> {
        bytes.iter().map(|b| parser.push_byte(*b, &Crc8)).collect()
    }

    #[test]
    fn walks_every_state_for_reference_frame() {
        let mut parser = FrameParser::default();
        let bytes = [0xAA, 0x01, 0x02, 0x01, 0x02, 0xDB, 0xBC];
        let expected_states = [
            RxState::GetType,
            RxState::GetLen,
            RxState::GetPayload,
            RxState::GetPayload,
            RxState::GetCrc,
            RxState::GetStop,
            RxState::WaitStart,
        ];

        for (byte, expected) in bytes.iter().zip(expected_states) {
            let status = parser.push_byte(*byte, &Crc8).unwrap();
            assert_eq!(parser.state(), expected);
            if expected == RxState::WaitStart {
                assert_eq!(status, RxStatus::Complete);
            } else {
                assert_eq!(status, RxStatus::Pending);
            }
        }

        let frame = parser.completed().unwrap();
        assert_eq!(frame.frame_type(), 1);
        assert_eq!(frame.payload(), &[0x01, 0x02]);
    }

    #[test]
    fn zero_length_skips_payload_state() {
        let mut parser = FrameParser::default();
        parser.push_byte(0xAA, &Crc8).unwrap();
        parser.push_byte(0x00, &Crc8).unwrap();
        parser.push_byte(0x00, &Crc8).unwrap();
        assert_eq!(parser.state(), RxState::GetCrc);

        parser.push_byte(0x00, &Crc8).unwrap();
        assert_eq!(
            parser.push_byte(0xBC, &Crc8).unwrap(),
            RxStatus::Complete
        );
        let frame = parser.completed().unwrap();
        assert_eq!(frame.frame_type(), 0);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn stray_byte_while_waiting_is_invalid_start() {
        let mut parser = FrameParser::default();
        let err = parser.push_byte(0x42, &Crc8).unwrap_err();

        assert!(matches!(err, FrameError::InvalidStart { byte: 0x42 }));
        assert_eq!(parser.state(), RxState::WaitStart);
        assert!(parser.completed().is_none());
    }

    #[test]
    fn oversize_length_aborts_frame() {
        let mut parser = FrameParser::default();
        parser.push_byte(0xAA, &Crc8).unwrap();
        parser.push_byte(0x01, &Crc8).unwrap();
        let err = parser.push_byte(26, &Crc8).unwrap_err();

        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 26, max: 25 }
        ));
        assert_eq!(parser.state(), RxState::WaitStart);
    }

    #[test]
    fn corrupted_payload_is_crc_mismatch_and_next_frame_parses() {
        let mut parser = FrameParser::default();
        let mut bad = wire(1, b"abc");
        bad[4] ^= 0x01;

        let results = feed_all(&mut parser, &bad);
        assert!(matches!(
            results.last(),
            Some(Err(FrameError::CrcMismatch { .. }))
        ));
        assert!(parser.completed().is_none());
        assert_eq!(parser.state(), RxState::WaitStart);

        let results = feed_all(&mut parser, &wire(2, b"ok"));
        assert!(matches!(results.last(), Some(Ok(RxStatus::Complete))));
        assert_eq!(parser.completed().unwrap().payload(), b"ok");
    }

    #[test]
    fn corrupted_crc_byte_is_rejected() {
        let mut parser = FrameParser::default();
        let mut bad = wire(1, &[0x01, 0x02]);
        let crc_pos = bad.len() - 2;
        bad[crc_pos] = bad[crc_pos].wrapping_add(1);

        let results = feed_all(&mut parser, &bad);
        assert!(matches!(
            results.last(),
            Some(Err(FrameError::CrcMismatch {
                expected: 0xDB,
                actual: 0xDC
            }))
        ));
    }

    #[test]
    fn wrong_terminator_is_invalid_stop() {
        let mut parser = FrameParser::default();
        let mut bad = wire(1, b"x");
        let stop_pos = bad.len() - 1;
        bad[stop_pos] = 0x00;

        let results = feed_all(&mut parser, &bad);
        assert!(matches!(
            results.last(),
            Some(Err(FrameError::InvalidStop { byte: 0x00 }))
        ));
        assert_eq!(parser.state(), RxState::WaitStart);
    }

    #[test]
    fn rejected_start_byte_is_dropped_by_default() {
        let mut parser = FrameParser::default();
        let mut bytes = wire(1, b"x");
        let stop_pos = bytes.len() - 1;
        bytes[stop_pos] = 0xAA;
        // The 0xAA that replaced the stop byte would have opened this frame.
        bytes.extend_from_slice(&[0x01, 0x00, 0x15, 0xBC]);

        let results = feed_all(&mut parser, &bytes);
        assert!(results.iter().all(|r| !matches!(r, Ok(RxStatus::Complete))));
    }

    #[test]
    fn rescan_turns_rejected_start_byte_into_new_frame() {
        let mut parser = FrameParser::new(FrameConfig {
            rescan_rejected_byte: true,
            ..FrameConfig::default()
        });
        let mut bytes = wire(1, b"x");
        let stop_pos = bytes.len() - 1;
        bytes[stop_pos] = 0xAA;
        bytes.extend_from_slice(&[0x01, 0x00, 0x15, 0xBC]);

        let results = feed_all(&mut parser, &bytes);
        assert!(matches!(
            results[stop_pos],
            Err(FrameError::InvalidStop { byte: 0xAA })
        ));
        assert!(matches!(results.last(), Some(Ok(RxStatus::Complete))));
        let frame = parser.completed().unwrap();
        assert_eq!(frame.frame_type(), 1);
        assert!(frame.is_empty());
    }

    #[test]
    fn rescan_treats_oversize_length_equal_to_start_as_new_frame() {
        // 0xAA as a length exceeds the 25-byte limit and is also the start
        // delimiter; the empty frame after it is `01 00 15 BC`.
        let bytes = [0xAA, 0x01, 0xAA, 0x01, 0x00, 0x15, 0xBC];

        let mut parser = FrameParser::new(FrameConfig {
            rescan_rejected_byte: true,
            ..FrameConfig::default()
        });
        let results = feed_all(&mut parser, &bytes);
        assert!(matches!(
            results[2],
            Err(FrameError::PayloadTooLarge { size: 0xAA, max: 25 })
        ));
        assert!(matches!(results.last(), Some(Ok(RxStatus::Complete))));
        let frame = parser.completed().unwrap();
        assert_eq!(frame.frame_type(), 1);
        assert!(frame.is_empty());

        // Without rescan the rejected delimiter is dropped with its frame.
        let mut parser = FrameParser::default();
        let results = feed_all(&mut parser, &bytes);
        assert!(results.iter().all(|r| !matches!(r, Ok(RxStatus::Complete))));
        assert!(parser.completed().is_none());
    }

    #[test]
    fn type_filter_rejects_unknown_types() {
        let mut parser = FrameParser::default().with_type_filter(|t| t <= 2);
        parser.push_byte(0xAA, &Crc8).unwrap();
        let err = parser.push_byte(0x09, &Crc8).unwrap_err();

        assert!(matches!(err, FrameError::InvalidType { byte: 0x09 }));
        assert_eq!(parser.state(), RxState::WaitStart);
    }

    #[test]
    fn disabled_crc_accepts_any_integrity_byte() {
        let mut parser = FrameParser::new(FrameConfig {
            crc_enabled: false,
            ..FrameConfig::default()
        });
        let bytes = [0xAA, 0x05, 0x01, 0x33, 0xEE, 0xBC];
        let results: Vec<_> = bytes
            .iter()
            .map(|b| parser.push_byte(*b, &NoIntegrity))
            .collect();

        assert!(matches!(results.last(), Some(Ok(RxStatus::Complete))));
        assert_eq!(parser.completed().unwrap().payload(), &[0x33]);
    }

    #[test]
    fn back_to_back_frames_do_not_leak_state() {
        let mut parser = FrameParser::default();
        let mut bytes = wire(1, b"first payload");
        bytes.extend(wire(2, b"2nd"));

        let mut frames = Vec::new();
        let mut rest = &bytes[..];
        loop {
            let outcome = parser.push_slice(rest, &Crc8, |err| panic!("unexpected {err}"));
            if !outcome.complete {
                break;
            }
            frames.push(parser.completed().unwrap().clone());
            rest = &rest[outcome.consumed..];
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].frame_type(), 1);
        assert_eq!(frames[0].payload(), b"first payload");
        assert_eq!(frames[1].frame_type(), 2);
        assert_eq!(frames[1].payload(), b"2nd");
    }

    #[test]
    fn push_slice_stops_at_first_frame() {
        let mut parser = FrameParser::default();
        let first = wire(1, b"a");
        let mut bytes = first.clone();
        bytes.extend(wire(1, b"b"));

        let outcome = parser.push_slice(&bytes, &Crc8, |_| {});
        assert_eq!(
            outcome,
            FeedOutcome {
                consumed: first.len(),
                complete: true
            }
        );
        assert_eq!(parser.completed().unwrap().payload(), b"a");
    }

    #[test]
    fn push_slice_reports_rejections_and_keeps_scanning() {
        let mut parser = FrameParser::default();
        let mut bytes = vec![0x00, 0x11];
        bytes.extend(wire(1, b"z"));

        let mut errors = Vec::new();
        let outcome = parser.push_slice(&bytes, &Crc8, |err| errors.push(err));

        assert!(outcome.complete);
        assert_eq!(outcome.consumed, bytes.len());
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, FrameError::InvalidStart { .. })));
    }

    #[test]
    fn completed_frame_survives_next_partial_frame() {
        let mut parser = FrameParser::default();
        feed_all(&mut parser, &wire(1, b"keep"));
        feed_all(&mut parser, &[0xAA, 0x02, 0x03, b'n', b'e']);

        assert!(parser.in_frame());
        assert_eq!(parser.completed().unwrap().payload(), b"keep");

        parser.clear_completed();
        assert!(parser.completed().is_none());
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut parser = FrameParser::default();
        feed_all(&mut parser, &[0xAA, 0x01, 0x05, 0x01]);
        assert_eq!(parser.state(), RxState::GetPayload);

        parser.reset();
        assert_eq!(parser.state(), RxState::WaitStart);
        assert!(!parser.in_frame());
    }

    #[test]
    fn full_capacity_payload_round_trips() {
        let config = FrameConfig {
            max_payload_size: u8::MAX,
            ..FrameConfig::default()
        };
        let payload: Vec<u8> = (0..=254u8).collect();
        let mut buf = BytesMut::new();
        encode_frame(&config, &Crc8, 7, &payload, &mut buf).unwrap();

        let mut parser = FrameParser::new(config);
        let outcome = parser.push_slice(&buf, &Crc8, |err| panic!("unexpected {err}"));
        assert!(outcome.complete);
        assert_eq!(parser.completed().unwrap().payload(), payload.as_slice());
    }
}
