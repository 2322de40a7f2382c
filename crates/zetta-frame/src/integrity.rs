//! Integrity checking over the `TYPE ++ LEN ++ PAYLOAD` span.
//!
//! The checksum function is injected. Its result may be wider than a byte
//! (a 32-bit hardware CRC unit, for example); only the low byte travels on
//! the wire. That truncation is the protocol's accepted weak-integrity mode:
//! links that need stronger protection must use a wider CRC field.

use crc::{Algorithm, Crc, CRC_32_MPEG_2, CRC_8_SMBUS};

use crate::error::{FrameError, Result};

/// Polynomial 0x07 with the register preset to 0xFF. Not in the catalog;
/// this is what host tools that set an all-ones init value compute.
const CRC_8_PRESET_FF: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x07,
    init: 0xff,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xfb,
    residue: 0x00,
};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC8_FF: Crc<u8> = Crc::<u8>::new(&CRC_8_PRESET_FF);
const CRC32_MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// A checksum over a byte span.
pub trait Integrity {
    /// Compute the checksum of `data`. Only the low byte is kept on the wire.
    fn compute(&self, data: &[u8]) -> u32;
}

impl<F> Integrity for F
where
    F: Fn(&[u8]) -> u32,
{
    fn compute(&self, data: &[u8]) -> u32 {
        self(data)
    }
}

/// CRC-8 with polynomial 0x07 (CRC-8/SMBUS). The default software CRC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8;

impl Integrity for Crc8 {
    fn compute(&self, data: &[u8]) -> u32 {
        u32::from(CRC8.checksum(data))
    }
}

/// CRC-8 with polynomial 0x07 and initial value 0xFF.
///
/// Use this to talk to host tooling that presets the CRC register to all
/// ones. It is not wire compatible with [`Crc8`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8Ff;

impl Integrity for Crc8Ff {
    fn compute(&self, data: &[u8]) -> u32 {
        u32::from(CRC8_FF.checksum(data))
    }
}

/// CRC-32/MPEG-2, as produced by the reset configuration of common MCU
/// hardware CRC units. Truncated to its low byte on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32Mpeg2;

impl Integrity for Crc32Mpeg2 {
    fn compute(&self, data: &[u8]) -> u32 {
        CRC32_MPEG2.checksum(data)
    }
}

/// Integrity disabled: always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoIntegrity;

impl Integrity for NoIntegrity {
    fn compute(&self, _data: &[u8]) -> u32 {
        0
    }
}

/// Compute the on-wire integrity byte for `span`.
pub fn checksum_byte<I: Integrity + ?Sized>(integrity: &I, span: &[u8]) -> u8 {
    (integrity.compute(span) & 0xFF) as u8
}

/// Check a received integrity byte against `span`.
pub fn verify<I: Integrity + ?Sized>(integrity: &I, span: &[u8], received: u8) -> Result<()> {
    let expected = checksum_byte(integrity, span);
    if expected == received {
        Ok(())
    } else {
        Err(FrameError::CrcMismatch {
            expected,
            actual: received,
        })
    }
}
