use tracing::{debug, info, warn};
use zetta_frame::{Frame, FrameConfig, FrameParser, Integrity};

use crate::cmd::DecodeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Everything recovered from one input buffer.
struct Decoded {
    frames: Vec<Frame>,
    rejections: usize,
    /// The input ended inside a frame.
    truncated: bool,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.input()?;
    let decoded = decode_all(&bytes, args.wire.frame_config(), &args.wire.integrity);

    for frame in &decoded.frames {
        print_frame(frame, "input", format);
    }
    info!(
        frames = decoded.frames.len(),
        rejections = decoded.rejections,
        truncated = decoded.truncated,
        "decode finished"
    );

    if decoded.frames.is_empty() {
        return Err(CliError::new(DATA_INVALID, "no valid frame in input"));
    }
    if args.strict && (decoded.rejections > 0 || decoded.truncated) {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "{} byte(s) rejected{}",
                decoded.rejections,
                if decoded.truncated { ", input ends mid-frame" } else { "" }
            ),
        ));
    }
    Ok(SUCCESS)
}

fn decode_all<I: Integrity>(bytes: &[u8], config: FrameConfig, integrity: &I) -> Decoded {
    let mut parser = FrameParser::new(config);
    let mut frames = Vec::new();
    let mut rejections = 0usize;
    let mut rest = bytes;

    loop {
        let outcome = parser.push_slice(rest, integrity, |err| {
            debug!(%err, "discarding frame bytes");
            rejections += 1;
        });
        rest = &rest[outcome.consumed..];
        if !outcome.complete {
            break;
        }
        if let Some(frame) = parser.completed() {
            frames.push(frame.clone());
        }
    }

    let truncated = parser.in_frame();
    if truncated {
        warn!("input ends inside a frame");
    }
    Decoded {
        frames,
        rejections,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use zetta_frame::Crc8;

    use super::*;

    #[test]
    fn recovers_frames_around_noise() {
        let bytes = [
            0x00, 0xAA, 0x01, 0x02, 0x01, 0x02, 0xDB, 0xBC, 0x55, 0xAA, 0x00, 0x00, 0x00, 0xBC,
        ];
        let decoded = decode_all(&bytes, FrameConfig::default(), &Crc8);

        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.frames[0].payload(), &[0x01, 0x02]);
        assert!(decoded.frames[1].is_empty());
        assert_eq!(decoded.rejections, 2);
        assert!(!decoded.truncated);
    }

    #[test]
    fn reports_truncated_tail() {
        let bytes = [0xAA, 0x01, 0x02, 0x01, 0x02, 0xDB, 0xBC, 0xAA, 0x01];
        let decoded = decode_all(&bytes, FrameConfig::default(), &Crc8);

        assert_eq!(decoded.frames.len(), 1);
        assert!(decoded.truncated);
    }

    #[test]
    fn corrupted_frame_is_not_returned() {
        let bytes = [0xAA, 0x01, 0x02, 0x01, 0x03, 0xDB, 0xBC];
        let decoded = decode_all(&bytes, FrameConfig::default(), &Crc8);

        assert!(decoded.frames.is_empty());
        assert_eq!(decoded.rejections, 1);
    }
}
