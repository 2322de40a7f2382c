use tracing::debug;
use zetta_frame::{write_frame, Frame};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.wire.frame_config();
    let payload = args.payload.resolve()?;

    let frame = Frame::sealed(&config, &args.wire.integrity, args.frame_type, &payload)
        .map_err(|err| frame_error("encode failed", err))?;
    let mut wire = Vec::with_capacity(frame.wire_size());
    write_frame(&config, &frame, &mut wire).map_err(|err| frame_error("encode failed", err))?;

    debug!(frame_type = frame.frame_type(), len = frame.len(), "frame encoded");
    print_encoded(&frame, &wire, format);
    Ok(SUCCESS)
}
