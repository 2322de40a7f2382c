use std::time::{Duration, Instant};

use tracing::info;
use zetta_frame::{Frame, FrameError, Integrity, RxStatus};
use zetta_link::{Link, LinkConfig, LinkError, LinkHandler};
use zetta_transport::Transport;

use crate::cmd::endpoint::connect;
use crate::cmd::SendArgs;
use crate::exit::{frame_error, link_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let config = LinkConfig::default().with_frame(args.wire.frame_config());
    let payload = args.payload.resolve()?;
    // Reject before connecting so a bad payload never costs a connection.
    if !config.frame.is_valid_length(payload.len()) {
        return Err(frame_error(
            "send failed",
            FrameError::PayloadTooLarge {
                size: payload.len(),
                max: usize::from(config.frame.max_payload_size),
            },
        ));
    }

    let transport = connect(&args.endpoint)?;
    let mut link = Link::new(transport, args.wire.integrity, config);
    for _ in 0..args.count {
        link.send(args.frame_type, &payload)
            .map_err(|err| link_error("send failed", err))?;
    }
    info!(
        count = args.count,
        target = %args.endpoint.target,
        "frames sent"
    );

    if args.wait {
        let frame = wait_for_frame(&mut link, args.wait_timeout)?;
        print_frame(&frame, &args.endpoint.target, format);
    }

    Ok(SUCCESS)
}

/// Poll the link until a verified frame arrives or `timeout` passes.
///
/// Rejected bytes are skipped; the link's handler has already logged them.
fn wait_for_frame<T, I, H>(link: &mut Link<T, I, H>, timeout: Duration) -> CliResult<Frame>
where
    T: Transport,
    I: Integrity,
    H: LinkHandler,
{
    let deadline = Instant::now() + timeout;
    loop {
        match link.poll() {
            Ok(Some(RxStatus::Complete)) => {
                if let Some(frame) = link.take_frame() {
                    return Ok(frame);
                }
            }
            Ok(Some(RxStatus::Pending)) | Ok(None) | Err(LinkError::Frame(_)) => {}
            Err(err) => return Err(link_error("receive failed", err)),
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("no reply within {timeout:?}"),
            ));
        }
    }
}
