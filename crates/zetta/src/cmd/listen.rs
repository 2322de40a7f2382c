use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use zetta_frame::{Integrity, RxStatus, ACK};
use zetta_link::{Link, LinkConfig, LinkError, LinkHandler};
use zetta_transport::{Transport, TransportError};

use crate::cmd::endpoint::Listener;
use crate::cmd::ListenArgs;
use crate::exit::{link_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

/// How a session ended.
#[derive(Debug, PartialEq, Eq)]
enum Session {
    /// The peer went away; wait for the next one.
    Closed,
    /// Frame budget reached or shutdown requested.
    Done,
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let mut listener = Listener::bind(&args.endpoint)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let config = LinkConfig {
        frame: args.wire.frame_config(),
        idle_timeout: args.idle_timeout,
    };
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let Some((transport, source)) = listener.accept()? else {
            break;
        };
        info!(%source, "session started");

        let mut link = Link::new(transport, args.wire.integrity, config);
        let outcome = serve(&mut link, &args, &source, format, &running, &mut printed);
        if args.stats {
            print_stats(link.stats(), &source, format);
        }
        if outcome? == Session::Done {
            break;
        }
    }

    Ok(SUCCESS)
}

fn serve<T, I, H>(
    link: &mut Link<T, I, H>,
    args: &ListenArgs,
    source: &str,
    format: OutputFormat,
    running: &AtomicBool,
    printed: &mut usize,
) -> CliResult<Session>
where
    T: Transport,
    I: Integrity,
    H: LinkHandler,
{
    while running.load(Ordering::SeqCst) {
        match link.poll() {
            Ok(Some(RxStatus::Complete)) => {
                let Some(frame) = link.take_frame() else {
                    continue;
                };
                if let Some(types) = &args.types {
                    if !types.contains(&frame.frame_type()) {
                        continue;
                    }
                }

                print_frame(&frame, source, format);
                if args.ack {
                    link.send(ACK, &[])
                        .map_err(|err| link_error("ack failed", err))?;
                }

                *printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| *printed >= count) {
                    return Ok(Session::Done);
                }
            }
            Ok(Some(RxStatus::Pending)) => {}
            Ok(None) => {
                // Expiry is reported through the link handler.
                let _ = link.check_timeout();
            }
            Err(LinkError::Transport(TransportError::Closed)) => {
                info!(%source, "session closed");
                return Ok(Session::Closed);
            }
            Err(LinkError::Frame(_)) | Err(LinkError::Timeout { .. }) => {}
            Err(err) => return Err(link_error("receive failed", err)),
        }
    }

    Ok(Session::Done)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
