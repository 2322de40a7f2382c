use std::fs::OpenOptions;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use tracing::info;
use zetta_transport::{StreamTransport, Transport};

use crate::cmd::EndpointArgs;
use crate::exit::{io_error, CliResult};

/// Transport type shared by every endpoint kind.
pub type BoxTransport = Box<dyn Transport>;

/// Socket read timeout, so receive loops wake up to check deadlines and
/// shutdown requests.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Open the client side of an endpoint.
pub fn connect(endpoint: &EndpointArgs) -> CliResult<BoxTransport> {
    if endpoint.tcp {
        let context = format!("connect to {} failed", endpoint.target);
        let stream = TcpStream::connect(&endpoint.target).map_err(|err| io_error(&context, err))?;
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .and_then(|()| stream.set_nodelay(true))
            .map_err(|err| io_error("socket setup failed", err))?;
        return Ok(Box::new(StreamTransport::new(stream)));
    }
    if endpoint.device {
        return open_device(&endpoint.target);
    }
    unix::connect(&endpoint.target)
}

/// Server side of an endpoint, yielding one transport per session.
pub enum Listener {
    #[cfg(unix)]
    Unix(zetta_transport::UnixDomainSocket),
    Tcp(TcpListener),
    /// A device is a single session.
    Device { path: String, opened: bool },
}

impl Listener {
    pub fn bind(endpoint: &EndpointArgs) -> CliResult<Self> {
        if endpoint.tcp {
            let context = format!("bind to {} failed", endpoint.target);
            let listener =
                TcpListener::bind(&endpoint.target).map_err(|err| io_error(&context, err))?;
            info!(address = %endpoint.target, "listening for zetta frames");
            return Ok(Self::Tcp(listener));
        }
        if endpoint.device {
            return Ok(Self::Device {
                path: endpoint.target.clone(),
                opened: false,
            });
        }
        unix::bind(&endpoint.target)
    }

    /// Wait for the next session. `None` once a device has been served.
    pub fn accept(&mut self) -> CliResult<Option<(BoxTransport, String)>> {
        match self {
            #[cfg(unix)]
            Self::Unix(socket) => unix::accept(socket).map(Some),
            Self::Tcp(listener) => {
                let (stream, addr) = listener
                    .accept()
                    .map_err(|err| io_error("accept failed", err))?;
                stream
                    .set_read_timeout(Some(POLL_INTERVAL))
                    .map_err(|err| io_error("socket setup failed", err))?;
                Ok(Some((Box::new(StreamTransport::new(stream)), addr.to_string())))
            }
            Self::Device { path, opened } => {
                if *opened {
                    return Ok(None);
                }
                *opened = true;
                Ok(Some((open_device(path)?, path.clone())))
            }
        }
    }
}

fn open_device(path: &str) -> CliResult<BoxTransport> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|err| io_error(&format!("failed opening {path}"), err))?;
    Ok(Box::new(StreamTransport::new(file)))
}

#[cfg(unix)]
mod unix {
    use zetta_transport::UnixDomainSocket;

    use super::{BoxTransport, Listener, POLL_INTERVAL};
    use crate::exit::{io_error, transport_error, CliResult};

    pub fn connect(path: &str) -> CliResult<BoxTransport> {
        let transport =
            UnixDomainSocket::connect(path).map_err(|err| transport_error("connect failed", err))?;
        transport
            .get_ref()
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|err| io_error("socket setup failed", err))?;
        Ok(Box::new(transport))
    }

    pub fn bind(path: &str) -> CliResult<Listener> {
        let socket =
            UnixDomainSocket::bind(path).map_err(|err| transport_error("bind failed", err))?;
        Ok(Listener::Unix(socket))
    }

    pub fn accept(socket: &UnixDomainSocket) -> CliResult<(BoxTransport, String)> {
        let transport = socket
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        transport
            .get_ref()
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|err| io_error("socket setup failed", err))?;
        Ok((Box::new(transport), format!("unix:{}", socket.path().display())))
    }
}

#[cfg(not(unix))]
mod unix {
    use super::{BoxTransport, Listener};
    use crate::exit::{CliError, CliResult, USAGE};

    const UNSUPPORTED: &str =
        "unix sockets are not available on this platform; use --tcp or --device";

    pub fn connect(_path: &str) -> CliResult<BoxTransport> {
        Err(CliError::new(USAGE, UNSUPPORTED))
    }

    pub fn bind(_path: &str) -> CliResult<Listener> {
        Err(CliError::new(USAGE, UNSUPPORTED))
    }
}
