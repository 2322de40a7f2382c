use std::path::PathBuf;

/// Failures below the framing layer: endpoint setup and byte I/O.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot listen on {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot reach {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(std::io::Error),

    /// Read or write on an open link failed.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unix socket paths are limited by `sockaddr_un`.
    #[error("socket path is {len} bytes, limit is {max}: {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The peer closed the byte stream; no more bytes will arrive.
    #[error("byte stream closed by peer")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
