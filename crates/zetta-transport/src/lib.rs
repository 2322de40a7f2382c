//! Byte transport abstraction for the zetta framing protocol.
//!
//! A transport moves raw bytes and knows nothing about frames. The protocol
//! instance hands it one fully formed wire frame per [`Transport::send`] and
//! pulls inbound bytes through [`Transport::receive_into`].
//!
//! Provided transports:
//! - [`StreamTransport`] over any `Read + Write` stream (TCP, Unix sockets,
//!   serial device files)
//! - [`MemoryTransport`], an in-memory loopback with optional deferred
//!   completion, modelling DMA-driven links
//! - [`UnixDomainSocket`] listener/connector (Unix only)

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use stream::{StreamTransport, WRITE_BACKOFF};
pub use traits::{SendStatus, Transport};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
