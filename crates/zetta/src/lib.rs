//! Minimal framing for small, typed packets over any byte stream.
//!
//! Each packet travels as `START | TYPE | LEN | PAYLOAD | CRC | STOP`, which
//! makes it self-delimiting on links with no message boundaries such as a
//! UART, a byte-addressed bus or a stream socket.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transport contract and stream, socket and in-memory transports
//! - [`frame`]: wire format, integrity functions, encoder and receive state machine
//! - [`link`]: protocol instance with TX/RX gates, callbacks and idle
//!   timeout (behind the `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use zetta_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use zetta_frame::*;
}

/// Re-export protocol instance types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use zetta_link::*;
}
