//! Protocol instance for the zetta framing protocol.
//!
//! A [`Link`] binds one byte transport, one integrity function and one
//! [`LinkHandler`] into a context that owns exactly one transmit buffer and
//! one receive state machine. Transmission is non-blocking: a second send
//! while the first is still in flight fails with [`LinkError::TxBusy`].
//! Inbound bytes are fed one at a time, so the receive path can be driven
//! from an interrupt or a single-byte DMA completion.

pub mod clock;
pub mod config;
pub mod error;
pub mod handler;
pub mod link;
pub mod shared;
pub mod stats;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::LinkConfig;
pub use error::{LinkError, Result};
pub use handler::{LinkHandler, LoggingHandler};
pub use link::{Gate, Link};
pub use shared::SharedLink;
pub use stats::LinkStats;
