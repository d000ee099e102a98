//! Application layer: the publisher connection and the capture loops.
//!
//! Everything here is transport-blind.  The broadcast side is reached
//! through the [`channel::BroadcastChannel`] trait and connected through
//! [`channel::ChannelConnector`]; the device side arrives as plain channel
//! receivers.  Infrastructure implementations are injected at startup,
//! which is what makes the loops fully unit-testable.

pub mod channel;
pub mod pipeline;
pub mod publisher;

pub use channel::{BroadcastChannel, ChannelConnector, ChannelError, ConnectError};
pub use publisher::{ConnectionState, PublisherConnection};
