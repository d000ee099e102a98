//! The broadcast channel boundary.
//!
//! [`BroadcastChannel`] is the seam between the capture side and whatever
//! fans events out to subscribers.  The operation names and argument order
//! are part of the wire contract (existing subscriber clients dispatch on
//! them) and must match [`stagecast_core::wire::frames::target`].
//!
//! Every call may fail: the production implementation forwards into a
//! bounded in-process queue, which is full when the dispatch side has
//! stalled and closed when the hub has shut down.  Callers treat both as
//! transport errors: log, drop the message, reconnect.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for broadcast channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The event queue is full; the dispatch side is not keeping up.
    #[error("broadcast event queue is full")]
    QueueFull,
    /// The hub has shut down and will never accept another event.
    #[error("broadcast hub is shut down")]
    Closed,
}

/// Error type for connection establishment.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broadcast hub is no longer accepting publishers")]
    HubClosed,
}

/// Named broadcast operations, forwarded to every connected subscriber.
///
/// Fire-to-all with no acknowledgment and no cross-subscriber ordering
/// guarantee.  Implementations must be callable from any thread without
/// the caller holding a lock.
pub trait BroadcastChannel: Send + Sync {
    /// Publishes one tracked entity's state.  Called once per tracked
    /// entity per sample.
    fn on_body(&self, entity_json: &str, projection_json: &str) -> Result<(), ChannelError>;

    /// Publishes the per-sample summary: tracked entity ids + frame counter.
    fn on_bodies(&self, tracked_ids_json: &str, frame: i64) -> Result<(), ChannelError>;

    /// Publishes one controller triple (live event or replayed cache entry).
    fn on_midi(&self, channel: &str, key: &str, value: &str) -> Result<(), ChannelError>;

    /// Publishes extended face detail, when the sensor provides it.
    fn on_face(&self, vertices_json: &str, status: &str, tracking_id: u64)
        -> Result<(), ChannelError>;
}

/// Produces fresh [`BroadcastChannel`] handles for the publisher.
///
/// Connection establishment is asynchronous; the publisher invokes it
/// fire-and-forget and observes completion through its own state flag.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn BroadcastChannel>, ConnectError>;
}
