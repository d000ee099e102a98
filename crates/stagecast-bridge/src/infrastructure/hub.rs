//! Subscriber registry and the event dispatch task.
//!
//! The original design had the bridge connect to its own broadcast endpoint
//! as a network client.  Here that self-connection is an in-process
//! producer/consumer boundary instead: publishes go into a bounded mpsc
//! queue, and a dedicated dispatch task (the only owner of the [`Hub`]
//! handle on the hot path) drains the queue, encodes each event once, and
//! fans the text frame out to every registered subscriber.
//!
//! ```text
//! capture threads ──publish──► [event queue] ──dispatch task──► Hub ──► N subscribers
//! ```
//!
//! Fan-out is best-effort: there is no acknowledgment and no ordering
//! guarantee across subscribers.  A subscriber whose session task has gone
//! away is pruned the first time a send to it fails.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use stagecast_core::OutgoingEvent;

use crate::application::channel::{BroadcastChannel, ChannelConnector, ChannelError, ConnectError};

/// Unique identifier for a subscriber session.
pub type SubscriberId = Uuid;

/// Error type for hub registration.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("subscriber limit reached ({limit})")]
    TooManySubscribers { limit: usize },
}

/// The fan-out point: owns the set of subscriber handles.
///
/// The core never inspects this set; it only ever publishes through the
/// [`BroadcastChannel`] boundary.
pub struct Hub {
    /// Active subscribers: id → per-session frame sender.
    subscribers: RwLock<HashMap<SubscriberId, mpsc::UnboundedSender<String>>>,
    /// Registrations beyond this are refused.
    max_subscribers: usize,
}

impl Hub {
    pub fn new(max_subscribers: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            max_subscribers,
        }
    }

    /// Registers a new subscriber and returns its session id.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::TooManySubscribers`] when the configured limit
    /// has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<SubscriberId, HubError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.len() >= self.max_subscribers {
            return Err(HubError::TooManySubscribers {
                limit: self.max_subscribers,
            });
        }

        let id = Uuid::new_v4();
        subscribers.insert(id, sender);
        info!(subscriber = %id, total = subscribers.len(), "subscriber registered");
        Ok(id)
    }

    /// Removes a subscriber; a no-op if it is already gone.
    pub async fn unregister(&self, id: &SubscriberId) {
        if self.subscribers.write().await.remove(id).is_some() {
            info!(subscriber = %id, "subscriber unregistered");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Sends one encoded frame to every current subscriber.
    ///
    /// Returns the number of subscribers the frame was handed to.  Dead
    /// subscribers (session task gone, channel closed) are pruned.
    pub async fn broadcast(&self, frame: &str) -> usize {
        let mut subscribers = self.subscribers.write().await;
        let mut dead = Vec::new();

        for (id, sender) in subscribers.iter() {
            if sender.send(frame.to_string()).is_err() {
                dead.push(*id);
            }
        }

        for id in &dead {
            subscribers.remove(id);
            debug!(subscriber = %id, "pruned dead subscriber");
        }

        subscribers.len()
    }
}

// ── The publisher-facing side ─────────────────────────────────────────────────

/// [`BroadcastChannel`] implementation backed by the dispatch queue.
///
/// `try_send` keeps every operation synchronous and callable from the
/// hardware capture threads; a full or closed queue surfaces as the
/// transport error the publisher's reconnect logic expects.
pub struct HubChannel {
    events: mpsc::Sender<OutgoingEvent>,
}

impl HubChannel {
    fn send(&self, event: OutgoingEvent) -> Result<(), ChannelError> {
        self.events.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed,
        })
    }
}

impl BroadcastChannel for HubChannel {
    fn on_body(&self, entity_json: &str, projection_json: &str) -> Result<(), ChannelError> {
        self.send(OutgoingEvent::BodyUpdate {
            entity_json: entity_json.to_string(),
            projection_json: projection_json.to_string(),
        })
    }

    fn on_bodies(&self, tracked_ids_json: &str, frame: i64) -> Result<(), ChannelError> {
        self.send(OutgoingEvent::FrameSummary {
            tracked_ids_json: tracked_ids_json.to_string(),
            frame,
        })
    }

    fn on_midi(&self, channel: &str, key: &str, value: &str) -> Result<(), ChannelError> {
        self.send(OutgoingEvent::Controller {
            channel: channel.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn on_face(
        &self,
        vertices_json: &str,
        status: &str,
        tracking_id: u64,
    ) -> Result<(), ChannelError> {
        self.send(OutgoingEvent::Face {
            vertices_json: vertices_json.to_string(),
            status: status.to_string(),
            tracking_id,
        })
    }
}

/// Hands out [`HubChannel`] handles to the publisher.
pub struct HubConnector {
    events: mpsc::Sender<OutgoingEvent>,
}

impl HubConnector {
    pub fn new(events: mpsc::Sender<OutgoingEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl ChannelConnector for HubConnector {
    async fn connect(&self) -> Result<Arc<dyn BroadcastChannel>, ConnectError> {
        if self.events.is_closed() {
            return Err(ConnectError::HubClosed);
        }
        Ok(Arc::new(HubChannel {
            events: self.events.clone(),
        }))
    }
}

// ── Dispatch task ─────────────────────────────────────────────────────────────

/// Drains the event queue and fans each event out, until every publisher
/// handle is gone.
pub async fn run_dispatch(hub: Arc<Hub>, mut events: mpsc::Receiver<OutgoingEvent>) {
    while let Some(event) = events.recv().await {
        match event.to_wire_frame() {
            Ok(frame) => {
                let delivered = hub.broadcast(&frame).await;
                trace!(op = event.target(), delivered, "dispatched event");
            }
            Err(e) => {
                // Encoding failure is a bug in the payload, not the
                // subscriber's problem; drop the event and keep going.
                error!(op = event.target(), "failed to encode wire frame: {e}");
            }
        }
    }

    debug!("event queue closed; dispatch task exiting");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
