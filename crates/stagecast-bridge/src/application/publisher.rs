//! The self-healing publisher connection.
//!
//! The capture threads never talk to the broadcast hub directly; they hand
//! every event to a [`PublisherConnection`], which owns the connection
//! state machine:
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──success──► Ready
//!      ▲                          │                     │
//!      └──────────failure─────────┘     publish failure │
//!      ▲                                or reconnect    │
//!      └────────────────────────────────────────────────┘
//! ```
//!
//! # Contract
//!
//! - [`connect`](PublisherConnection::connect) is fire-and-forget: it
//!   spawns the asynchronous attempt and returns immediately.  Completion
//!   (either way) is observed through the state flag and the log.
//! - [`publish`](PublisherConnection::publish) is synchronous best-effort:
//!   when the connection is not `Ready` the event is silently dropped.  On
//!   a transport error the connection logs, leaves `Ready`, fires exactly
//!   one reconnect, and reports the error; the message is never retried.
//!
//! There is no queue and no backoff: this is a live-telemetry stream where
//! a stale retry is worse than a drop, and every failure triggers exactly
//! one immediate reconnect attempt.
//!
//! # Thread safety
//!
//! `PublisherConnection` is a cheap clonable handle; clones share one
//! connection.  Both operations are safe to invoke from either capture
//! context without external locking: the state flag is an `AtomicU8`, and
//! the channel handle sits behind a `std::sync::Mutex` that is held only
//! long enough to clone or replace the `Arc`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use stagecast_core::OutgoingEvent;

use super::channel::{BroadcastChannel, ChannelConnector, ChannelError};

const STATE_DISCONNECTED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_READY: u8 = 2;

/// Externally observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
}

/// The publisher's internal client of the broadcast hub.
///
/// Created once by the pipeline's entry point and cloned into each capture
/// context.
#[derive(Clone)]
pub struct PublisherConnection {
    inner: Arc<Inner>,
}

struct Inner {
    state: AtomicU8,
    /// Present exactly while the state is `Ready` (modulo benign races
    /// during a teardown, which `publish` treats as a drop).
    channel: Mutex<Option<Arc<dyn BroadcastChannel>>>,
    connector: Arc<dyn ChannelConnector>,
    /// Runtime handle for spawning reconnect attempts; captured at
    /// construction so `connect` works from non-async capture threads.
    runtime: Handle,
}

impl PublisherConnection {
    /// Creates a new connection in the `Disconnected` state.
    ///
    /// Must be called from within a Tokio runtime (the handle is captured
    /// for later fire-and-forget spawns).
    pub fn new(connector: Arc<dyn ChannelConnector>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(STATE_DISCONNECTED),
                channel: Mutex::new(None),
                connector,
                runtime: Handle::current(),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.inner.state.load(Ordering::Acquire) {
            STATE_READY => ConnectionState::Ready,
            STATE_CONNECTING => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Starts an asynchronous connection attempt and returns immediately.
    ///
    /// Concurrent requests collapse: while an attempt is in flight, further
    /// calls are no-ops.  On success the connection becomes `Ready`; on
    /// failure it returns to `Disconnected` and stays there until the next
    /// request; the next failed publish will issue one.
    pub fn connect(&self) {
        if self.inner.state.swap(STATE_CONNECTING, Ordering::AcqRel) == STATE_CONNECTING {
            trace!("connection attempt already in flight; skipping");
            return;
        }

        // Drop any stale handle before the new attempt.
        *self.inner.channel.lock().expect("lock poisoned") = None;

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            match inner.connector.connect().await {
                Ok(channel) => {
                    *inner.channel.lock().expect("lock poisoned") = Some(channel);
                    inner.state.store(STATE_READY, Ordering::Release);
                    info!("publisher connected to broadcast hub");
                }
                Err(e) => {
                    inner.state.store(STATE_DISCONNECTED, Ordering::Release);
                    warn!("publisher connection failed: {e}");
                }
            }
        });
    }

    /// Publishes one event, best-effort.
    ///
    /// Not `Ready` → the event is dropped silently and `Ok` is returned.
    /// A transport error → logged, the connection leaves `Ready`, exactly
    /// one reconnect is fired, and the error is returned so call sites can
    /// decide whether to abandon the rest of a batch.
    pub fn publish(&self, event: &OutgoingEvent) -> Result<(), ChannelError> {
        if self.inner.state.load(Ordering::Acquire) != STATE_READY {
            trace!(op = event.target(), "publisher not ready; dropping event");
            return Ok(());
        }

        let channel = self.inner.channel.lock().expect("lock poisoned").clone();
        let Some(channel) = channel else {
            // A reconnect tore the handle down between the state check and
            // the lock; treat it as the not-ready drop it is.
            return Ok(());
        };

        let result = match event {
            OutgoingEvent::BodyUpdate {
                entity_json,
                projection_json,
            } => channel.on_body(entity_json, projection_json),
            OutgoingEvent::FrameSummary {
                tracked_ids_json,
                frame,
            } => channel.on_bodies(tracked_ids_json, *frame),
            OutgoingEvent::Controller {
                channel: midi_channel,
                key,
                value,
            } => channel.on_midi(midi_channel, key, value),
            OutgoingEvent::Face {
                vertices_json,
                status,
                tracking_id,
            } => channel.on_face(vertices_json, status, *tracking_id),
        };

        if let Err(e) = &result {
            warn!(op = event.target(), error = %e, "broadcast call failed; reconnecting");
            self.inner.state.store(STATE_DISCONNECTED, Ordering::Release);
            self.connect();
            debug!("dropped one {} event", event.target());
        }

        result
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::channel::ConnectError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Channel whose calls either all succeed or all fail, counting both.
    struct ScriptedChannel {
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedChannel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        fn record(&self) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::Closed)
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BroadcastChannel for ScriptedChannel {
        fn on_body(&self, _: &str, _: &str) -> Result<(), ChannelError> {
            self.record()
        }
        fn on_bodies(&self, _: &str, _: i64) -> Result<(), ChannelError> {
            self.record()
        }
        fn on_midi(&self, _: &str, _: &str, _: &str) -> Result<(), ChannelError> {
            self.record()
        }
        fn on_face(&self, _: &str, _: &str, _: u64) -> Result<(), ChannelError> {
            self.record()
        }
    }

    /// Connector that hands out a fixed channel, counting attempts.
    struct CountingConnector {
        channel: Arc<ScriptedChannel>,
        attempts: AtomicUsize,
    }

    impl CountingConnector {
        fn new(channel: Arc<ScriptedChannel>) -> Arc<Self> {
            Arc::new(Self {
                channel,
                attempts: AtomicUsize::new(0),
            })
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelConnector for CountingConnector {
        async fn connect(&self) -> Result<Arc<dyn BroadcastChannel>, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&self.channel) as Arc<dyn BroadcastChannel>)
        }
    }

    /// Connector that always refuses.
    struct RefusingConnector {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ChannelConnector for RefusingConnector {
        async fn connect(&self) -> Result<Arc<dyn BroadcastChannel>, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(ConnectError::HubClosed)
        }
    }

    fn midi_event() -> OutgoingEvent {
        OutgoingEvent::Controller {
            channel: "1".to_string(),
            key: "10".to_string(),
            value: "5".to_string(),
        }
    }

    async fn wait_for(publisher: &PublisherConnection, state: ConnectionState) {
        for _ in 0..100 {
            if publisher.state() == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("publisher never reached {state:?}");
    }

    #[tokio::test]
    async fn test_publish_while_disconnected_is_a_silent_drop() {
        let channel = ScriptedChannel::new(false);
        let publisher = PublisherConnection::new(CountingConnector::new(Arc::clone(&channel)));

        // No connect() call; still Disconnected.
        let result = publisher.publish(&midi_event());

        assert!(result.is_ok(), "a drop is not an error");
        assert_eq!(channel.calls(), 0, "no broadcast call may be made");
        assert_eq!(publisher.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_transitions_to_ready_and_publishes() {
        let channel = ScriptedChannel::new(false);
        let publisher = PublisherConnection::new(CountingConnector::new(Arc::clone(&channel)));

        publisher.connect();
        wait_for(&publisher, ConnectionState::Ready).await;

        publisher.publish(&midi_event()).expect("publish succeeds");
        assert_eq!(channel.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_publish_fires_exactly_one_reconnect() {
        let channel = ScriptedChannel::new(true);
        let connector = CountingConnector::new(Arc::clone(&channel));
        let publisher =
            PublisherConnection::new(Arc::clone(&connector) as Arc<dyn ChannelConnector>);

        publisher.connect();
        wait_for(&publisher, ConnectionState::Ready).await;
        assert_eq!(connector.attempts(), 1);

        let result = publisher.publish(&midi_event());

        assert!(result.is_err(), "the transport error is surfaced");
        // The failing publish left Ready and triggered one reconnect, which
        // completes asynchronously.
        wait_for(&publisher, ConnectionState::Ready).await;
        assert_eq!(connector.attempts(), 2, "exactly one reconnect per failure");
    }

    #[tokio::test]
    async fn test_failed_connect_returns_to_disconnected() {
        let connector = Arc::new(RefusingConnector {
            attempts: AtomicUsize::new(0),
        });
        let publisher =
            PublisherConnection::new(Arc::clone(&connector) as Arc<dyn ChannelConnector>);

        publisher.connect();
        wait_for(&publisher, ConnectionState::Disconnected).await;

        // The next publish is a silent drop; recovery is driven by the next
        // explicit reconnect request, not by a retry loop.
        assert!(publisher.publish(&midi_event()).is_ok());
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_connect_requests_collapse() {
        let channel = ScriptedChannel::new(false);
        let connector = CountingConnector::new(channel);
        let publisher =
            PublisherConnection::new(Arc::clone(&connector) as Arc<dyn ChannelConnector>);

        publisher.connect();
        publisher.connect();
        publisher.connect();
        wait_for(&publisher, ConnectionState::Ready).await;

        assert_eq!(connector.attempts(), 1, "in-flight attempts must collapse");
    }

    #[tokio::test]
    async fn test_clones_share_one_connection() {
        let channel = ScriptedChannel::new(false);
        let publisher = PublisherConnection::new(CountingConnector::new(Arc::clone(&channel)));
        let clone = publisher.clone();

        publisher.connect();
        wait_for(&clone, ConnectionState::Ready).await;

        clone.publish(&midi_event()).expect("publish via clone");
        assert_eq!(channel.calls(), 1);
    }
}
