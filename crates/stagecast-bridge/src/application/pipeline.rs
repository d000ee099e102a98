//! The capture loops: sensor events in, published events out.
//!
//! Each event source gets one loop on its own blocking thread, and each
//! loop exclusively owns its per-source state (the frame assembler, the
//! controller cache).  The only thing the two contexts share is the
//! [`PublisherConnection`] handle, whose operations are internally
//! serialized; neither loop ever blocks on a lock held by the other.
//!
//! # Failure policy
//!
//! Nothing here is fatal.  A failed entity update is logged and the loop
//! moves to the next entity; a failed summary or controller publish has
//! already triggered the publisher's reconnect by the time the loop sees
//! the error.  A controller replay batch stops at its first failure; the
//! subscriber will re-request a dump once it reconnects.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use stagecast_core::{
    ChannelMessage, ControllerStateCache, FrameAssembler, FrameEvent, OutgoingEvent,
    ProjectionMapper,
};

use crate::infrastructure::body_source::SensorEvent;

use super::publisher::PublisherConnection;

/// Consumes body sensor events until the source channel closes.
///
/// Runs on a dedicated blocking thread; `events` is the receiver returned
/// by the body source's `start()`.
pub fn run_body_loop(
    events: Receiver<SensorEvent>,
    mapper: Arc<dyn ProjectionMapper>,
    publisher: PublisherConnection,
) {
    let mut assembler = FrameAssembler::new();

    while let Ok(event) = events.recv() {
        match event {
            SensorEvent::Sample(Some(sample)) => {
                let frame = assembler.assemble(&sample, mapper.as_ref());
                publish_frame(&frame, &publisher);
            }
            SensorEvent::Sample(None) => {
                // Acquisition miss: skip the cycle without touching the
                // frame counter.
                trace!("sensor sample not acquired; skipping cycle");
            }
            SensorEvent::Availability(available) => {
                info!(available, "body sensor availability changed");
            }
            SensorEvent::Face(face) => {
                if let Err(e) = publisher.publish(&OutgoingEvent::from_face(&face)) {
                    debug!("face publish failed: {e}");
                }
            }
        }
    }

    debug!("body source channel closed; body loop exiting");
}

/// Publishes everything one assembled frame produces: entity updates for
/// the tracked entities, then the summary.
fn publish_frame(frame: &FrameEvent, publisher: &PublisherConnection) {
    let events = match OutgoingEvent::from_frame(frame) {
        Ok(events) => events,
        Err(e) => {
            error!(frame = frame.frame, "failed to encode frame: {e}");
            return;
        }
    };

    for event in &events {
        if let Err(e) = publisher.publish(event) {
            // Partial-failure tolerant: the publisher has already requested
            // its reconnect; remaining entities (and the summary) still get
            // their chance this cycle.
            debug!(op = event.target(), "publish failed: {e}");
        }
    }
}

/// Consumes controller messages until the source channel closes.
///
/// Runs on a dedicated blocking thread; `messages` is the receiver
/// returned by the controller source's `start()`.
pub fn run_controller_loop(messages: Receiver<ChannelMessage>, publisher: PublisherConnection) {
    let mut cache = ControllerStateCache::new();

    while let Ok(msg) = messages.recv() {
        let updates = cache.handle(&msg);
        for update in &updates {
            debug!(
                channel = %update.channel,
                key = %update.key,
                value = %update.value,
                "controller update"
            );
            if let Err(e) = publisher.publish(&OutgoingEvent::from(update)) {
                // No per-message retry; the sync sentinel is the recovery
                // path for whatever the subscriber missed.
                warn!("controller publish failed; dropping remainder of batch: {e}");
                break;
            }
        }
    }

    debug!("controller source channel closed; controller loop exiting");
}
