//! Outgoing events and their JSON frame encoding.
//!
//! [`OutgoingEvent`] is the union of everything the pipeline publishes.
//! Each variant maps to exactly one broadcast operation:
//!
//! | Variant        | Target      | Arguments (in order)                        |
//! |----------------|-------------|---------------------------------------------|
//! | `BodyUpdate`   | `onBody`    | entity JSON, projection JSON                |
//! | `FrameSummary` | `onBodies`  | tracked-ids JSON, frame number (int64)      |
//! | `Controller`   | `onMidi`    | channel, key, value                         |
//! | `Face`         | `onFace`    | vertices JSON, status, tracking id (uint64) |
//!
//! The `...Json` arguments are themselves serialized strings: subscribers
//! parse them lazily, and clients that only care about one payload never
//! pay to decode the others.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::skeleton::{FaceObservation, FrameEvent, TrackedEntity};
use crate::capture::controller::ControllerUpdate;

// ── Broadcast operation names ─────────────────────────────────────────────────

/// Frozen broadcast target names; see the module docs.
pub mod target {
    /// Per tracked entity, once per sample.
    pub const ON_BODY: &str = "onBody";
    /// Once per sample, tracked or not.
    pub const ON_BODIES: &str = "onBodies";
    /// Per controller event or replayed cache entry.
    pub const ON_MIDI: &str = "onMidi";
    /// Optional extended face detail, when present.
    pub const ON_FACE: &str = "onFace";
}

// ── Error type ────────────────────────────────────────────────────────────────

/// Error type for wire encoding operations.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ── Outgoing events ───────────────────────────────────────────────────────────

/// One publishable event, ready to hand to the publisher connection.
///
/// Events are snapshots: they own their payload strings and are never
/// mutated after construction, so they can cross thread boundaries freely.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingEvent {
    /// A tracked entity's full state for one frame.
    BodyUpdate {
        entity_json: String,
        projection_json: String,
    },
    /// The per-sample summary: which entities are tracked, and the frame
    /// counter.
    FrameSummary {
        tracked_ids_json: String,
        frame: i64,
    },
    /// One latched controller triple.
    Controller {
        channel: String,
        key: String,
        value: String,
    },
    /// Extended face detail for a tracked entity.
    Face {
        vertices_json: String,
        status: String,
        tracking_id: u64,
    },
}

/// Serialized shape of one subscriber frame.
#[derive(Serialize)]
struct WireFrame<'a> {
    target: &'a str,
    arguments: Vec<Value>,
}

impl OutgoingEvent {
    /// The broadcast operation this event maps to.
    pub fn target(&self) -> &'static str {
        match self {
            OutgoingEvent::BodyUpdate { .. } => target::ON_BODY,
            OutgoingEvent::FrameSummary { .. } => target::ON_BODIES,
            OutgoingEvent::Controller { .. } => target::ON_MIDI,
            OutgoingEvent::Face { .. } => target::ON_FACE,
        }
    }

    /// Derives the publishable events for one assembled frame: one
    /// `BodyUpdate` per tracked entity (untracked entities are skipped,
    /// not published), then exactly one `FrameSummary`, even when nothing
    /// is tracked.
    pub fn from_frame(frame: &FrameEvent) -> Result<Vec<OutgoingEvent>, WireError> {
        let mut events = Vec::with_capacity(frame.tracked_ids.len() + 1);

        for entity in frame.entities.iter().filter(|e| e.is_tracked()) {
            events.push(OutgoingEvent::BodyUpdate {
                entity_json: serde_json::to_string(entity).map_err(|source| {
                    WireError::Serialize {
                        what: "tracked entity",
                        source,
                    }
                })?,
                projection_json: projection_json(entity)?,
            });
        }

        events.push(OutgoingEvent::FrameSummary {
            tracked_ids_json: serde_json::to_string(&frame.tracked_ids).map_err(|source| {
                WireError::Serialize {
                    what: "tracked id list",
                    source,
                }
            })?,
            frame: frame.frame,
        });

        Ok(events)
    }

    pub fn from_update(update: &ControllerUpdate) -> OutgoingEvent {
        OutgoingEvent::Controller {
            channel: update.channel.clone(),
            key: update.key.clone(),
            value: update.value.clone(),
        }
    }

    pub fn from_face(face: &FaceObservation) -> OutgoingEvent {
        OutgoingEvent::Face {
            vertices_json: face.vertices_json.clone(),
            status: face.status.clone(),
            tracking_id: face.tracking_id,
        }
    }

    /// Encodes this event as one subscriber text frame.
    pub fn to_wire_frame(&self) -> Result<String, WireError> {
        let frame = WireFrame {
            target: self.target(),
            arguments: match self {
                OutgoingEvent::BodyUpdate {
                    entity_json,
                    projection_json,
                } => vec![json!(entity_json), json!(projection_json)],
                OutgoingEvent::FrameSummary {
                    tracked_ids_json,
                    frame,
                } => vec![json!(tracked_ids_json), json!(frame)],
                OutgoingEvent::Controller {
                    channel,
                    key,
                    value,
                } => vec![json!(channel), json!(key), json!(value)],
                OutgoingEvent::Face {
                    vertices_json,
                    status,
                    tracking_id,
                } => vec![json!(vertices_json), json!(status), json!(tracking_id)],
            },
        };

        serde_json::to_string(&frame).map_err(|source| WireError::Serialize {
            what: "wire frame",
            source,
        })
    }
}

impl From<&ControllerUpdate> for OutgoingEvent {
    fn from(update: &ControllerUpdate) -> Self {
        OutgoingEvent::from_update(update)
    }
}

/// Serializes a tracked entity's joint → projected-point map.
fn projection_json(entity: &TrackedEntity) -> Result<String, WireError> {
    let mut map = serde_json::Map::with_capacity(entity.joints.len());
    for joint in &entity.joints {
        map.insert(
            joint.kind.name().to_string(),
            json!([joint.projected.x, joint.projected.y]),
        );
    }
    serde_json::to_string(&Value::Object(map)).map_err(|source| WireError::Serialize {
        what: "projection map",
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::skeleton::{
        JointKind, JointObservation, Position3, ProjectedPoint, TrackingState,
    };

    fn entity(id: u64, state: TrackingState) -> TrackedEntity {
        TrackedEntity {
            tracking_id: id,
            state,
            joints: vec![JointObservation {
                kind: JointKind::Head,
                position: Position3::new(0.0, 0.0, 2.0),
                projected: ProjectedPoint::new(250.0, 200.0),
            }],
        }
    }

    fn frame_event(entities: Vec<TrackedEntity>, frame: i64) -> FrameEvent {
        let tracked_ids = entities
            .iter()
            .filter(|e| e.is_tracked())
            .map(|e| e.tracking_id)
            .collect();
        FrameEvent {
            frame,
            entities,
            tracked_ids,
        }
    }

    #[test]
    fn test_from_frame_skips_untracked_entities() {
        let event = frame_event(
            vec![
                entity(1, TrackingState::Tracked),
                entity(2, TrackingState::NotTracked),
                entity(3, TrackingState::Inferred),
            ],
            0,
        );

        let events = OutgoingEvent::from_frame(&event).expect("encode");

        // One BodyUpdate for entity 1, then the summary.
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OutgoingEvent::BodyUpdate { .. }));
        assert!(matches!(events[1], OutgoingEvent::FrameSummary { .. }));
    }

    #[test]
    fn test_from_frame_emits_summary_even_when_nothing_is_tracked() {
        let event = frame_event(vec![entity(1, TrackingState::NotTracked)], 5);

        let events = OutgoingEvent::from_frame(&event).expect("encode");

        assert_eq!(events.len(), 1);
        match &events[0] {
            OutgoingEvent::FrameSummary {
                tracked_ids_json,
                frame,
            } => {
                assert_eq!(tracked_ids_json, "[]");
                assert_eq!(*frame, 5);
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn test_body_update_wire_frame_preserves_target_and_argument_order() {
        let events = OutgoingEvent::from_frame(&frame_event(
            vec![entity(42, TrackingState::Tracked)],
            0,
        ))
        .expect("encode");

        let text = events[0].to_wire_frame().expect("wire frame");
        let parsed: Value = serde_json::from_str(&text).expect("valid JSON");

        assert_eq!(parsed["target"], "onBody");
        let args = parsed["arguments"].as_array().expect("arguments array");
        assert_eq!(args.len(), 2);
        // Argument 0 is the entity payload, argument 1 the projection map;
        // both are JSON carried as strings.
        let entity_payload: Value =
            serde_json::from_str(args[0].as_str().expect("string arg")).expect("entity JSON");
        assert_eq!(entity_payload["trackingId"], 42);
        let projection: Value =
            serde_json::from_str(args[1].as_str().expect("string arg")).expect("projection JSON");
        assert_eq!(projection["Head"][0], 250.0);
    }

    #[test]
    fn test_summary_wire_frame_carries_frame_number_as_integer() {
        let summary = OutgoingEvent::FrameSummary {
            tracked_ids_json: "[7,9]".to_string(),
            frame: 1234,
        };

        let parsed: Value =
            serde_json::from_str(&summary.to_wire_frame().expect("wire frame")).expect("JSON");

        assert_eq!(parsed["target"], "onBodies");
        assert_eq!(parsed["arguments"][0], "[7,9]");
        assert_eq!(parsed["arguments"][1], 1234);
    }

    #[test]
    fn test_controller_wire_frame_is_three_positional_strings() {
        let event = OutgoingEvent::Controller {
            channel: "1".to_string(),
            key: "46".to_string(),
            value: "127".to_string(),
        };

        let parsed: Value =
            serde_json::from_str(&event.to_wire_frame().expect("wire frame")).expect("JSON");

        assert_eq!(parsed["target"], "onMidi");
        assert_eq!(parsed["arguments"][0], "1");
        assert_eq!(parsed["arguments"][1], "46");
        assert_eq!(parsed["arguments"][2], "127");
    }

    #[test]
    fn test_face_wire_frame_carries_tracking_id_as_integer() {
        let event = OutgoingEvent::Face {
            vertices_json: "[[0.0,0.1]]".to_string(),
            status: "Tracked".to_string(),
            tracking_id: u64::MAX,
        };

        let parsed: Value =
            serde_json::from_str(&event.to_wire_frame().expect("wire frame")).expect("JSON");

        assert_eq!(parsed["target"], "onFace");
        assert_eq!(parsed["arguments"][1], "Tracked");
        assert_eq!(parsed["arguments"][2], u64::MAX);
    }

    #[test]
    fn test_target_accessor_matches_wire_target() {
        let event = OutgoingEvent::Controller {
            channel: "1".to_string(),
            key: "2".to_string(),
            value: "3".to_string(),
        };

        let parsed: Value =
            serde_json::from_str(&event.to_wire_frame().expect("wire frame")).expect("JSON");

        assert_eq!(parsed["target"], event.target());
    }
}
