//! Frame assembly: one raw sensor sample → one [`FrameEvent`].
//!
//! The assembler owns the two pieces of per-session state the body stream
//! needs: the entity slot buffer (allocated once, sized to the sensor's
//! reported capacity) and the monotonic frame counter.
//!
//! # Counter semantics
//!
//! The counter starts at 0 and increments exactly once per successfully
//! acquired sample.  A dropped frame never reaches [`FrameAssembler::assemble`]
//! and therefore never advances the counter.  The emitted [`FrameEvent`]
//! carries the pre-increment value, so the first successful sample of a
//! session publishes frame 0.

use tracing::trace;

use crate::domain::projection::{project, ProjectionMapper};
use crate::domain::skeleton::{FrameEvent, JointObservation, RawSample, TrackedEntity};

/// Converts raw sensor samples into structured frame events.
///
/// Owned exclusively by the sensor's callback context; not `Sync`, and it
/// does not need to be.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    /// Entity slot buffer, allocated on the first sample.  Capacity does not
    /// change across the session.
    slots: Option<Vec<TrackedEntity>>,
    /// Next frame number to assign.
    frame: i64,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of samples assembled so far.
    pub fn frames_assembled(&self) -> i64 {
        self.frame
    }

    /// Assembles one successfully acquired sample.
    ///
    /// Refreshes every entity slot from the raw sample, projects each joint
    /// through `mapper` (with the depth clamp applied at the call boundary),
    /// and advances the frame counter.  The returned event is a snapshot;
    /// the internal buffer is reused on the next call.
    pub fn assemble(&mut self, sample: &RawSample, mapper: &dyn ProjectionMapper) -> FrameEvent {
        let slots = self.slots.get_or_insert_with(|| {
            trace!(capacity = sample.capacity, "allocating entity slot buffer");
            Vec::with_capacity(sample.capacity)
        });

        slots.clear();
        for raw in &sample.entities {
            let joints = raw
                .joints
                .iter()
                .map(|joint| JointObservation {
                    kind: joint.kind,
                    position: joint.position,
                    projected: project(mapper, joint.position),
                })
                .collect();
            slots.push(TrackedEntity {
                tracking_id: raw.tracking_id,
                state: raw.state,
                joints,
            });
        }

        let tracked_ids = slots
            .iter()
            .filter(|entity| entity.is_tracked())
            .map(|entity| entity.tracking_id)
            .collect();

        let frame = self.frame;
        self.frame += 1;

        FrameEvent {
            frame,
            entities: slots.clone(),
            tracked_ids,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::projection::INFERRED_DEPTH_CLAMP;
    use crate::domain::skeleton::{
        JointKind, Position3, ProjectedPoint, RawEntity, RawJoint, TrackingState,
    };

    /// Mapper that encodes its input into the output so tests can verify
    /// which value actually reached it.
    struct EchoMapper;

    impl ProjectionMapper for EchoMapper {
        fn map_to_projection(&self, position: Position3) -> ProjectedPoint {
            ProjectedPoint::new(position.x * 100.0, position.z * 100.0)
        }
    }

    fn sample_with(entities: Vec<RawEntity>) -> RawSample {
        RawSample {
            capacity: 6,
            entities,
        }
    }

    fn entity(id: u64, state: TrackingState, z: f32) -> RawEntity {
        RawEntity {
            tracking_id: id,
            state,
            joints: vec![RawJoint {
                kind: JointKind::Head,
                position: Position3::new(0.5, 1.0, z),
            }],
        }
    }

    #[test]
    fn test_frame_counter_starts_at_zero_and_increments_per_sample() {
        let mut assembler = FrameAssembler::new();
        let sample = sample_with(vec![entity(1, TrackingState::Tracked, 2.0)]);

        let first = assembler.assemble(&sample, &EchoMapper);
        let second = assembler.assemble(&sample, &EchoMapper);
        let third = assembler.assemble(&sample, &EchoMapper);

        assert_eq!(first.frame, 0);
        assert_eq!(second.frame, 1);
        assert_eq!(third.frame, 2);
        assert_eq!(assembler.frames_assembled(), 3);
    }

    #[test]
    fn test_tracked_ids_lists_only_tracked_entities() {
        let mut assembler = FrameAssembler::new();
        let sample = sample_with(vec![
            entity(10, TrackingState::Tracked, 2.0),
            entity(11, TrackingState::NotTracked, 2.0),
            entity(12, TrackingState::Inferred, 2.0),
            entity(13, TrackingState::Tracked, 2.0),
        ]);

        let event = assembler.assemble(&sample, &EchoMapper);

        assert_eq!(event.tracked_ids, vec![10, 13]);
        assert_eq!(event.entities.len(), 4, "all slots are kept on the event");
    }

    #[test]
    fn test_all_untracked_sample_yields_empty_tracked_ids() {
        let mut assembler = FrameAssembler::new();
        let sample = sample_with(vec![
            entity(1, TrackingState::NotTracked, 2.0),
            entity(2, TrackingState::NotTracked, 2.0),
        ]);

        let event = assembler.assemble(&sample, &EchoMapper);

        assert!(event.tracked_ids.is_empty());
        assert_eq!(event.frame, 0, "the counter still advances for the sample");
        assert_eq!(assembler.frames_assembled(), 1);
    }

    #[test]
    fn test_negative_depth_projects_through_the_clamp() {
        let mut assembler = FrameAssembler::new();
        let sample = sample_with(vec![entity(1, TrackingState::Tracked, -2.0)]);

        let event = assembler.assemble(&sample, &EchoMapper);

        let joint = &event.entities[0].joints[0];
        // EchoMapper reports the depth it was given in `projected.y`.
        assert!((joint.projected.y - INFERRED_DEPTH_CLAMP * 100.0).abs() < 1e-4);
        // The recorded raw position keeps the sensor's value.
        assert_eq!(joint.position.z, -2.0);
    }

    #[test]
    fn test_slots_are_refreshed_not_accumulated() {
        let mut assembler = FrameAssembler::new();

        let first = sample_with(vec![
            entity(1, TrackingState::Tracked, 2.0),
            entity(2, TrackingState::Tracked, 2.0),
        ]);
        assembler.assemble(&first, &EchoMapper);

        let second = sample_with(vec![entity(3, TrackingState::Tracked, 2.0)]);
        let event = assembler.assemble(&second, &EchoMapper);

        assert_eq!(event.entities.len(), 1, "stale slots must not leak through");
        assert_eq!(event.tracked_ids, vec![3]);
    }

    #[test]
    fn test_snapshot_is_independent_of_the_reused_buffer() {
        let mut assembler = FrameAssembler::new();

        let first = assembler.assemble(
            &sample_with(vec![entity(1, TrackingState::Tracked, 2.0)]),
            &EchoMapper,
        );
        let _second = assembler.assemble(
            &sample_with(vec![entity(9, TrackingState::Tracked, 2.0)]),
            &EchoMapper,
        );

        assert_eq!(first.entities[0].tracking_id, 1, "earlier snapshots stay intact");
    }
}
