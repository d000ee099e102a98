//! Deterministic synthetic body source.
//!
//! Generates a single tracked skeleton swaying through a fixed motion
//! cycle, plus one untracked slot, at a configurable rate.  This is what
//! the binary runs against when no real sensor integration is compiled in:
//! the full pipeline (assembly, projection, publishing, fan-out) behaves
//! exactly as it would with hardware, just with repeatable data.
//!
//! An optional drop cadence reports every Nth cycle as an acquisition miss
//! so the dropped-frame path can be observed end to end.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread;
use std::time::Duration;

use tracing::debug;

use stagecast_core::{JointKind, Position3, RawEntity, RawJoint, RawSample, TrackingState};

use super::{BodySource, CaptureError, SensorEvent};

/// Body slot capacity the synthetic sensor reports.
const SYNTHETIC_CAPACITY: usize = 6;

/// A [`BodySource`] that fabricates skeletal samples on a timer thread.
pub struct SyntheticBodySource {
    rate_hz: u32,
    /// Every Nth cycle is reported as `Sample(None)` when set.
    drop_every: Option<u32>,
    running: Arc<AtomicBool>,
}

impl SyntheticBodySource {
    pub fn new(rate_hz: u32, drop_every: Option<u32>) -> Self {
        Self {
            // A zero rate would busy-spin; clamp to 1 Hz.
            rate_hz: rate_hz.max(1),
            drop_every,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl BodySource for SyntheticBodySource {
    fn start(&self) -> Result<mpsc::Receiver<SensorEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        self.running.store(true, Ordering::Relaxed);

        let running = Arc::clone(&self.running);
        let period = Duration::from_secs_f64(1.0 / f64::from(self.rate_hz));
        let drop_every = self.drop_every;

        thread::Builder::new()
            .name("synthetic-body".to_string())
            .spawn(move || {
                // The synthetic device is available from the first cycle.
                let _ = tx.send(SensorEvent::Availability(true));

                let mut cycle: u64 = 0;
                while running.load(Ordering::Relaxed) {
                    let event = match drop_every {
                        Some(n) if u64::from(n) > 0 && cycle % u64::from(n) == u64::from(n) - 1 => {
                            SensorEvent::Sample(None)
                        }
                        _ => SensorEvent::Sample(Some(synthesize_sample(cycle))),
                    };

                    if tx.send(event).is_err() {
                        // Capture loop is gone; nothing left to produce for.
                        break;
                    }
                    cycle += 1;
                    thread::sleep(period);
                }
                debug!("synthetic body source stopped");
            })?;

        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Builds the sample for one cycle: one tracked skeleton mid-sway and one
/// untracked slot, so both emission paths stay exercised.
fn synthesize_sample(cycle: u64) -> RawSample {
    let phase = cycle as f32 * 0.1;
    let joints = JointKind::ALL
        .iter()
        .map(|&kind| RawJoint {
            kind,
            position: joint_position(kind, phase),
        })
        .collect();

    RawSample {
        capacity: SYNTHETIC_CAPACITY,
        entities: vec![
            RawEntity {
                tracking_id: 1,
                state: TrackingState::Tracked,
                joints,
            },
            RawEntity {
                tracking_id: 0,
                state: TrackingState::NotTracked,
                joints: Vec::new(),
            },
        ],
    }
}

/// A plausible standing pose, roughly two metres from the sensor, with the
/// arms swinging on the motion phase.
fn joint_position(kind: JointKind, phase: f32) -> Position3 {
    let sway = 0.05 * phase.sin();
    let (x, y) = match kind {
        JointKind::Head => (0.0, 0.65),
        JointKind::Neck => (0.0, 0.55),
        JointKind::SpineShoulder => (0.0, 0.50),
        JointKind::SpineMid => (0.0, 0.25),
        JointKind::SpineBase => (0.0, 0.0),
        JointKind::ShoulderLeft => (-0.18, 0.48),
        JointKind::ShoulderRight => (0.18, 0.48),
        JointKind::ElbowLeft => (-0.25 - sway, 0.25),
        JointKind::ElbowRight => (0.25 + sway, 0.25),
        JointKind::WristLeft => (-0.28 - 2.0 * sway, 0.05),
        JointKind::WristRight => (0.28 + 2.0 * sway, 0.05),
        JointKind::HandLeft => (-0.30 - 2.0 * sway, 0.0),
        JointKind::HandRight => (0.30 + 2.0 * sway, 0.0),
        JointKind::HandTipLeft => (-0.32 - 2.0 * sway, -0.03),
        JointKind::HandTipRight => (0.32 + 2.0 * sway, -0.03),
        JointKind::ThumbLeft => (-0.28 - 2.0 * sway, -0.02),
        JointKind::ThumbRight => (0.28 + 2.0 * sway, -0.02),
        JointKind::HipLeft => (-0.10, -0.05),
        JointKind::HipRight => (0.10, -0.05),
        JointKind::KneeLeft => (-0.11, -0.45),
        JointKind::KneeRight => (0.11, -0.45),
        JointKind::AnkleLeft => (-0.12, -0.85),
        JointKind::AnkleRight => (0.12, -0.85),
        JointKind::FootLeft => (-0.12, -0.90),
        JointKind::FootRight => (0.12, -0.90),
    };
    Position3::new(x + sway * 0.5, y, 2.0 + 0.1 * phase.cos())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_source_announces_availability_first() {
        let source = SyntheticBodySource::new(200, None);
        let rx = source.start().expect("start");

        let first = rx.recv().expect("first event");
        source.stop();

        assert!(matches!(first, SensorEvent::Availability(true)));
    }

    #[test]
    fn test_synthetic_source_produces_samples_until_stopped() {
        let source = SyntheticBodySource::new(200, None);
        let rx = source.start().expect("start");

        let mut samples = 0;
        for event in rx.iter().take(4) {
            if matches!(event, SensorEvent::Sample(Some(_))) {
                samples += 1;
            }
        }
        source.stop();

        assert!(samples >= 3, "expected a stream of acquired samples");
    }

    #[test]
    fn test_drop_cadence_reports_acquisition_misses() {
        let source = SyntheticBodySource::new(500, Some(2));
        let rx = source.start().expect("start");

        // Skip the availability event, then look at 6 capture cycles:
        // with drop_every = 2, cycles alternate acquired / dropped.
        let events: Vec<SensorEvent> = rx.iter().skip(1).take(6).collect();
        source.stop();

        let drops = events
            .iter()
            .filter(|e| matches!(e, SensorEvent::Sample(None)))
            .count();
        assert_eq!(drops, 3, "every second cycle must be an acquisition miss");
    }

    #[test]
    fn test_synthetic_sample_has_one_tracked_entity_with_full_skeleton() {
        let sample = synthesize_sample(0);

        assert_eq!(sample.capacity, SYNTHETIC_CAPACITY);
        let tracked: Vec<_> = sample
            .entities
            .iter()
            .filter(|e| e.state == TrackingState::Tracked)
            .collect();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].joints.len(), JointKind::ALL.len());
    }

    #[test]
    fn test_synthetic_joints_stay_in_front_of_the_sensor() {
        for cycle in 0..100 {
            let sample = synthesize_sample(cycle);
            for entity in &sample.entities {
                for joint in &entity.joints {
                    assert!(joint.position.z > 0.0, "synthetic depth must be positive");
                }
            }
        }
    }
}
