//! Coordinate projection: 3D sensor space → 2D output space.
//!
//! The exact camera mapping is hardware-defined and lives behind the
//! [`ProjectionMapper`] trait.  What this module owns is the call boundary
//! and the defensive depth clamp: inferred joints are occasionally reported
//! with a negative depth, which would invert the projection if passed
//! through unchanged.  [`project`] substitutes a small positive constant
//! before invoking the mapper; the caller's raw value is never mutated.

use super::skeleton::{Position3, ProjectedPoint};

/// Substitute depth used when a joint is reported behind the sensor plane.
pub const INFERRED_DEPTH_CLAMP: f32 = 0.1;

/// Device-specific mapping from sensor space to the output image plane.
///
/// Implementations must be deterministic and side-effect free.  The bridge
/// injects one at pipeline start; tests inject recording fakes.
pub trait ProjectionMapper: Send + Sync {
    fn map_to_projection(&self, position: Position3) -> ProjectedPoint;
}

/// Projects a sensed 3D point into output space through `mapper`.
///
/// If `position.z < 0`, the value handed to the mapper carries
/// [`INFERRED_DEPTH_CLAMP`] instead; `position` itself is left untouched so
/// the raw observation recorded on the entity stays faithful to the sensor.
pub fn project(mapper: &dyn ProjectionMapper, position: Position3) -> ProjectedPoint {
    let depth_safe = if position.z < 0.0 {
        Position3 {
            z: INFERRED_DEPTH_CLAMP,
            ..position
        }
    } else {
        position
    };
    mapper.map_to_projection(depth_safe)
}

// ── Built-in mapper ───────────────────────────────────────────────────────────

/// Pinhole-model mapper standing in for the hardware coordinate mapper.
///
/// Default intrinsics match a 512×424 depth camera.  Real deployments wrap
/// the vendor mapping behind [`ProjectionMapper`] instead.
#[derive(Debug, Clone, Copy)]
pub struct PinholeMapper {
    /// Focal length in pixels, horizontal.
    pub fx: f32,
    /// Focal length in pixels, vertical.
    pub fy: f32,
    /// Principal point, horizontal.
    pub cx: f32,
    /// Principal point, vertical.
    pub cy: f32,
}

impl Default for PinholeMapper {
    fn default() -> Self {
        Self {
            fx: 365.456,
            fy: 365.456,
            cx: 254.878,
            cy: 205.395,
        }
    }
}

impl ProjectionMapper for PinholeMapper {
    fn map_to_projection(&self, position: Position3) -> ProjectedPoint {
        // The clamp upstream guarantees z > 0 for sensor input; guard the
        // exact-zero case so a hand-constructed point cannot divide by zero.
        let z = position.z.max(f32::EPSILON);
        ProjectedPoint {
            x: self.cx + self.fx * position.x / z,
            y: self.cy - self.fy * position.y / z,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every position handed to the mapper so tests can observe the
    /// clamp without depending on any particular projection math.
    struct RecordingMapper {
        seen: Mutex<Vec<Position3>>,
    }

    impl RecordingMapper {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_seen(&self) -> Position3 {
            *self
                .seen
                .lock()
                .expect("lock poisoned")
                .last()
                .expect("mapper was never invoked")
        }
    }

    impl ProjectionMapper for RecordingMapper {
        fn map_to_projection(&self, position: Position3) -> ProjectedPoint {
            self.seen.lock().expect("lock poisoned").push(position);
            ProjectedPoint::new(position.x, position.y)
        }
    }

    #[test]
    fn test_negative_depth_is_clamped_before_mapping() {
        let mapper = RecordingMapper::new();
        let raw = Position3::new(0.5, -0.2, -3.0);

        project(&mapper, raw);

        let seen = mapper.last_seen();
        assert_eq!(seen.z, INFERRED_DEPTH_CLAMP, "mapper must see the clamp value");
        assert_eq!(seen.x, 0.5, "x passes through unchanged");
        assert_eq!(seen.y, -0.2, "y passes through unchanged");
    }

    #[test]
    fn test_clamp_never_mutates_the_raw_position() {
        let mapper = RecordingMapper::new();
        let raw = Position3::new(0.0, 0.0, -1.0);

        project(&mapper, raw);

        assert_eq!(raw.z, -1.0, "the caller's value must stay raw");
    }

    #[test]
    fn test_positive_depth_passes_through_unclamped() {
        let mapper = RecordingMapper::new();
        let raw = Position3::new(1.0, 2.0, 2.5);

        project(&mapper, raw);

        assert_eq!(mapper.last_seen(), raw);
    }

    #[test]
    fn test_zero_depth_is_not_clamped() {
        // The clamp policy is strictly z < 0; zero is the mapper's problem.
        let mapper = RecordingMapper::new();

        project(&mapper, Position3::new(0.0, 0.0, 0.0));

        assert_eq!(mapper.last_seen().z, 0.0);
    }

    #[test]
    fn test_pinhole_mapper_centers_the_origin_ray() {
        let mapper = PinholeMapper::default();

        let projected = mapper.map_to_projection(Position3::new(0.0, 0.0, 2.0));

        assert!((projected.x - mapper.cx).abs() < 1e-4);
        assert!((projected.y - mapper.cy).abs() < 1e-4);
    }

    #[test]
    fn test_pinhole_mapper_is_deterministic() {
        let mapper = PinholeMapper::default();
        let position = Position3::new(0.3, 0.7, 1.8);

        let a = mapper.map_to_projection(position);
        let b = mapper.map_to_projection(position);

        assert_eq!(a, b);
    }

    #[test]
    fn test_pinhole_mapper_scales_with_inverse_depth() {
        let mapper = PinholeMapper::default();

        let near = mapper.map_to_projection(Position3::new(0.5, 0.0, 1.0));
        let far = mapper.map_to_projection(Position3::new(0.5, 0.0, 2.0));

        let near_offset = near.x - mapper.cx;
        let far_offset = far.x - mapper.cx;
        assert!(
            (near_offset - 2.0 * far_offset).abs() < 1e-3,
            "doubling depth must halve the projected offset"
        );
    }
}
