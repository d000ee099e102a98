//! Skeletal tracking entities.
//!
//! These types mirror what the body sensor reports each frame: up to
//! `capacity` body slots, each with a stable tracking identifier, a
//! tracking state, and an ordered list of labeled joints.
//!
//! The raw types ([`RawSample`], [`RawEntity`], [`RawJoint`]) are what the
//! sensor boundary delivers; the assembled types ([`FrameEvent`],
//! [`TrackedEntity`], [`JointObservation`]) additionally carry the derived
//! 2D projection per joint and are what gets serialized for subscribers.

use serde::{Deserialize, Serialize};

// ── Joint enumeration ─────────────────────────────────────────────────────────

/// The fixed set of skeletal joints reported by the sensor.
///
/// The discriminant values are the sensor's native joint indices and are
/// stable across firmware revisions; they double as the serialized form on
/// the wire when a compact representation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JointKind {
    SpineBase = 0,
    SpineMid = 1,
    Neck = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
    SpineShoulder = 20,
    HandTipLeft = 21,
    ThumbLeft = 22,
    HandTipRight = 23,
    ThumbRight = 24,
}

impl JointKind {
    /// Every joint in sensor reporting order.
    pub const ALL: [JointKind; 25] = [
        JointKind::SpineBase,
        JointKind::SpineMid,
        JointKind::Neck,
        JointKind::Head,
        JointKind::ShoulderLeft,
        JointKind::ElbowLeft,
        JointKind::WristLeft,
        JointKind::HandLeft,
        JointKind::ShoulderRight,
        JointKind::ElbowRight,
        JointKind::WristRight,
        JointKind::HandRight,
        JointKind::HipLeft,
        JointKind::KneeLeft,
        JointKind::AnkleLeft,
        JointKind::FootLeft,
        JointKind::HipRight,
        JointKind::KneeRight,
        JointKind::AnkleRight,
        JointKind::FootRight,
        JointKind::SpineShoulder,
        JointKind::HandTipLeft,
        JointKind::ThumbLeft,
        JointKind::HandTipRight,
        JointKind::ThumbRight,
    ];

    /// The joint's name as it appears in serialized projection maps.
    pub fn name(self) -> &'static str {
        match self {
            JointKind::SpineBase => "SpineBase",
            JointKind::SpineMid => "SpineMid",
            JointKind::Neck => "Neck",
            JointKind::Head => "Head",
            JointKind::ShoulderLeft => "ShoulderLeft",
            JointKind::ElbowLeft => "ElbowLeft",
            JointKind::WristLeft => "WristLeft",
            JointKind::HandLeft => "HandLeft",
            JointKind::ShoulderRight => "ShoulderRight",
            JointKind::ElbowRight => "ElbowRight",
            JointKind::WristRight => "WristRight",
            JointKind::HandRight => "HandRight",
            JointKind::HipLeft => "HipLeft",
            JointKind::KneeLeft => "KneeLeft",
            JointKind::AnkleLeft => "AnkleLeft",
            JointKind::FootLeft => "FootLeft",
            JointKind::HipRight => "HipRight",
            JointKind::KneeRight => "KneeRight",
            JointKind::AnkleRight => "AnkleRight",
            JointKind::FootRight => "FootRight",
            JointKind::SpineShoulder => "SpineShoulder",
            JointKind::HandTipLeft => "HandTipLeft",
            JointKind::ThumbLeft => "ThumbLeft",
            JointKind::HandTipRight => "HandTipRight",
            JointKind::ThumbRight => "ThumbRight",
        }
    }
}

impl TryFrom<u8> for JointKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        JointKind::ALL.get(value as usize).copied().ok_or(())
    }
}

// ── Tracking state ────────────────────────────────────────────────────────────

/// How confident the sensor is about an entity this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrackingState {
    /// The slot is empty or the entity has left the sensor's view.
    NotTracked = 0,
    /// The entity's position is estimated, not directly observed.
    Inferred = 1,
    /// The entity is actively tracked.
    Tracked = 2,
}

impl TryFrom<u8> for TrackingState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(TrackingState::NotTracked),
            1 => Ok(TrackingState::Inferred),
            2 => Ok(TrackingState::Tracked),
            _ => Err(()),
        }
    }
}

// ── Geometric primitives ──────────────────────────────────────────────────────

/// A point in 3D sensor space (metres, sensor origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    /// Depth along the sensor's optical axis.  May be reported negative for
    /// inferred joints behind the sensor plane; see
    /// [`crate::domain::projection::project`].
    pub z: f32,
}

impl Position3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A point in 2D output space (pixels in the projected image plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
}

impl ProjectedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ── Raw sensor boundary types ─────────────────────────────────────────────────

/// One labeled joint as the sensor reports it, before projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawJoint {
    pub kind: JointKind,
    pub position: Position3,
}

/// One body slot as the sensor reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    /// Stable identifier while the entity remains tracked.
    pub tracking_id: u64,
    pub state: TrackingState,
    /// Joints in sensor reporting order.
    pub joints: Vec<RawJoint>,
}

/// One successfully acquired sensor sample.
///
/// A dropped frame never becomes a `RawSample`; the source boundary reports
/// it as `None` and the capture cycle is skipped entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// The sensor's reported body slot capacity.  Fixed for the session.
    pub capacity: usize,
    pub entities: Vec<RawEntity>,
}

// ── Assembled entities ────────────────────────────────────────────────────────

/// A joint with both its raw 3D position and its derived 2D projection.
///
/// Invariant: `position` is the sensor's raw value; the depth clamp applied
/// before projection never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointObservation {
    pub kind: JointKind,
    pub position: Position3,
    pub projected: ProjectedPoint,
}

/// A fully assembled body for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub tracking_id: u64,
    pub state: TrackingState,
    pub joints: Vec<JointObservation>,
}

impl TrackedEntity {
    /// Whether this entity should be published as an individual update.
    pub fn is_tracked(&self) -> bool {
        self.state == TrackingState::Tracked
    }
}

/// Everything derived from one successfully acquired sensor sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    /// Monotonic frame counter.  Starts at 0, increments once per
    /// successfully acquired sample, never resets while the process runs.
    pub frame: i64,
    /// The full body slot list for this sample, tracked or not.
    pub entities: Vec<TrackedEntity>,
    /// Identifiers of the entities whose state is [`TrackingState::Tracked`].
    pub tracked_ids: Vec<u64>,
}

/// Optional extended face detail attached to a tracked entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    /// Pre-serialized face vertex payload from the face tracker.
    pub vertices_json: String,
    /// Tracker status string (e.g. "Tracked", "Converging").
    pub status: String,
    /// The owning entity's tracking id.
    pub tracking_id: u64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
