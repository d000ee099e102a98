//! # stagecast-core
//!
//! Shared library for StageCast containing the skeletal domain entities,
//! coordinate projection, frame assembly, the latched controller state
//! cache, and the subscriber-facing wire format.
//!
//! This crate is used by the bridge host binary and by anything that wants
//! to decode StageCast frames.  It has zero dependencies on OS APIs, async
//! runtimes, or network sockets.
//!
//! # Architecture overview
//!
//! StageCast bridges two independent hardware event sources (a 3D
//! body-tracking sensor and a MIDI controller) into a single fan-out
//! stream consumed by WebSocket subscribers.  This crate defines:
//!
//! - **`domain`** – Pure entities: joints, tracked bodies, frame events,
//!   and the coordinate projection contract (3D sensor space → 2D output
//!   space, with the defensive depth clamp).
//!
//! - **`capture`** – Per-source stateful logic: the frame assembler that
//!   turns raw sensor samples into structured [`FrameEvent`]s and the
//!   controller state cache that latches key/value pairs and replays them
//!   on demand.
//!
//! - **`wire`** – What travels to subscribers: the [`OutgoingEvent`] union
//!   and its JSON frame encoding.  Target names and argument order are
//!   frozen for compatibility with existing subscriber clients.

pub mod capture;
pub mod domain;
pub mod wire;

// Re-export the most-used types at the crate root so callers can write
// `stagecast_core::FrameEvent` instead of the full module path.
pub use capture::assembler::FrameAssembler;
pub use capture::controller::{ChannelMessage, ControllerStateCache, ControllerUpdate};
pub use domain::projection::{project, PinholeMapper, ProjectionMapper, INFERRED_DEPTH_CLAMP};
pub use domain::skeleton::{
    FaceObservation, FrameEvent, JointKind, JointObservation, Position3, ProjectedPoint,
    RawEntity, RawJoint, RawSample, TrackedEntity, TrackingState,
};
pub use wire::frames::{OutgoingEvent, WireError};
