//! Body sensor boundary.
//!
//! The real tracking hardware lives behind the [`BodySource`] trait: a
//! source is started once, delivers [`SensorEvent`]s on a plain channel
//! consumed by the body capture loop, and is stopped at shutdown.
//!
//! Event delivery deliberately includes the *failed* acquisition cycles
//! (`Sample(None)`): the capture loop must observe them to honor the
//! frame-counter contract, where a dropped frame is skipped without
//! counting.
//!
//! # Implementations
//!
//! - [`synthetic::SyntheticBodySource`]: deterministic generator used by
//!   the binary so the pipeline runs end to end without hardware.
//! - [`mock::MockBodySource`]: test double with event injection.

use std::sync::mpsc;

use stagecast_core::{FaceObservation, RawSample};

use super::CaptureError;

pub mod mock;
pub mod synthetic;

/// One notification from the sensor boundary.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// A capture cycle fired.  `None` means the frame could not be
    /// acquired (dropped frame, device briefly unavailable) and the cycle
    /// must be skipped without advancing the frame counter.
    Sample(Option<RawSample>),
    /// Device availability changed.  Logged only; no core state change.
    Availability(bool),
    /// Extended face detail, when the sensor's face tracker produces it.
    Face(FaceObservation),
}

/// Trait abstracting body sensor event production.
pub trait BodySource: Send {
    /// Starts the source and returns the receiver for its events.
    fn start(&self) -> Result<mpsc::Receiver<SensorEvent>, CaptureError>;
    /// Stops the source and releases its resources.
    fn stop(&self);
}
