//! Per-source capture logic.
//!
//! Each event source owns exactly one piece of state in the core:
//!
//! - The body sensor owns a [`assembler::FrameAssembler`] (entity slot
//!   buffer + monotonic frame counter), touched only from the sensor's
//!   callback context.
//! - The MIDI controller owns a [`controller::ControllerStateCache`]
//!   (latched key/value map), touched only from the controller's callback
//!   context.
//!
//! Neither type is shared across threads, so neither needs a lock.

pub mod assembler;
pub mod controller;
