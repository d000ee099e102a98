//! Pure domain entities and the projection contract.
//!
//! Nothing in this module performs I/O.  The types here describe what the
//! body sensor reports ([`skeleton`]) and how a sensed 3D point becomes a
//! 2D point in the output space ([`projection`]).

pub mod projection;
pub mod skeleton;
