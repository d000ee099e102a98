//! The subscriber-facing wire format.
//!
//! Subscribers receive JSON text frames of the shape
//! `{"target":"onBody","arguments":[...]}`.  Target names and positional
//! argument order are frozen (existing subscriber clients dispatch on
//! them), so they live here as constants rather than being derived from
//! type names.

pub mod frames;
