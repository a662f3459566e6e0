//! Test fixtures shared across the Sylva workspace.
//!
//! Deterministic components, message payloads, and a call recorder used
//! by unit, integration, and benchmark code. Not published.

#![forbid(unsafe_code)]

pub mod fixtures;

pub use fixtures::{Anchor, CallLog, MsgAction, MsgDamage, MsgTick, Position, Velocity};
