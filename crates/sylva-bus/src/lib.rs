//! Typed message bus: immediate dispatch plus a time-ordered delayed queue.
//!
//! Messages are typed payloads routed by integer id. [`HandlerTable`]
//! holds per-id handler lists, [`DelayQueue`] owns the virtual clock and
//! the pending heap, and [`MessageQueue`] combines the two into the full
//! bus surface for standalone use.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod delay;
pub mod handlers;
pub mod message;
pub mod queue;

pub use delay::DelayQueue;
pub use handlers::{Handler, HandlerTable};
pub use message::{Message, Payload, TargetedPayload, MAX_PAYLOAD_BYTES};
pub use queue::MessageQueue;
