//! Entity-component-system core.
//!
//! The aggregate [`Ecs`] owns a handle forest, per-component-type column
//! storage with slot-to-row index tables, a typed message bus with a
//! delayed queue, and a system registry whose callbacks are wired through
//! explicit capability registration.
//!
//! Single-threaded by design: every callback runs synchronously on the
//! stack of `dispatch`, `update`, or the mutating operation that
//! triggered it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
mod ecs;
pub mod interface;
pub mod iter;
mod registry;
pub mod system;
pub mod world;

pub use context::Context;
pub use ecs::Ecs;
pub use iter::{Children, RecursiveComponents};
pub use registry::IndexKind;
pub use system::SystemBuilder;
pub use world::World;
