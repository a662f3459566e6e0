//! Sylva: a data-oriented entity-component-system core.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Sylva sub-crates. For most users, adding `sylva` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use sylva::prelude::*;
//!
//! #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
//! struct Position { x: i32, y: i32 }
//!
//! #[derive(Clone, Copy, Debug)]
//! struct MsgAction { entity: Handle }
//!
//! impl Payload for MsgAction {
//!     const MESSAGE_ID: MessageTypeId = MessageTypeId(0);
//! }
//! impl TargetedPayload for MsgAction {
//!     fn target(&self) -> Handle { self.entity }
//! }
//!
//! let mut ecs = Ecs::new();
//! ecs.register_component::<Position>("position", IndexKind::Flat);
//! ecs.register_system("position_system", ())
//!     .update_each::<Position>(|_, p, _dt| p.x += 1)
//!     .on_entity::<MsgAction, Position>(|_, _msg, p| p.y -= 1);
//!
//! let being = ecs.create();
//! ecs.add_component(being, Position { x: 3, y: 4 });
//! ecs.dispatch(MsgAction { entity: being });
//! ecs.update(1.0);
//! assert_eq!(*ecs.get::<Position>(being).unwrap(), Position { x: 4, y: 3 });
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sylva-core` | `Handle`, `MessageTypeId`, `HasOwner` |
//! | [`arena`] | `sylva-arena` | `HandleManager`, `HandleForest` |
//! | [`storage`] | `sylva-storage` | `Column`, index tables |
//! | [`bus`] | `sylva-bus` | `Message`, `DelayQueue`, `MessageQueue` |
//! | [`ecs`] | `sylva-ecs` | `Ecs`, `World`, system registration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types: handles, message ids, the owner-carrier trait
/// (`sylva-core`).
pub use sylva_core as types;

/// Generational handle allocation and the entity forest (`sylva-arena`).
pub use sylva_arena as arena;

/// Component columns and slot-to-row index tables (`sylva-storage`).
pub use sylva_storage as storage;

/// Typed message bus with a delayed priority queue (`sylva-bus`).
pub use sylva_bus as bus;

/// The ECS aggregate: registry, systems, update loop (`sylva-ecs`).
pub use sylva_ecs as ecs;

/// Common imports for typical Sylva usage.
///
/// ```rust
/// use sylva::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use sylva_core::{Handle, HasOwner, MessageTypeId};

    // Bus
    pub use sylva_bus::{DelayQueue, Message, MessageQueue, Payload, TargetedPayload};

    // Storage
    pub use sylva_storage::{Column, FlatIndexTable, HashedIndexTable, IndexTable};

    // Arena
    pub use sylva_arena::{HandleForest, HandleManager};

    // ECS
    pub use sylva_ecs::{Context, Ecs, IndexKind, SystemBuilder, World};
}
