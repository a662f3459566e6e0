//! Reusable component and message fixtures.
//!
//! Components: [`Position`] and [`Velocity`] (plain, sidecar-stored) and
//! [`Anchor`] (relational; carries its owner). Messages: [`MsgAction`]
//! and [`MsgDamage`] (entity-targeted) and [`MsgTick`] (broadcast).

use std::cell::RefCell;
use std::rc::Rc;

use sylva_bus::{Payload, TargetedPayload};
use sylva_core::{Handle, HasOwner, MessageTypeId};

/// A 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

/// A 2D velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Velocity {
    /// X velocity.
    pub dx: i32,
    /// Y velocity.
    pub dy: i32,
}

/// A relational fixture component: carries its owner, tagged with a
/// label for assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor {
    /// The owning entity.
    pub owner: Handle,
    /// Arbitrary tag for test assertions.
    pub label: u32,
}

impl Anchor {
    /// An anchor owned by `owner`.
    pub fn new(owner: Handle, label: u32) -> Self {
        Self { owner, label }
    }
}

impl HasOwner for Anchor {
    fn owner(&self) -> Handle {
        self.owner
    }
}

/// An entity-targeted action message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsgAction {
    /// The entity acted on.
    pub entity: Handle,
}

impl Payload for MsgAction {
    const MESSAGE_ID: MessageTypeId = MessageTypeId(0);
}

impl TargetedPayload for MsgAction {
    fn target(&self) -> Handle {
        self.entity
    }
}

/// A broadcast tick message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MsgTick {
    /// Elapsed time carried by the message.
    pub elapsed: f32,
}

impl Payload for MsgTick {
    const MESSAGE_ID: MessageTypeId = MessageTypeId(1);
}

/// An entity-targeted damage message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsgDamage {
    /// The entity damaged.
    pub entity: Handle,
    /// Damage amount.
    pub amount: i32,
}

impl Payload for MsgDamage {
    const MESSAGE_ID: MessageTypeId = MessageTypeId(2);
}

impl TargetedPayload for MsgDamage {
    fn target(&self) -> Handle {
        self.entity
    }
}

/// A shared, clonable call recorder for asserting callback order.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    /// Drain and return all entries.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
