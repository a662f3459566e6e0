//! Core abstraction traits.

use crate::handle::Handle;

/// A component that carries its owning entity's handle in its own data.
///
/// Relational components implement this so storage can recover the owner
/// of a row from the element itself instead of a sidecar array. The
/// returned handle must be the entity the component was added to and must
/// not change for the lifetime of the component.
pub trait HasOwner {
    /// The handle of the entity this value belongs to.
    fn owner(&self) -> Handle;
}
