//! Lazy traversal iterators.

use std::cell::Ref;

use sylva_core::Handle;

use crate::interface::Interface;
use crate::world::World;

/// Iterator over the direct children of an entity, in sibling order.
pub struct Children<'a> {
    world: &'a World,
    current: Handle,
}

impl<'a> Children<'a> {
    pub(crate) fn new(world: &'a World, first: Handle) -> Self {
        Self {
            world,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        if self.current.is_null() {
            return None;
        }
        let h = self.current;
        self.current = self.world.next_sibling(h);
        Some(h)
    }
}

/// Pre-order iterator over the `C` rows of every descendant of a root
/// (the root itself excluded), skipping entities that carry none.
pub struct RecursiveComponents<'a, C: 'static> {
    world: &'a World,
    iface: &'a Interface<C>,
    root: Handle,
    current: Handle,
}

impl<'a, C: 'static> RecursiveComponents<'a, C> {
    pub(crate) fn new(
        world: &'a World,
        iface: &'a Interface<C>,
        root: Handle,
        first: Handle,
    ) -> Self {
        Self {
            world,
            iface,
            root,
            current: first,
        }
    }
}

impl<'a, C: 'static> Iterator for RecursiveComponents<'a, C> {
    type Item = Ref<'a, C>;

    fn next(&mut self) -> Option<Ref<'a, C>> {
        while !self.current.is_null() {
            let h = self.current;
            self.current = self.world.next_handle(h, self.root);
            if let Some(row) = self.iface.row_of(h) {
                return Some(Ref::map(self.iface.column.borrow(), |col| &col[row]));
            }
        }
        None
    }
}
