//! Entity and component state.
//!
//! [`World`] owns the handle forest, the component registry, and the
//! deferred-remove list. It is the mutable state handed to message
//! handlers and update callbacks; registration and the update loop live on
//! [`Ecs`](crate::Ecs).
//!
//! # Locking
//!
//! Component columns sit behind `RefCell`. Accessors hand out `Ref`/
//! `RefMut` guards; touching a column that is already borrowed (for
//! example adding a component from inside a per-row update over the same
//! column) panics. Use [`World::mark_remove`] for destruction during
//! iteration.

use std::cell::{Ref, RefMut};

use smallvec::SmallVec;
use sylva_arena::HandleForest;
use sylva_core::Handle;

use crate::interface::ErasedInterface;
use crate::iter::{Children, RecursiveComponents};
use crate::registry::ComponentRegistry;

/// Entity forest plus component storage.
#[derive(Default)]
pub struct World {
    pub(crate) forest: HandleForest,
    pub(crate) registry: ComponentRegistry,
    pub(crate) dead: Vec<Handle>,
}

impl World {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ── entity lifecycle ─────────────────────────────────────────

    /// Allocate a fresh entity with no parent, no children, and no
    /// components.
    pub fn create(&mut self) -> Handle {
        self.forest.create()
    }

    /// Whether `h` refers to a live entity.
    pub fn is_valid(&self, h: Handle) -> bool {
        self.forest.is_valid(h)
    }

    /// Reconstruct the current handle for a slot. See
    /// [`HandleForest::handle_at`].
    pub fn handle_at(&self, slot: u16) -> Handle {
        self.forest.handle_at(slot)
    }

    /// Make `child` the new first child of `parent`, then restore the
    /// relational order for every relational component over `child`'s
    /// subtree.
    ///
    /// Returns `false` without side effects when the relation already
    /// holds.
    pub fn attach(&mut self, parent: Handle, child: Handle) -> bool {
        if !self.forest.attach(parent, child) {
            return false;
        }
        for iface in self.registry.iter() {
            if iface.is_relational() {
                iface.rebuild_after_attach(&self.forest, child);
            }
        }
        true
    }

    /// Unlink `h` from its parent, keeping its own children.
    pub fn detach(&mut self, h: Handle) {
        self.forest.detach(h);
    }

    /// Queue `h` for removal at the end of the next update. Handles that
    /// die before finalization are skipped silently.
    pub fn mark_remove(&mut self, h: Handle) {
        self.dead.push(h);
    }

    /// Depth-first destroy: children first, then every component (with
    /// on-destroy callbacks), then the handle itself.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn remove(&mut self, h: Handle) {
        assert!(self.is_valid(h), "remove: invalid handle {h}");
        let mut child = self.forest.first_child(h);
        while !child.is_null() {
            let next = self.forest.next_sibling(child);
            self.remove(child);
            child = next;
        }
        for i in 0..self.registry.count() {
            let iface = self.registry.erased(i).clone();
            iface.remove_entity(&self.forest, h);
        }
        self.forest.free(h);
    }

    /// Process and empty the deferred-remove list.
    pub(crate) fn finalize_removals(&mut self) {
        let dead = std::mem::take(&mut self.dead);
        for h in dead {
            if self.is_valid(h) {
                self.remove(h);
            }
        }
    }

    /// Destroy every entity and component row (on-destroy callbacks
    /// fire), keeping registrations.
    pub(crate) fn clear_entities(&mut self) {
        for iface in self.registry.iter() {
            iface.clear_with_callbacks();
        }
        self.forest.clear();
        self.dead.clear();
    }

    // ── component access ─────────────────────────────────────────

    /// Add a `C` row for `h` and return a guard to it. On-create
    /// callbacks fire before this returns.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid, `h` already carries a `C`, or `C` is not
    /// registered.
    pub fn add_component<C: 'static>(&mut self, h: Handle, value: C) -> RefMut<'_, C> {
        assert!(self.forest.is_valid(h), "add_component: invalid handle {h}");
        let iface = self.registry.typed::<C>();
        iface.push_row(h, value);
        if iface.relational {
            // A parent that gains the component after its children must
            // not land below them.
            let mut kids: SmallVec<[Handle; 8]> = SmallVec::new();
            let mut c = self.forest.first_child(h);
            while !c.is_null() {
                kids.push(c);
                c = self.forest.next_sibling(c);
            }
            for c in kids {
                iface.attach_rebuild(&self.forest, c);
            }
        }
        iface.run_create(h);
        let row = match iface.row_of(h) {
            Some(row) => row,
            None => unreachable!("row vanished during insertion"),
        };
        RefMut::map(iface.column.borrow_mut(), |col| &mut col[row])
    }

    /// Whether `h` carries a `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn has_component<C: 'static>(&self, h: Handle) -> bool {
        self.is_valid(h) && self.registry.typed::<C>().row_of(h).is_some()
    }

    /// Shared guard to `h`'s `C`, or `None` when `h` is dead or carries
    /// none.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn get<C: 'static>(&self, h: Handle) -> Option<Ref<'_, C>> {
        if !self.is_valid(h) {
            return None;
        }
        let iface = self.registry.typed::<C>();
        let row = iface.row_of(h)?;
        Some(Ref::map(iface.column.borrow(), |col| &col[row]))
    }

    /// Mutable guard to `h`'s `C`, or `None` when `h` is dead or carries
    /// none.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn get_mut<C: 'static>(&self, h: Handle) -> Option<RefMut<'_, C>> {
        if !self.is_valid(h) {
            return None;
        }
        let iface = self.registry.typed::<C>();
        let row = iface.row_of(h)?;
        Some(RefMut::map(iface.column.borrow_mut(), |col| &mut col[row]))
    }

    /// Overwrite `h`'s `C` in place, or add one if absent.
    pub fn update_or_create<C: 'static>(&mut self, h: Handle, value: C) -> RefMut<'_, C> {
        if self.has_component::<C>(h) {
            let Some(mut existing) = self.get_mut::<C>(h) else {
                unreachable!("component vanished between lookup and access")
            };
            *existing = value;
            existing
        } else {
            self.add_component(h, value)
        }
    }

    /// `h`'s `C`, default-constructing one if absent.
    pub fn get_or_create<C: 'static + Default>(&mut self, h: Handle) -> RefMut<'_, C> {
        if self.has_component::<C>(h) {
            match self.get_mut::<C>(h) {
                Some(existing) => existing,
                None => unreachable!("component vanished between lookup and access"),
            }
        } else {
            self.add_component(h, C::default())
        }
    }

    /// Destroy `h`'s `C` row. Silent no-op when absent or `h` is dead.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn remove_component<C: 'static>(&mut self, h: Handle) {
        let iface = self.registry.typed::<C>();
        iface.remove_entity(&self.forest, h);
    }

    /// Destroy every `C` row matching `pred`. Callbacks fire per row.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn remove_component_if<C: 'static>(&mut self, mut pred: impl FnMut(&C) -> bool) {
        let iface = self.registry.typed::<C>();
        let mut row = 0;
        loop {
            let matched = {
                let col = iface.column.borrow();
                match col.get(row) {
                    Some(c) => pred(c),
                    None => break,
                }
            };
            if matched {
                iface.destroy_row(row);
                let vacated = iface.remove_row_at(row);
                if iface.relational {
                    if let Some(r) = vacated {
                        iface.rebuild_from(&self.forest, r);
                    }
                }
            } else {
                row += 1;
            }
        }
    }

    /// The storage row currently holding `h`'s `C`, if any. Rows move
    /// under swap-removal and relational rebuilds; this is a debugging
    /// and test hook, not a stable address.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn component_row<C: 'static>(&self, h: Handle) -> Option<usize> {
        self.registry.typed::<C>().row_of(h)
    }

    /// Number of live `C` rows.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn component_count<C: 'static>(&self) -> usize {
        self.registry.typed::<C>().column.borrow().len()
    }

    /// Visit every `C` row in storage order.
    ///
    /// The column stays borrowed for the whole walk; `f` must not touch
    /// `C` through the world.
    pub fn for_each<C: 'static>(&self, mut f: impl FnMut(&C)) {
        let iface = self.registry.typed::<C>();
        let col = iface.column.borrow();
        for c in col.iter() {
            f(c);
        }
    }

    /// Visit every `C` row mutably, in storage order.
    ///
    /// The column stays borrowed for the whole walk; `f` must not touch
    /// `C` through the world.
    pub fn for_each_mut<C: 'static>(&self, mut f: impl FnMut(&mut C)) {
        let iface = self.registry.typed::<C>();
        let mut col = iface.column.borrow_mut();
        for c in col.iter_mut() {
            f(c);
        }
    }

    // ── traversal ────────────────────────────────────────────────

    /// The parent of `h`, or NULL for roots and for a NULL input.
    pub fn parent(&self, h: Handle) -> Handle {
        if h.is_null() {
            Handle::NULL
        } else {
            self.forest.parent(h)
        }
    }

    /// The first (most recently attached) child, or NULL.
    pub fn first_child(&self, h: Handle) -> Handle {
        if h.is_null() {
            Handle::NULL
        } else {
            self.forest.first_child(h)
        }
    }

    /// The next sibling, or NULL.
    pub fn next_sibling(&self, h: Handle) -> Handle {
        if h.is_null() {
            Handle::NULL
        } else {
            self.forest.next_sibling(h)
        }
    }

    /// Pre-order successor of `current`, bounded by `root`: first child,
    /// else next sibling, else an ancestor's next sibling; NULL once the
    /// walk unwinds to `root`.
    pub fn next_handle(&self, current: Handle, root: Handle) -> Handle {
        let child = self.first_child(current);
        if !child.is_null() {
            return child;
        }
        let mut cur = current;
        loop {
            if cur.is_null() || cur == root {
                return Handle::NULL;
            }
            let next = self.next_sibling(cur);
            if !next.is_null() {
                return next;
            }
            cur = self.parent(cur);
        }
    }

    /// Iterate over the direct children of `h`.
    pub fn children(&self, h: Handle) -> Children<'_> {
        Children::new(self, self.first_child(h))
    }

    /// Iterate over the `C` of every descendant of `root` (exclusive),
    /// in pre-order.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not registered.
    pub fn recursive_components<C: 'static>(&self, root: Handle) -> RecursiveComponents<'_, C> {
        RecursiveComponents::new(self, self.registry.typed::<C>(), root, self.first_child(root))
    }

    /// Call `f` on `h` and every descendant, pre-order. A no-op when `h`
    /// is dead.
    pub fn recursive_call(&self, h: Handle, mut f: impl FnMut(Handle)) {
        if !self.is_valid(h) {
            return;
        }
        self.walk(h, &mut f);
    }

    fn walk<F: FnMut(Handle)>(&self, h: Handle, f: &mut F) {
        f(h);
        for c in self.children(h) {
            self.walk(c, f);
        }
    }

    /// Call `f` on the `C` of `h` and of every descendant carrying one,
    /// pre-order. A no-op when `h` is dead.
    pub fn recursive_component_call<C: 'static>(&self, h: Handle, mut f: impl FnMut(&mut C)) {
        if !self.is_valid(h) {
            return;
        }
        self.component_walk(h, &mut f);
    }

    fn component_walk<C: 'static, F: FnMut(&mut C)>(&self, h: Handle, f: &mut F) {
        if let Some(mut c) = self.get_mut::<C>(h) {
            f(&mut c);
        }
        for child in self.children(h) {
            self.component_walk(child, f);
        }
    }
}
