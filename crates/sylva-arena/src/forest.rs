//! The handle forest: parent/child links over generational slots.
//!
//! [`HandleForest`] extends [`HandleManager`] with a forest of entity
//! trees. The children of a node form a doubly-linked sibling list rooted
//! at the parent's first-child link. Attaching inserts at the front of the
//! list, so siblings enumerate in reverse attach order (LIFO).
//!
//! Link invariants, checked in debug builds during unlinking:
//! - a node appears exactly once in its parent's child list;
//! - `prev_sibling` is empty iff the node is its parent's first child;
//! - roots carry no sibling links.

use crate::manager::HandleManager;
use sylva_core::Handle;

/// Per-slot tree links. Cleared on allocation and on detach.
#[derive(Clone, Copy, Debug, Default)]
struct TreeLinks {
    parent: Option<u16>,
    first_child: Option<u16>,
    next_sibling: Option<u16>,
    prev_sibling: Option<u16>,
}

/// A [`HandleManager`] whose handles can be linked into trees.
#[derive(Default)]
pub struct HandleForest {
    manager: HandleManager,
    links: Vec<TreeLinks>,
}

impl HandleForest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle with no parent and no children.
    ///
    /// # Panics
    ///
    /// As [`HandleManager::create`].
    pub fn create(&mut self) -> Handle {
        let h = self.manager.create();
        let i = h.slot() as usize;
        if self.links.len() <= i {
            self.links.resize(i + 1, TreeLinks::default());
        } else {
            self.links[i] = TreeLinks::default();
        }
        h
    }

    /// Detach `h` and return its slot to the free list.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid or still has children.
    pub fn free(&mut self, h: Handle) {
        self.remove(h);
        self.manager.free(h);
    }

    /// Make `child` the new first child of `parent`.
    ///
    /// Detaches `child` from its prior parent first, if any. Returns
    /// `false` without side effects when the relation already holds.
    ///
    /// # Panics
    ///
    /// Panics if either handle is invalid, or if `parent == child`.
    pub fn attach(&mut self, parent: Handle, child: Handle) -> bool {
        assert!(self.is_valid(parent), "attach: invalid parent {parent}");
        assert!(self.is_valid(child), "attach: invalid child {child}");
        assert!(parent != child, "attach: cannot attach {child} to itself");

        let p = parent.slot();
        let c = child.slot();
        if self.links[c as usize].parent == Some(p) {
            return false;
        }
        if self.links[c as usize].parent.is_some() {
            self.detach(child);
        }

        let old_first = self.links[p as usize].first_child;
        let child_links = &mut self.links[c as usize];
        child_links.parent = Some(p);
        child_links.next_sibling = old_first;
        child_links.prev_sibling = None;
        if let Some(n) = old_first {
            self.links[n as usize].prev_sibling = Some(c);
        }
        self.links[p as usize].first_child = Some(c);
        true
    }

    /// Unlink `h` from its parent and siblings, clearing its links.
    ///
    /// The remaining siblings' mutual links are preserved. A root handle
    /// detaches as a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn detach(&mut self, h: Handle) {
        assert!(self.is_valid(h), "detach: invalid handle {h}");
        let i = h.slot() as usize;
        let TreeLinks {
            parent,
            next_sibling,
            prev_sibling,
            ..
        } = self.links[i];
        self.links[i].parent = None;
        self.links[i].next_sibling = None;
        self.links[i].prev_sibling = None;

        let Some(p) = parent else {
            debug_assert!(next_sibling.is_none(), "root with a next sibling");
            debug_assert!(prev_sibling.is_none(), "root with a prev sibling");
            return;
        };

        if self.links[p as usize].first_child == Some(h.slot()) {
            debug_assert!(prev_sibling.is_none(), "first child with a prev sibling");
            self.links[p as usize].first_child = next_sibling;
            if let Some(n) = next_sibling {
                self.links[n as usize].prev_sibling = None;
            }
        } else {
            debug_assert!(prev_sibling.is_some(), "non-first child without a prev sibling");
            if let Some(n) = next_sibling {
                self.links[n as usize].prev_sibling = prev_sibling;
            }
            if let Some(v) = prev_sibling {
                self.links[v as usize].next_sibling = next_sibling;
            }
        }
    }

    /// Detach a childless handle.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid or has children.
    pub fn remove(&mut self, h: Handle) {
        assert!(self.is_valid(h), "remove: invalid handle {h}");
        assert!(
            self.links[h.slot() as usize].first_child.is_none(),
            "remove of a handle with children: {h}"
        );
        self.detach(h);
    }

    /// Detach `h` and turn each of its children into a root.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn remove_and_orphan(&mut self, h: Handle) {
        self.detach(h);
        let i = h.slot() as usize;
        while let Some(c) = self.links[i].first_child {
            self.links[i].first_child = self.links[c as usize].next_sibling;
            let child_links = &mut self.links[c as usize];
            child_links.parent = None;
            child_links.next_sibling = None;
            child_links.prev_sibling = None;
        }
    }

    /// The parent of `h`, or NULL if `h` is a root.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn parent(&self, h: Handle) -> Handle {
        assert!(self.is_valid(h), "parent: invalid handle {h}");
        match self.links[h.slot() as usize].parent {
            Some(p) => self.manager.handle_at(p),
            None => Handle::NULL,
        }
    }

    /// The first (most recently attached) child of `h`, or NULL.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn first_child(&self, h: Handle) -> Handle {
        assert!(self.is_valid(h), "first_child: invalid handle {h}");
        match self.links[h.slot() as usize].first_child {
            Some(c) => self.manager.handle_at(c),
            None => Handle::NULL,
        }
    }

    /// The next sibling of `h`, or NULL.
    ///
    /// # Panics
    ///
    /// Panics if `h` is invalid.
    pub fn next_sibling(&self, h: Handle) -> Handle {
        assert!(self.is_valid(h), "next_sibling: invalid handle {h}");
        match self.links[h.slot() as usize].next_sibling {
            Some(n) => self.manager.handle_at(n),
            None => Handle::NULL,
        }
    }

    /// Whether `h` refers to a live entity.
    pub fn is_valid(&self, h: Handle) -> bool {
        self.manager.is_valid(h)
    }

    /// Reconstruct the current handle for a slot. See
    /// [`HandleManager::handle_at`].
    pub fn handle_at(&self, slot: u16) -> Handle {
        self.manager.handle_at(slot)
    }

    /// Number of slots ever allocated.
    pub fn slot_count(&self) -> usize {
        self.manager.slot_count()
    }

    /// Drop every slot and all links.
    pub fn clear(&mut self) {
        self.manager.clear();
        self.links.clear();
    }
}
