//! Generational slot allocation.
//!
//! [`HandleManager`] owns the slot table behind entity handles. Freed
//! slots are recycled through a FIFO free list, so a slot sits idle as
//! long as possible before reuse, and every allocation bumps the slot's
//! generation, invalidating any handle minted for a previous occupant.

use sylva_core::Handle;

/// Free-list state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    /// The slot is allocated.
    Used,
    /// The slot is free and is the tail of the free list.
    End,
    /// The slot is free; the payload is the next free slot.
    Next(u16),
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    generation: u16,
    link: Link,
}

/// Allocator for generational entity handles.
///
/// A handle is valid from [`create`](HandleManager::create) until
/// [`free`](HandleManager::free). Freeing does not touch the generation —
/// the bump happens at the next allocation of the slot — so a freed
/// handle is invalid immediately (the slot is no longer marked used) and
/// stays invalid after reuse (the generation no longer matches).
#[derive(Default)]
pub struct HandleManager {
    entries: Vec<Entry>,
    first_free: Option<u16>,
    last_free: Option<u16>,
}

impl HandleManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle.
    ///
    /// Reuses the oldest freed slot if one exists, otherwise appends a
    /// new slot.
    ///
    /// # Panics
    ///
    /// Panics when a slot's generation counter is exhausted (65 535
    /// reuses of one slot) or when the 16-bit slot space overflows.
    pub fn create(&mut self) -> Handle {
        let slot = self.acquire_slot();
        let entry = &mut self.entries[slot as usize];
        entry.generation = entry.generation.wrapping_add(1);
        assert!(
            entry.generation != 0,
            "generation counter exhausted for slot {slot}"
        );
        Handle::new(slot, entry.generation)
    }

    /// Return a handle's slot to the free list.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not a live handle.
    pub fn free(&mut self, h: Handle) {
        assert!(self.is_valid(h), "free of invalid handle: {h}");
        let slot = h.slot();
        self.entries[slot as usize].link = Link::End;
        match self.last_free {
            None => {
                self.first_free = Some(slot);
                self.last_free = Some(slot);
            }
            Some(last) => {
                self.entries[last as usize].link = Link::Next(slot);
                self.last_free = Some(slot);
            }
        }
    }

    /// Whether `h` refers to a live entity: in bounds, allocated, and
    /// generation-matched.
    pub fn is_valid(&self, h: Handle) -> bool {
        if h.is_null() {
            return false;
        }
        match self.entries.get(h.slot() as usize) {
            Some(e) => e.link == Link::Used && e.generation == h.generation(),
            None => false,
        }
    }

    /// Reconstruct the current handle for a slot, or NULL if the slot has
    /// never been allocated.
    ///
    /// The result refers to whatever entity currently occupies the slot;
    /// callers are expected to use this on slots known to be live (for
    /// example owner slots recorded in component storage).
    pub fn handle_at(&self, slot: u16) -> Handle {
        match self.entries.get(slot as usize) {
            Some(e) => Handle::new(slot, e.generation),
            None => Handle::NULL,
        }
    }

    /// Number of slots ever allocated (live or free).
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop all slots and the free list. Every outstanding handle becomes
    /// invalid.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.first_free = None;
        self.last_free = None;
    }

    fn acquire_slot(&mut self) -> u16 {
        if let Some(slot) = self.first_free {
            match self.entries[slot as usize].link {
                Link::Next(next) => self.first_free = Some(next),
                Link::End => {
                    self.first_free = None;
                    self.last_free = None;
                }
                Link::Used => unreachable!("used slot on the free list"),
            }
            self.entries[slot as usize].link = Link::Used;
            return slot;
        }
        assert!(
            self.entries.len() <= u16::MAX as usize,
            "slot space exhausted (65536 slots)"
        );
        self.entries.push(Entry {
            generation: 0,
            link: Link::Used,
        });
        (self.entries.len() - 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_handle_is_slot_zero_gen_one() {
        let mut m = HandleManager::new();
        let h = m.create();
        assert_eq!(h, Handle::new(0, 1));
        assert!(!h.is_null());
        assert!(m.is_valid(h));
    }

    #[test]
    fn freed_handle_is_invalid() {
        let mut m = HandleManager::new();
        let h = m.create();
        m.free(h);
        assert!(!m.is_valid(h));
    }

    #[test]
    fn reuse_bumps_generation() {
        let mut m = HandleManager::new();
        let h = m.create();
        m.free(h);
        let h2 = m.create();
        assert_eq!(h2.slot(), h.slot());
        assert_ne!(h2.generation(), h.generation());
        assert!(!m.is_valid(h));
        assert!(m.is_valid(h2));
    }

    #[test]
    fn free_list_is_fifo() {
        let mut m = HandleManager::new();
        let a = m.create();
        let b = m.create();
        let c = m.create();
        m.free(b);
        m.free(a);
        m.free(c);
        // Oldest free first: b, then a, then c.
        assert_eq!(m.create().slot(), b.slot());
        assert_eq!(m.create().slot(), a.slot());
        assert_eq!(m.create().slot(), c.slot());
    }

    #[test]
    fn null_handle_is_never_valid() {
        let mut m = HandleManager::new();
        m.create();
        assert!(!m.is_valid(Handle::NULL));
    }

    #[test]
    fn out_of_bounds_is_invalid() {
        let m = HandleManager::new();
        assert!(!m.is_valid(Handle::new(3, 1)));
        assert_eq!(m.handle_at(3), Handle::NULL);
    }

    #[test]
    fn handle_at_tracks_current_occupant() {
        let mut m = HandleManager::new();
        let h = m.create();
        assert_eq!(m.handle_at(h.slot()), h);
        m.free(h);
        let h2 = m.create();
        assert_eq!(m.handle_at(h.slot()), h2);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut m = HandleManager::new();
        let h = m.create();
        m.clear();
        assert!(!m.is_valid(h));
        assert_eq!(m.slot_count(), 0);
        // Slot space restarts from scratch.
        assert_eq!(m.create(), Handle::new(0, 1));
    }

    #[test]
    #[should_panic(expected = "free of invalid handle")]
    fn double_free_panics() {
        let mut m = HandleManager::new();
        let h = m.create();
        m.free(h);
        m.free(h);
    }

    #[test]
    #[should_panic(expected = "generation counter exhausted")]
    fn generation_exhaustion_panics() {
        let mut m = HandleManager::new();
        for _ in 0..u16::MAX {
            let h = m.create();
            m.free(h);
        }
        // 65 535 generations used up; the next allocation would wrap to 0.
        m.create();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Invariant: a handle is valid iff it was created and not
            /// yet freed; freed handles never come back to life.
            #[test]
            fn validity_tracks_lifecycle(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
                let mut m = HandleManager::new();
                let mut live: Vec<Handle> = Vec::new();
                let mut dead: Vec<Handle> = Vec::new();

                for op in ops {
                    if op || live.is_empty() {
                        live.push(m.create());
                    } else {
                        let h = live.remove(0);
                        m.free(h);
                        dead.push(h);
                    }
                    for h in &live {
                        prop_assert!(m.is_valid(*h), "live handle {h} reported invalid");
                    }
                    for h in &dead {
                        prop_assert!(!m.is_valid(*h), "dead handle {h} reported valid");
                    }
                }
            }
        }
    }
}
