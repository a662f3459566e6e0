//! Slot-to-row index tables.
//!
//! An [`IndexTable`] maps entity slots to rows of one column and keeps
//! that mapping a bijection as swap-removal moves rows around. Operations
//! that move rows take the storage as an explicit parameter so both sides
//! mutate together.
//!
//! Two interchangeable implementations: [`FlatIndexTable`] (dense vector,
//! best when the slot space is dense) and [`HashedIndexTable`] (hash map,
//! best when it is sparse).

use indexmap::IndexMap;
use sylva_core::Handle;

use crate::column::AnyColumn;

/// Sentinel for an unmapped slot in the flat table.
const VACANT: u32 = u32::MAX;

/// Mapping from entity slot to storage row.
///
/// Bijection invariant: for every live row `i` of the paired storage,
/// `get` of the owner recorded at row `i` yields `Some(i)`.
pub trait IndexTable {
    /// Record a row for `h` at the end of `storage` and return it.
    ///
    /// # Panics
    ///
    /// Panics if `h` already has a row (re-inserting a component is a
    /// contract violation).
    fn insert(&mut self, h: Handle, storage: &dyn AnyColumn) -> usize;

    /// Whether `h` has a row.
    fn contains(&self, h: Handle) -> bool;

    /// The row of `h`, if any. NULL handles have no row.
    fn get(&self, h: Handle) -> Option<usize>;

    /// Swap the rows of `a` and `b` in both the table and the storage.
    ///
    /// A no-op unless both handles have rows.
    fn swap(&mut self, a: Handle, b: Handle, storage: &mut dyn AnyColumn);

    /// Swap-remove the row of `h`. Returns the vacated row, or `None` as
    /// a silent no-op when `h` has none.
    fn remove_swap(&mut self, h: Handle, storage: &mut dyn AnyColumn) -> Option<usize>;

    /// Swap-remove by row. Returns the vacated row, or `None` when `row`
    /// is out of range.
    ///
    /// Clears the dying owner's entry, delegates the move to the storage,
    /// and points the moved-in owner's entry at `row`.
    fn remove_swap_at(&mut self, row: usize, storage: &mut dyn AnyColumn) -> Option<usize>;

    /// Empty the table and the storage.
    fn clear(&mut self, storage: &mut dyn AnyColumn);

    /// Number of mapped slots.
    fn len(&self) -> usize;

    /// Whether no slots are mapped.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dense slot-to-row table backed by a vector with power-of-two growth.
#[derive(Default)]
pub struct FlatIndexTable {
    rows: Vec<u32>,
    occupied: usize,
}

impl FlatIndexTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn grow_to_cover(&mut self, slot: u16) {
        let slot = slot as usize;
        if slot >= self.rows.len() {
            let mut n = self.rows.len().max(1);
            while slot >= n {
                n *= 2;
            }
            self.rows.resize(n, VACANT);
        }
    }
}

impl IndexTable for FlatIndexTable {
    fn insert(&mut self, h: Handle, storage: &dyn AnyColumn) -> usize {
        assert!(!self.contains(h), "re-inserting handle {h}");
        self.grow_to_cover(h.slot());
        let row = storage.len();
        self.rows[h.slot() as usize] = row as u32;
        self.occupied += 1;
        row
    }

    fn contains(&self, h: Handle) -> bool {
        self.get(h).is_some()
    }

    fn get(&self, h: Handle) -> Option<usize> {
        if h.is_null() {
            return None;
        }
        match self.rows.get(h.slot() as usize) {
            Some(&row) if row != VACANT => Some(row as usize),
            _ => None,
        }
    }

    fn swap(&mut self, a: Handle, b: Handle, storage: &mut dyn AnyColumn) {
        let (Some(ra), Some(rb)) = (self.get(a), self.get(b)) else {
            return;
        };
        self.rows[a.slot() as usize] = rb as u32;
        self.rows[b.slot() as usize] = ra as u32;
        storage.swap(ra, rb);
    }

    fn remove_swap(&mut self, h: Handle, storage: &mut dyn AnyColumn) -> Option<usize> {
        let row = self.get(h)?;
        self.remove_swap_at(row, storage)
    }

    fn remove_swap_at(&mut self, row: usize, storage: &mut dyn AnyColumn) -> Option<usize> {
        if row >= storage.len() {
            return None;
        }
        let dead_slot = storage.owner_slot(row);
        self.rows[dead_slot as usize] = VACANT;
        self.occupied -= 1;
        if let Some(moved_slot) = storage.remove_swap(row) {
            self.rows[moved_slot as usize] = row as u32;
        }
        Some(row)
    }

    fn clear(&mut self, storage: &mut dyn AnyColumn) {
        self.rows.clear();
        self.occupied = 0;
        storage.clear();
    }

    fn len(&self) -> usize {
        self.occupied
    }
}

/// Sparse slot-to-row table backed by a hash map.
#[derive(Default)]
pub struct HashedIndexTable {
    rows: IndexMap<u16, u32>,
}

impl HashedIndexTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexTable for HashedIndexTable {
    fn insert(&mut self, h: Handle, storage: &dyn AnyColumn) -> usize {
        assert!(
            !self.rows.contains_key(&h.slot()),
            "re-inserting handle {h}"
        );
        let row = storage.len();
        self.rows.insert(h.slot(), row as u32);
        row
    }

    fn contains(&self, h: Handle) -> bool {
        self.get(h).is_some()
    }

    fn get(&self, h: Handle) -> Option<usize> {
        if h.is_null() {
            return None;
        }
        self.rows.get(&h.slot()).map(|&row| row as usize)
    }

    fn swap(&mut self, a: Handle, b: Handle, storage: &mut dyn AnyColumn) {
        let (Some(ra), Some(rb)) = (self.get(a), self.get(b)) else {
            return;
        };
        self.rows.insert(a.slot(), rb as u32);
        self.rows.insert(b.slot(), ra as u32);
        storage.swap(ra, rb);
    }

    fn remove_swap(&mut self, h: Handle, storage: &mut dyn AnyColumn) -> Option<usize> {
        let row = self.get(h)?;
        self.remove_swap_at(row, storage)
    }

    fn remove_swap_at(&mut self, row: usize, storage: &mut dyn AnyColumn) -> Option<usize> {
        if row >= storage.len() {
            return None;
        }
        let dead_slot = storage.owner_slot(row);
        self.rows.swap_remove(&dead_slot);
        if let Some(moved_slot) = storage.remove_swap(row) {
            self.rows.insert(moved_slot, row as u32);
        }
        Some(row)
    }

    fn clear(&mut self, storage: &mut dyn AnyColumn) {
        self.rows.clear();
        storage.clear();
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn h(slot: u16) -> Handle {
        Handle::new(slot, 1)
    }

    /// Exercise the shared contract against either implementation.
    fn basic_contract(table: &mut dyn IndexTable) {
        let mut col: Column<u32> = Column::with_sidecar();

        // insert appends at the storage tail
        assert_eq!(table.insert(h(4), &col), 0);
        col.push(h(4), 40);
        assert_eq!(table.insert(h(9), &col), 1);
        col.push(h(9), 90);
        assert_eq!(table.insert(h(2), &col), 2);
        col.push(h(2), 20);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(h(9)), Some(1));
        assert!(table.contains(h(2)));
        assert!(!table.contains(h(5)));
        assert_eq!(table.get(Handle::NULL), None);

        // removing the head pulls the tail row in and repoints it
        assert_eq!(table.remove_swap(h(4), &mut col), Some(0));
        assert_eq!(col.len(), 2);
        assert_eq!(table.get(h(2)), Some(0));
        assert_eq!(col[0], 20);
        assert_eq!(table.get(h(4)), None);

        // removing an absent handle is a silent no-op
        assert_eq!(table.remove_swap(h(4), &mut col), None);
        assert_eq!(table.len(), 2);

        // swap exchanges both table entries and storage rows
        table.swap(h(2), h(9), &mut col);
        assert_eq!(table.get(h(2)), Some(1));
        assert_eq!(table.get(h(9)), Some(0));
        assert_eq!(col[0], 90);

        // swap with a missing side is a no-op
        table.swap(h(2), h(5), &mut col);
        assert_eq!(table.get(h(2)), Some(1));

        table.clear(&mut col);
        assert!(table.is_empty());
        assert!(col.is_empty());
    }

    #[test]
    fn flat_contract() {
        basic_contract(&mut FlatIndexTable::new());
    }

    #[test]
    fn hashed_contract() {
        basic_contract(&mut HashedIndexTable::new());
    }

    #[test]
    fn remove_swap_at_out_of_range_is_none() {
        let mut table = FlatIndexTable::new();
        let mut col: Column<u32> = Column::with_sidecar();
        assert_eq!(table.remove_swap_at(0, &mut col), None);
    }

    #[test]
    #[should_panic(expected = "re-inserting handle")]
    fn flat_reinsert_panics() {
        let mut table = FlatIndexTable::new();
        let col: Column<u32> = Column::with_sidecar();
        table.insert(h(1), &col);
        table.insert(h(1), &col);
    }

    #[test]
    #[should_panic(expected = "re-inserting handle")]
    fn hashed_reinsert_panics() {
        let mut table = HashedIndexTable::new();
        let col: Column<u32> = Column::with_sidecar();
        table.insert(h(1), &col);
        table.insert(h(1), &col);
    }

    #[test]
    fn flat_grows_past_sparse_slots() {
        let mut table = FlatIndexTable::new();
        let mut col: Column<u32> = Column::with_sidecar();
        table.insert(h(1000), &col);
        col.push(h(1000), 1);
        assert_eq!(table.get(h(1000)), Some(0));
        assert_eq!(table.get(h(999)), None);
    }

    // ── proptest ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// Apply random insert/remove/swap traffic and check the
        /// row/slot bijection after every step.
        fn churn(table: &mut dyn IndexTable, ops: Vec<(u8, u16)>) {
            let mut col: Column<u32> = Column::with_sidecar();
            for (op, slot) in ops {
                let slot = slot % 32;
                match op % 3 {
                    0 => {
                        if !table.contains(h(slot)) {
                            table.insert(h(slot), &col);
                            col.push(h(slot), u32::from(slot));
                        }
                    }
                    1 => {
                        table.remove_swap(h(slot), &mut col);
                    }
                    _ => {
                        table.swap(h(slot), h(slot / 2), &mut col);
                    }
                }
                // Bijection: every live row maps back to itself.
                for row in 0..col.len() {
                    let owner = h(col.owner_slot(row));
                    assert_eq!(table.get(owner), Some(row), "row {row} lost its mapping");
                }
                assert_eq!(table.len(), col.len());
            }
        }

        proptest! {
            #[test]
            fn flat_bijection_holds(ops in proptest::collection::vec((any::<u8>(), any::<u16>()), 1..150)) {
                churn(&mut FlatIndexTable::new(), ops);
            }

            #[test]
            fn hashed_bijection_holds(ops in proptest::collection::vec((any::<u8>(), any::<u16>()), 1..150)) {
                churn(&mut HashedIndexTable::new(), ops);
            }
        }
    }
}
