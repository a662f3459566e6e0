//! Typed component columns.
//!
//! A [`Column<C>`] is a contiguous array of component rows with O(1)
//! insertion and swap-removal. Each row knows its owning entity's slot,
//! through one of two policies fixed at construction:
//!
//! - *sidecar*: a parallel array of owner slots, for plain components;
//! - *intrinsic*: the component itself carries its owner handle
//!   (relational components), recovered through an accessor function.
//!
//! [`AnyColumn`] is the type-erased face a registry holds columns through.

use std::any::Any;
use std::ops::{Index, IndexMut};

use sylva_core::Handle;

/// Capacity of a column's first allocation; doubles from there.
const FIRST_ALLOC: usize = 8;

enum OwnerPolicy<C> {
    Sidecar(Vec<u16>),
    Intrinsic(fn(&C) -> Handle),
}

/// A typed column of component rows.
///
/// Rows are kept compact: removal swaps the last row into the vacated
/// position. Removal reports which owner's row moved so an index table
/// can patch its mapping.
pub struct Column<C> {
    items: Vec<C>,
    owners: OwnerPolicy<C>,
}

impl<C> Column<C> {
    /// A column whose owner slots live in a parallel sidecar array.
    pub fn with_sidecar() -> Self {
        Self {
            items: Vec::new(),
            owners: OwnerPolicy::Sidecar(Vec::new()),
        }
    }

    /// A column whose elements carry their owner themselves, recovered
    /// through `owner_of`. No sidecar is kept.
    pub fn with_intrinsic(owner_of: fn(&C) -> Handle) -> Self {
        Self {
            items: Vec::new(),
            owners: OwnerPolicy::Intrinsic(owner_of),
        }
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a row owned by `owner`.
    ///
    /// # Panics
    ///
    /// For intrinsic columns, panics if `value` does not carry `owner`.
    pub fn push(&mut self, owner: Handle, value: C) {
        self.reserve_one();
        match &mut self.owners {
            OwnerPolicy::Sidecar(owners) => owners.push(owner.slot()),
            OwnerPolicy::Intrinsic(owner_of) => {
                assert!(
                    owner_of(&value) == owner,
                    "intrinsic owner does not match the inserting handle {owner}"
                );
            }
        }
        self.items.push(value);
    }

    /// Append a default-constructed row owned by `owner`.
    ///
    /// # Panics
    ///
    /// Intrinsic columns cannot record an owner in a default value, so
    /// this panics unless the column uses a sidecar.
    pub fn push_default(&mut self, owner: Handle)
    where
        C: Default,
    {
        self.push(owner, C::default());
    }

    /// Shared access to a row.
    pub fn get(&self, row: usize) -> Option<&C> {
        self.items.get(row)
    }

    /// Mutable access to a row.
    pub fn get_mut(&mut self, row: usize) -> Option<&mut C> {
        self.items.get_mut(row)
    }

    /// Mutable access to the most recently appended row.
    pub fn last_mut(&mut self) -> Option<&mut C> {
        self.items.last_mut()
    }

    /// Iterate over rows in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.items.iter()
    }

    /// Iterate mutably over rows in storage order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, C> {
        self.items.iter_mut()
    }

    /// The owner slot of a row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn owner_slot(&self, row: usize) -> u16 {
        match &self.owners {
            OwnerPolicy::Sidecar(owners) => owners[row],
            OwnerPolicy::Intrinsic(owner_of) => owner_of(&self.items[row]).slot(),
        }
    }

    /// Swap two rows, mirroring the sidecar if present.
    ///
    /// # Panics
    ///
    /// Panics if either row is out of range.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        if let OwnerPolicy::Sidecar(owners) = &mut self.owners {
            owners.swap(a, b);
        }
    }

    /// Drop row `row` and move the last row into its place.
    ///
    /// A no-op on an empty column. When `row` is the last row, no move
    /// happens.
    ///
    /// # Panics
    ///
    /// Panics if the column is non-empty and `row` is out of range.
    pub fn pop_swap(&mut self, row: usize) {
        if self.items.is_empty() {
            return;
        }
        self.items.swap_remove(row);
        if let OwnerPolicy::Sidecar(owners) = &mut self.owners {
            owners.swap_remove(row);
        }
    }

    /// Swap-remove row `row`, reporting the owner slot of the row that
    /// moved into its place.
    ///
    /// Returns `None` when `row` is out of range, or when `row` was the
    /// last row and nothing moved.
    pub fn remove_swap(&mut self, row: usize) -> Option<u16> {
        if row >= self.items.len() {
            return None;
        }
        let last = self.items.len() - 1;
        let moved = if row == last {
            None
        } else {
            Some(self.owner_slot(last))
        };
        self.pop_swap(row);
        moved
    }

    /// Drop every row, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
        if let OwnerPolicy::Sidecar(owners) = &mut self.owners {
            owners.clear();
        }
    }

    /// Drop every row and release the underlying buffers.
    pub fn reset(&mut self) {
        self.clear();
        self.items.shrink_to_fit();
        if let OwnerPolicy::Sidecar(owners) = &mut self.owners {
            owners.shrink_to_fit();
        }
    }

    /// Grow for one more row: capacity doubles, starting at
    /// [`FIRST_ALLOC`].
    fn reserve_one(&mut self) {
        if self.items.len() == self.items.capacity() {
            let target = if self.items.capacity() < 4 {
                FIRST_ALLOC
            } else {
                self.items.capacity() * 2
            };
            self.items.reserve_exact(target - self.items.len());
            if let OwnerPolicy::Sidecar(owners) = &mut self.owners {
                owners.reserve_exact(target - owners.len());
            }
        }
    }
}

impl<C> Index<usize> for Column<C> {
    type Output = C;

    fn index(&self, row: usize) -> &C {
        &self.items[row]
    }
}

impl<C> IndexMut<usize> for Column<C> {
    fn index_mut(&mut self, row: usize) -> &mut C {
        &mut self.items[row]
    }
}

/// The type-erased face of a [`Column`].
///
/// A registry holds heterogeneous columns through this trait; typed access
/// goes back through [`AnyColumn::as_any`].
pub trait AnyColumn: Any {
    /// Number of live rows.
    fn len(&self) -> usize;

    /// Whether the column has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The owner slot of a row.
    fn owner_slot(&self, row: usize) -> u16;

    /// Swap two rows.
    fn swap(&mut self, a: usize, b: usize);

    /// Swap-remove a row; see [`Column::remove_swap`].
    fn remove_swap(&mut self, row: usize) -> Option<u16>;

    /// Drop every row.
    fn clear(&mut self);

    /// Drop every row and release buffers.
    fn reset(&mut self);

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: 'static> AnyColumn for Column<C> {
    fn len(&self) -> usize {
        Column::len(self)
    }

    fn owner_slot(&self, row: usize) -> u16 {
        Column::owner_slot(self, row)
    }

    fn swap(&mut self, a: usize, b: usize) {
        Column::swap(self, a, b);
    }

    fn remove_swap(&mut self, row: usize) -> Option<u16> {
        Column::remove_swap(self, row)
    }

    fn clear(&mut self) {
        Column::clear(self);
    }

    fn reset(&mut self) {
        Column::reset(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
