//! Per-component-type interfaces.
//!
//! An [`Interface`] bundles everything the world knows about one
//! registered component type: its relational flag, its column, its index
//! table, and the lifecycle callback lists. Columns and tables sit behind
//! `RefCell` — overlapping access (say, adding a component from a callback
//! that is iterating the same column) panics instead of corrupting rows;
//! deferred destruction through `mark_remove` is the supported pattern.
//!
//! The relational rebuild lives here too: relational columns keep their
//! physical row order a topological order of the handle forest, so a
//! parent's row never follows a child's.

use std::any::Any;
use std::cell::RefCell;

use smallvec::SmallVec;
use sylva_arena::HandleForest;
use sylva_core::Handle;
use sylva_storage::{Column, IndexTable};

/// Callback invoked after a component row is created.
pub type CreateFn<C> = Box<dyn FnMut(Handle, &mut C)>;

/// Callback invoked before a component row is destroyed.
pub type DestroyFn<C> = Box<dyn FnMut(&mut C)>;

/// Everything the world tracks for one registered component type.
pub struct Interface<C: 'static> {
    pub(crate) relational: bool,
    pub(crate) column: RefCell<Column<C>>,
    pub(crate) index: RefCell<Box<dyn IndexTable>>,
    pub(crate) on_create: RefCell<Vec<CreateFn<C>>>,
    pub(crate) on_destroy: RefCell<Vec<DestroyFn<C>>>,
}

impl<C: 'static> Interface<C> {
    pub(crate) fn new(relational: bool, column: Column<C>, index: Box<dyn IndexTable>) -> Self {
        Self {
            relational,
            column: RefCell::new(column),
            index: RefCell::new(index),
            on_create: RefCell::new(Vec::new()),
            on_destroy: RefCell::new(Vec::new()),
        }
    }

    /// The row of `h`, if it carries this component.
    pub(crate) fn row_of(&self, h: Handle) -> Option<usize> {
        self.index.borrow().get(h)
    }

    /// Insert a row for `h` at the storage tail.
    pub(crate) fn push_row(&self, h: Handle, value: C) {
        {
            let col = self.column.borrow();
            self.index.borrow_mut().insert(h, &*col);
        }
        self.column.borrow_mut().push(h, value);
    }

    /// Fire on-create callbacks for `h`'s row.
    pub(crate) fn run_create(&self, h: Handle) {
        let mut callbacks = self.on_create.borrow_mut();
        if callbacks.is_empty() {
            return;
        }
        let Some(row) = self.row_of(h) else { return };
        let mut col = self.column.borrow_mut();
        for cb in callbacks.iter_mut() {
            cb(h, &mut col[row]);
        }
    }

    /// Fire on-destroy callbacks for a row.
    pub(crate) fn destroy_row(&self, row: usize) {
        let mut callbacks = self.on_destroy.borrow_mut();
        if callbacks.is_empty() {
            return;
        }
        let mut col = self.column.borrow_mut();
        for cb in callbacks.iter_mut() {
            cb(&mut col[row]);
        }
    }

    /// Swap the rows of two handles in both the table and the column.
    pub(crate) fn swap_handles(&self, a: Handle, b: Handle) {
        self.index
            .borrow_mut()
            .swap(a, b, &mut *self.column.borrow_mut());
    }

    /// Swap-remove `h`'s row, returning the vacated row.
    pub(crate) fn remove_row_of(&self, h: Handle) -> Option<usize> {
        self.index
            .borrow_mut()
            .remove_swap(h, &mut *self.column.borrow_mut())
    }

    /// Swap-remove by row, returning the vacated row.
    pub(crate) fn remove_row_at(&self, row: usize) -> Option<usize> {
        self.index
            .borrow_mut()
            .remove_swap_at(row, &mut *self.column.borrow_mut())
    }

    /// Restore the relational order after a swap-removal filled `start`
    /// with the previous tail row.
    ///
    /// The moved-in owner's row shrank, so it may now precede its parent.
    /// Walk upward: while the owner at `start` sits above its parent's
    /// row, swap the two rows; the same index then holds the parent, and
    /// the check repeats against the grandparent.
    pub(crate) fn rebuild_from(&self, forest: &HandleForest, start: usize) {
        let row = start;
        loop {
            let h = {
                let col = self.column.borrow();
                if row >= col.len() {
                    return;
                }
                forest.handle_at(col.owner_slot(row))
            };
            let p = forest.parent(h);
            if p.is_null() {
                return;
            }
            let Some(parent_row) = self.row_of(p) else {
                return;
            };
            if row < parent_row {
                self.swap_handles(h, p);
            } else {
                return;
            }
        }
    }

    /// Restore the relational order around `h` after it was attached (or
    /// after its subtree's rows may have moved).
    ///
    /// If `h`'s row precedes its parent's, the two rows swap. The parent
    /// then occupies a smaller row and is re-checked against its own
    /// parent; `h` occupies a larger row, so each of its children is
    /// re-checked against it.
    pub(crate) fn attach_rebuild(&self, forest: &HandleForest, h: Handle) {
        let Some(h_row) = self.row_of(h) else { return };
        let p = forest.parent(h);
        if p.is_null() {
            return;
        }
        let Some(parent_row) = self.row_of(p) else {
            return;
        };
        if h_row >= parent_row {
            return;
        }
        self.swap_handles(h, p);
        self.attach_rebuild(forest, p);
        let mut kids: SmallVec<[Handle; 8]> = SmallVec::new();
        let mut c = forest.first_child(h);
        while !c.is_null() {
            kids.push(c);
            c = forest.next_sibling(c);
        }
        for c in kids {
            self.attach_rebuild(forest, c);
        }
    }
}

/// The type-erased face of an [`Interface`], held by the registry.
pub(crate) trait ErasedInterface: Any {
    /// Whether row order must respect the forest.
    fn is_relational(&self) -> bool;

    /// Number of live rows.
    fn len(&self) -> usize;

    /// Whether `h` carries this component.
    fn contains(&self, h: Handle) -> bool;

    /// Destroy `h`'s row, if any: on-destroy callbacks, swap-removal,
    /// relational rebuild. Silent no-op when `h` has no row.
    fn remove_entity(&self, forest: &HandleForest, h: Handle);

    /// Restore the relational order around a freshly attached handle.
    fn rebuild_after_attach(&self, forest: &HandleForest, h: Handle);

    /// Run on-destroy callbacks for every row, then empty the column and
    /// the table.
    fn clear_with_callbacks(&self);

    /// Drop callbacks and release buffers. Teardown only: no callbacks
    /// fire.
    fn teardown(&self);
}

impl<C: 'static> ErasedInterface for Interface<C> {
    fn is_relational(&self) -> bool {
        self.relational
    }

    fn len(&self) -> usize {
        self.column.borrow().len()
    }

    fn contains(&self, h: Handle) -> bool {
        self.row_of(h).is_some()
    }

    fn remove_entity(&self, forest: &HandleForest, h: Handle) {
        let Some(row) = self.row_of(h) else { return };
        self.destroy_row(row);
        let vacated = self.remove_row_of(h);
        if self.relational {
            if let Some(r) = vacated {
                self.rebuild_from(forest, r);
            }
        }
    }

    fn rebuild_after_attach(&self, forest: &HandleForest, h: Handle) {
        self.attach_rebuild(forest, h);
    }

    fn clear_with_callbacks(&self) {
        let len = self.column.borrow().len();
        for row in 0..len {
            self.destroy_row(row);
        }
        self.index
            .borrow_mut()
            .clear(&mut *self.column.borrow_mut());
    }

    fn teardown(&self) {
        self.on_create.borrow_mut().clear();
        self.on_destroy.borrow_mut().clear();
        let mut col = self.column.borrow_mut();
        self.index.borrow_mut().clear(&mut *col);
        col.reset();
    }
}
