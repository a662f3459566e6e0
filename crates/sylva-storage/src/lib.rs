//! Component column storage and slot-to-row index tables.
//!
//! A [`Column<C>`] stores one component type as a contiguous array with
//! O(1) insertion and swap-removal; an [`IndexTable`] maps entity slots to
//! rows and keeps the mapping a bijection as rows move.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod column;
pub mod index;

pub use column::{AnyColumn, Column};
pub use index::{FlatIndexTable, HashedIndexTable, IndexTable};
