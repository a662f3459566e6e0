//! Entity handles.
//!
//! A [`Handle`] is a 32-bit reference to a logical entity: a 16-bit slot
//! index plus a 16-bit generation counter. Slots are reused; generations
//! are not. When a slot is recycled its generation has been bumped, so
//! handles minted for the previous occupant no longer compare equal and
//! can be rejected in O(1) without a lookup.

use std::fmt;

/// A 32-bit entity reference: slot index plus generation counter.
///
/// The all-zero value is the null sentinel ([`Handle::NULL`]), which is
/// also the `Default`. Two handles are equal iff both fields match, and
/// the derived `Hash` covers both fields, so a reused slot with a new
/// generation hashes differently from its predecessor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    slot: u16,
    generation: u16,
}

impl Handle {
    /// The null handle. Never refers to a live entity.
    pub const NULL: Handle = Handle {
        slot: 0,
        generation: 0,
    };

    /// Create a handle from raw parts.
    pub const fn new(slot: u16, generation: u16) -> Self {
        Self { slot, generation }
    }

    /// The slot index.
    pub const fn slot(self) -> u16 {
        self.slot
    }

    /// The generation counter.
    pub const fn generation(self) -> u16 {
        self.generation
    }

    /// Whether this is the null sentinel.
    pub const fn is_null(self) -> bool {
        self.slot == 0 && self.generation == 0
    }

    /// Pack into a single `u32`: generation in the high half, slot in the
    /// low half.
    pub const fn to_bits(self) -> u32 {
        (self.generation as u32) << 16 | self.slot as u32
    }

    /// Unpack a handle previously packed with [`Handle::to_bits`].
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            slot: bits as u16,
            generation: (bits >> 16) as u16,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle(slot={}, gen={})", self.slot, self.generation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(h: Handle) -> u64 {
        let mut hasher = DefaultHasher::new();
        h.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn default_is_null() {
        assert_eq!(Handle::default(), Handle::NULL);
        assert!(Handle::NULL.is_null());
    }

    #[test]
    fn nonzero_generation_is_not_null() {
        // Slot 0 is a real slot; only the all-zero value is the sentinel.
        assert!(!Handle::new(0, 1).is_null());
        assert!(!Handle::new(1, 0).is_null());
    }

    #[test]
    fn equality_covers_both_fields() {
        assert_eq!(Handle::new(3, 7), Handle::new(3, 7));
        assert_ne!(Handle::new(3, 7), Handle::new(3, 8));
        assert_ne!(Handle::new(4, 7), Handle::new(3, 7));
    }

    #[test]
    fn reused_slot_hashes_differently() {
        assert_ne!(hash_of(Handle::new(5, 1)), hash_of(Handle::new(5, 2)));
    }

    #[test]
    fn bits_round_trip() {
        let h = Handle::new(0x1234, 0xbeef);
        assert_eq!(Handle::from_bits(h.to_bits()), h);
        assert_eq!(h.to_bits(), 0xbeef_1234);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Handle::NULL.to_string(), "Handle(null)");
        assert_eq!(Handle::new(2, 9).to_string(), "Handle(slot=2, gen=9)");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bits_round_trip_any(slot in any::<u16>(), generation in any::<u16>()) {
                let h = Handle::new(slot, generation);
                prop_assert_eq!(Handle::from_bits(h.to_bits()), h);
            }

            #[test]
            fn distinct_fields_distinct_bits(a in any::<u32>(), b in any::<u32>()) {
                prop_assert_eq!(
                    Handle::from_bits(a) == Handle::from_bits(b),
                    a == b
                );
            }
        }
    }
}
