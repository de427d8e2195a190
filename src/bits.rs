//! Bit helpers for 32-bit actuator bitsets.
//!
//! Every command addresses actuators through a `u32` where bit *n* selects
//! slot *n*.  The pulse scheduler walks that mask from the highest set bit
//! down, so these helpers are the only place bit positions are computed.

/// The type constituting an actuator bitset.
pub type Bitset = u32;

/// Number of addressable bit positions in a [`Bitset`].
pub const BITSET_BIT_COUNT: u8 = Bitset::BITS as u8;

/// Check whether bit `n` is set.  Positions past 31 are never set.
pub const fn is_set(mask: Bitset, n: u8) -> bool {
    if n >= BITSET_BIT_COUNT {
        return false;
    }
    mask & (1 << n) != 0
}

/// Position of the highest set bit, or `None` for an empty mask.
pub const fn highest_bit(mask: Bitset) -> Option<u8> {
    if mask == 0 {
        None
    } else {
        Some((BITSET_BIT_COUNT - 1) - mask.leading_zeros() as u8)
    }
}

/// Clear the highest set bit in place.  No-op on an empty mask.
pub fn clear_highest_bit(mask: &mut Bitset) {
    if let Some(n) = highest_bit(*mask) {
        *mask &= !(1 << n);
    }
}

/// Iterate the set bit positions of `mask` in ascending order.
pub fn set_bits(mask: Bitset) -> impl Iterator<Item = u8> {
    (0..BITSET_BIT_COUNT).filter(move |&n| is_set(mask, n))
}
