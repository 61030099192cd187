// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// Check if the n-th bit is set.
///
/// Bits are 0-indexed, from the LSB.
pub(crate) fn is_bit_set<B>(value: B, index: usize) -> bool
where
    B: num_traits::PrimInt + num_traits::Unsigned,
{
    (value & (B::one() << index)) > B::zero()
}

/// Replace the bits selected by `mask` in `existing` with the same bits from `new`.
pub(crate) fn merge_masked<B>(existing: B, new: B, mask: B) -> B
where
    B: num_traits::PrimInt + num_traits::Unsigned,
{
    (existing & !mask) | (new & mask)
}
