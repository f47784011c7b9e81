//! Masked-equality matching.
//!
//! One primitive serves two users: device-id classification
//! (`id & mask == target` for any target in a group) and flag containment
//! for format features and sample counts (`actual & required == required`).

use std::borrow::Borrow;

/// True iff `value & mask` equals any of `targets`.
pub fn matches_any<I>(value: u64, mask: u64, targets: I) -> bool
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<u64>,
{
    let masked = value & mask;
    targets.into_iter().any(|t| *t.borrow() == masked)
}

/// True iff every bit of `required` is set in `actual`. Extra bits are ignored.
pub fn has_all_bits(actual: u64, required: u64) -> bool {
    matches_any(actual, required, [required])
}
