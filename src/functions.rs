//! The three functions under test.
//!
//! Deliberately small pure computations with no shared state. The property
//! checks in `tests/properties.rs` exercise them through the check engine;
//! `tests/proptest_oracle.rs` cross-checks them with an independent
//! harness.

use std::collections::HashMap;

/// Arithmetic sum. Callers draw inputs narrow enough that the sum cannot
/// overflow; no overflow handling is provided here.
pub fn add(a: i64, b: i64) -> i64 {
    a + b
}

/// Returns the element occurring strictly more than half the sequence
/// length times, or the sentinel `-1` when no such element exists.
///
/// The sentinel collides with a genuine majority of `-1` values; callers
/// cannot tell the two apart. Kept as-is to preserve the reference
/// behavior.
pub fn find_majority(values: &[i64]) -> i64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    // At most one value can hold a strict majority, so map iteration order
    // does not affect the result.
    for (value, count) in counts {
        if 2 * count > values.len() {
            return value;
        }
    }
    -1
}

/// Number of `'1'` digits in the decimal form of `value`. The minus sign
/// of a negative number is not a digit and is never counted.
pub fn decimal_ones(value: i64) -> usize {
    value.to_string().chars().filter(|&c| c == '1').count()
}

/// Keeps, in input order, the elements whose decimal representation
/// contains fewer than three `'1'` digits.
pub fn remove_triple_one_plus_strings(values: &[i64]) -> Vec<i64> {
    values
        .iter()
        .copied()
        .filter(|&value| decimal_ones(value) < 3)
        .collect()
}
