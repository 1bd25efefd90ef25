//! Independent cross-check of the functions under test with proptest, so
//! their contracts do not rest solely on the in-crate harness.

use minicheck::{add, decimal_ones, find_majority, remove_triple_one_plus_strings};
use proptest::prelude::*;

proptest! {
    #[test]
    fn add_matches_widened_sum(a in -1_000_000_000i64..=1_000_000_000, b in -1_000_000_000i64..=1_000_000_000) {
        prop_assert_eq!(i128::from(add(a, b)), i128::from(a) + i128::from(b));
    }

    #[test]
    fn majority_result_is_sound(values in proptest::collection::vec(1i64..10, 0..32)) {
        let result = find_majority(&values);
        if result != -1 {
            let occurrences = values.iter().filter(|&&v| v == result).count();
            prop_assert!(2 * occurrences > values.len());
        }
    }

    #[test]
    fn filter_keeps_only_sub_triple_ones(values in proptest::collection::vec(-10_000i64..=10_000, 0..16)) {
        let kept = remove_triple_one_plus_strings(&values);
        prop_assert!(kept.iter().all(|&v| decimal_ones(v) < 3));
        prop_assert!(values.iter().filter(|&&v| decimal_ones(v) < 3).eq(kept.iter()));
        prop_assert_eq!(remove_triple_one_plus_strings(&kept), kept.clone());
    }
}
