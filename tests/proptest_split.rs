use std::collections::BTreeSet;

use proptest::prelude::*;
use rotolabel::split::{partition, SplitRatios};

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}", 0..200)
        .prop_map(|set| set.into_iter().collect())
}

/// A ratio triple that sums to 1.0 by construction.
fn arb_ratios() -> impl Strategy<Value = SplitRatios> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(a, b)| {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        SplitRatios {
            train: lo,
            val: hi - lo,
            test: 1.0 - hi,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn subsets_cover_input_exactly(names in arb_names(), ratios in arb_ratios()) {
        let split = partition(&names, &ratios).expect("partition");
        prop_assert_eq!(split.len(), names.len());

        let all: BTreeSet<&String> = split
            .train
            .iter()
            .chain(&split.val)
            .chain(&split.test)
            .collect();
        let expected: BTreeSet<&String> = names.iter().collect();
        prop_assert_eq!(all, expected);
    }

    #[test]
    fn subsets_are_disjoint(names in arb_names(), ratios in arb_ratios()) {
        let split = partition(&names, &ratios).expect("partition");

        let train: BTreeSet<&String> = split.train.iter().collect();
        let val: BTreeSet<&String> = split.val.iter().collect();
        let test: BTreeSet<&String> = split.test.iter().collect();

        prop_assert!(train.is_disjoint(&val));
        prop_assert!(train.is_disjoint(&test));
        prop_assert!(val.is_disjoint(&test));
    }

    #[test]
    fn partition_is_order_independent(mut names in arb_names(), ratios in arb_ratios()) {
        let forward = partition(&names, &ratios).expect("partition");
        names.reverse();
        let backward = partition(&names, &ratios).expect("partition");

        prop_assert_eq!(forward.train, backward.train);
        prop_assert_eq!(forward.val, backward.val);
        prop_assert_eq!(forward.test, backward.test);
    }

    #[test]
    fn train_and_val_counts_are_floored(names in arb_names(), ratios in arb_ratios()) {
        let n = names.len();
        let split = partition(&names, &ratios).expect("partition");

        prop_assert_eq!(split.train.len(), (n as f64 * ratios.train).floor() as usize);
        prop_assert_eq!(split.val.len(), (n as f64 * ratios.val).floor() as usize);
    }
}
