//! Filter monotonicity invariant (spec §8): for a pure conjunctive,
//! `Not`-free filter tree, a tag map that is a superset of another's keys
//! and agrees on the original values still matches whatever the subset
//! matched.

use std::collections::BTreeSet;

use proptest::prelude::*;
use ts_query_core::filter::{matches_tags, ChainOp, Filter};
use ts_query_core::types::TagMap;

fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn arb_extra_tags() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        ("[a-z]{1,5}", "[a-z]{1,5}").prop_map(|(k, v)| (k, v)),
        0..5,
    )
}

proptest! {
    #[test]
    fn superset_of_matching_tags_still_matches(extra in arb_extra_tags()) {
        let filter = Filter::Chain(
            ChainOp::And,
            vec![
                Filter::TagValueLiteralOr {
                    key: "host".into(),
                    values: ["web01".to_string()].into_iter().collect(),
                },
                Filter::TagValueLiteralOr {
                    key: "owner".into(),
                    values: ["tyrion".to_string()].into_iter().collect(),
                },
            ],
        );

        let base = tags(&[("host", "web01"), ("owner", "tyrion")]);
        let mut matched = BTreeSet::new();
        prop_assert!(matches_tags(&filter, &base, &mut matched));

        let mut superset = base.clone();
        for (k, v) in extra {
            if k != "host" && k != "owner" {
                superset.insert(k, v);
            }
        }
        let mut matched2 = BTreeSet::new();
        prop_assert!(matches_tags(&filter, &superset, &mut matched2));
    }
}
