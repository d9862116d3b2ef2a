//! Interpolator idempotence invariant (spec §8): calling `next(ts)` twice
//! with the same timestamp, without an intervening call at a different
//! timestamp, returns the same value both times.

use proptest::prelude::*;
use ts_query_core::error::CoreResult;
use ts_query_core::interpolate::{FillPolicy, FillWithRealPolicy, ReadAheadNumericInterpolator};
use ts_query_core::iterator::PullIterator;
use ts_query_core::timestamp::TimeStamp;
use ts_query_core::types::Numeric;

struct VecSource {
    points: Vec<(TimeStamp, Numeric)>,
    idx: usize,
    current: (TimeStamp, Numeric),
}

impl VecSource {
    fn new(points: Vec<i64>) -> Self {
        VecSource {
            points: points
                .into_iter()
                .map(|sec| (TimeStamp::new(sec, 0), Numeric::Long(sec)))
                .collect(),
            idx: 0,
            current: (TimeStamp::new(0, 0), Numeric::Long(0)),
        }
    }
}

impl PullIterator for VecSource {
    type Item = (TimeStamp, Numeric);

    fn has_next(&mut self) -> bool {
        self.idx < self.points.len()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        if self.idx >= self.points.len() {
            return Ok(None);
        }
        self.current = self.points[self.idx].clone();
        self.idx += 1;
        Ok(Some(&self.current))
    }
}

fn arb_fill_policy() -> impl Strategy<Value = FillPolicy> {
    prop_oneof![
        Just(FillPolicy::None),
        Just(FillPolicy::Null),
        Just(FillPolicy::Nan),
        Just(FillPolicy::Zero),
        Just(FillPolicy::Min),
        Just(FillPolicy::Max),
    ]
}

fn arb_real_policy() -> impl Strategy<Value = FillWithRealPolicy> {
    prop_oneof![
        Just(FillWithRealPolicy::None),
        Just(FillWithRealPolicy::PreviousOnly),
        Just(FillWithRealPolicy::NextOnly),
        Just(FillWithRealPolicy::PreferPrevious),
        Just(FillWithRealPolicy::PreferNext),
    ]
}

proptest! {
    #[test]
    fn repeated_query_at_same_timestamp_is_stable(
        mut points in prop::collection::vec(0i64..1000, 0..10),
        query_sec in 0i64..1000,
        fill in arb_fill_policy(),
        real in arb_real_policy(),
    ) {
        points.sort_unstable();
        points.dedup();
        let source = VecSource::new(points);
        let mut interp = ReadAheadNumericInterpolator::new(source, fill, real);

        let ts = TimeStamp::new(query_sec, 0);
        let first = interp.next(&ts).unwrap();
        let second = interp.next(&ts).unwrap();
        prop_assert_eq!(
            first.map(|v| v.to_f64().to_bits()),
            second.map(|v| v.to_f64().to_bits())
        );
    }
}
