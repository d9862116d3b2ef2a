//! Concrete end-to-end scenarios from spec §8, exercised as integration
//! tests against the public API rather than unit tests on internals.

use std::collections::BTreeSet;

use ts_query_core::codec::{decode_point, rollup};
use ts_query_core::codec::qualifier::Flags;
use ts_query_core::filter::{ChainOp, Filter, MatchContext};
use ts_query_core::interpolate::{FillPolicy, FillWithRealPolicy, ReadAheadNumericInterpolator};
use ts_query_core::iterator::merge::{MergeIterator, MergeSource};
use ts_query_core::iterator::rate::RateIterator;
use ts_query_core::iterator::PullIterator;
use ts_query_core::aggregate::Reducer;
use ts_query_core::config::{MergeConfig, MergeMode, RateConfig};
use ts_query_core::timestamp::TimeStamp;
use ts_query_core::types::{Numeric, NumericArray, TagMap};

/// Scenario 1: decode second-res row, base=1514764800, data=[0x00,0x00,0x2A].
#[test]
fn scenario_1_decode_second_res_row() {
    let data = [0x00u8, 0x00, 0x2A];
    let point = decode_point(&data, 0).unwrap();
    assert_eq!(point.offset_ns, 0);
    assert_eq!(point.value, Numeric::Long(42));

    let base = 1_514_764_800i64;
    let absolute = base + point.offset_ns / 1_000_000_000;
    assert_eq!(absolute, 1_514_764_800);
}

/// Scenario 2: rollup offset. interval=1h, slots=24, base=1514764800,
/// t=base+3600 -> slot_index=1, qualifier=[agg_id, 0x00, 0x10].
#[test]
fn scenario_2_rollup_offset() {
    let interval = rollup::RollupInterval::new(3600, 24);
    let base = 1_514_764_800i64;
    let t = base + 3600;
    let slot = interval.slot_index(base, t).unwrap();
    assert_eq!(slot, 1);

    let mut buf = Vec::new();
    let agg_id = 5u8;
    rollup::encode_numeric(agg_id, slot, Flags { is_float: false, value_len: 1 }, &mut buf);
    assert_eq!(buf, vec![5, 0x00, 0x10]);
}

/// Scenario 3: explicit tags. tags={host:web01, owner:tyrion},
/// filter=ExplicitTags(AND(host=web01, owner=tyrion)) -> true; add dc=phx
/// -> false.
#[test]
fn scenario_3_explicit_tags() {
    let filter = Filter::ExplicitTags(Box::new(Filter::Chain(
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
    )));

    let tags: TagMap = [("host", "web01"), ("owner", "tyrion")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let ctx = MatchContext { metric: "sys.cpu", tags: &tags };
    let mut matched = BTreeSet::new();
    assert!(ts_query_core::filter::matches(&filter, &ctx, &mut matched));

    let mut tags_with_dc = tags.clone();
    tags_with_dc.insert("dc".to_string(), "phx".to_string());
    let ctx2 = MatchContext { metric: "sys.cpu", tags: &tags_with_dc };
    let mut matched2 = BTreeSet::new();
    assert!(!ts_query_core::filter::matches(&filter, &ctx2, &mut matched2));
}

struct VecSource {
    points: Vec<(TimeStamp, Numeric)>,
    idx: usize,
    current: (TimeStamp, Numeric),
}

impl VecSource {
    fn new(points: Vec<(i64, Numeric)>) -> Self {
        VecSource {
            points: points.into_iter().map(|(sec, v)| (TimeStamp::new(sec, 0), v)).collect(),
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

    fn next(&mut self) -> ts_query_core::CoreResult<Option<&Self::Item>> {
        if self.idx >= self.points.len() {
            return Ok(None);
        }
        self.current = self.points[self.idx].clone();
        self.idx += 1;
        Ok(Some(&self.current))
    }
}

/// Scenario 4: interpolator PREFER_NEXT with NaN fill. source points at
/// t=10 (v=5), t=30 (v=9); next(20) -> NaN (no exact match; NONE real-fill
/// policy falls straight to the scalar NAN fill rather than reaching for a
/// neighbor); next(30) -> 9.
#[test]
fn scenario_4_prefer_next_with_nan_fallback() {
    let source = VecSource::new(vec![(10, Numeric::Long(5)), (30, Numeric::Long(9))]);
    let mut interp = ReadAheadNumericInterpolator::new(source, FillPolicy::Nan, FillWithRealPolicy::None);

    let at20 = interp.next(&TimeStamp::new(20, 0)).unwrap();
    assert!(matches!(at20, Some(Numeric::Double(d)) if d.is_nan()));

    let at30 = interp.next(&TimeStamp::new(30, 0)).unwrap();
    assert_eq!(at30, Some(Numeric::Long(9)));
}

/// Scenario 5: rate array, counter wrap. src=[10,20,5], counter=true,
/// counter_max=100, denom=1 -> [NaN, 10, 85].
#[test]
fn scenario_5_rate_counter_wrap() {
    struct OneShot(Option<(TimeStamp, NumericArray)>, (TimeStamp, NumericArray));
    impl PullIterator for OneShot {
        type Item = (TimeStamp, NumericArray);
        fn has_next(&mut self) -> bool {
            self.0.is_some()
        }
        fn next(&mut self) -> ts_query_core::CoreResult<Option<&Self::Item>> {
            if self.0.take().is_some() {
                Ok(Some(&self.1))
            } else {
                Ok(None)
            }
        }
    }

    let arr = NumericArray::Long { values: vec![10, 20, 5], offset: 0, end: 3 };
    let pair = (TimeStamp::new(0, 0), arr.clone());
    let source = OneShot(Some(pair.clone()), pair);

    let config = RateConfig {
        interval_ns: 1_000_000_000,
        counter: true,
        counter_max: 100,
        reset_value: 0,
        drop_resets: false,
        delta_only: false,
        rate_to_count: false,
        data_interval_ms: 1000,
    };
    let mut rate_iter = RateIterator::new(source, config).unwrap();
    let (_, out) = rate_iter.next().unwrap().unwrap().clone();
    let NumericArray::Double { values, .. } = out else { panic!("expected double array") };
    assert!(values[0].is_nan());
    assert_eq!(values[1], 10.0);
    assert_eq!(values[2], 85.0);
}

/// Scenario 6: HA merge timeout. sources=[A, B]; A publishes nothing;
/// output comes solely from B.
#[test]
fn scenario_6_ha_merge_fallback() {
    let a = MergeSource::new(VecSource::new(vec![]), 50);
    let b = MergeSource::new(VecSource::new(vec![(10, Numeric::Long(1)), (20, Numeric::Long(2))]), 200);
    let config = MergeConfig {
        mode: MergeMode::Ha,
        timeouts_ms: vec![50, 200],
        reducer: Reducer::Sum,
    };
    let mut merge = MergeIterator::new(vec![a, b], config).unwrap();
    let mut out = Vec::new();
    while merge.has_next() {
        let (ts, v) = merge.next().unwrap().unwrap().clone();
        out.push((ts.epoch_sec, v));
    }
    assert_eq!(out, vec![(10, Numeric::Long(1)), (20, Numeric::Long(2))]);
}
