//! Dedup processor (spec §4.6 "Dedup", `[ADD 4.2a]`): folds duplicate
//! timestamps within a single source's output, implemented as a wrapper
//! rather than a `Span` mutation so storage stays an append-only view.

use crate::config::DedupPolicy;
use crate::error::CoreResult;
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;

/// Wraps any per-type source, skipping duplicate-timestamp points per
/// `policy`. Since the policy only decides *which* of two equal-timestamp
/// points to keep (never both), this is a read-ahead filter, not a
/// combining reducer.
pub struct DedupIterator<S, T> {
    source: S,
    policy: DedupPolicy,
    peek: Option<(TimeStamp, T)>,
    current: Option<(TimeStamp, T)>,
}

impl<S, T> DedupIterator<S, T>
where
    S: PullIterator<Item = (TimeStamp, T)>,
    T: Clone,
{
    pub fn new(source: S, policy: DedupPolicy) -> Self {
        DedupIterator {
            source,
            policy,
            peek: None,
            current: None,
        }
    }

    fn fill_peek(&mut self) -> CoreResult<()> {
        if self.peek.is_none() && self.source.has_next() {
            self.peek = self.source.next()?.map(|(ts, v)| (ts.copy_out(), v.clone()));
        }
        Ok(())
    }
}

impl<S, T> PullIterator for DedupIterator<S, T>
where
    S: PullIterator<Item = (TimeStamp, T)>,
    T: Clone,
{
    type Item = (TimeStamp, T);

    fn has_next(&mut self) -> bool {
        self.peek.is_some() || self.source.has_next()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        self.fill_peek()?;
        let (ts, mut value) = match self.peek.take() {
            Some(pair) => pair,
            None => {
                self.current = None;
                return Ok(None);
            }
        };

        // Absorb any further points that share this timestamp per policy.
        loop {
            self.fill_peek()?;
            match &self.peek {
                Some((pts, _)) if *pts == ts => {
                    let (_, pv) = self.peek.take().unwrap();
                    if self.policy == DedupPolicy::KeepLatest {
                        value = pv;
                    }
                }
                _ => break,
            }
        }

        self.current = Some((ts, value));
        Ok(self.current.as_ref())
    }

    fn close(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Numeric;

    struct VecSource {
        points: Vec<(TimeStamp, Numeric)>,
        idx: usize,
        current: (TimeStamp, Numeric),
    }

    impl VecSource {
        fn new(points: Vec<(i64, i64)>) -> Self {
            VecSource {
                points: points
                    .into_iter()
                    .map(|(sec, v)| (TimeStamp::new(sec, 0), Numeric::Long(v)))
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

    #[test]
    fn keep_earliest_drops_later_duplicate() {
        let source = VecSource::new(vec![(10, 1), (10, 2), (20, 3)]);
        let mut dedup = DedupIterator::new(source, DedupPolicy::KeepEarliest);
        let mut out = Vec::new();
        while dedup.has_next() {
            let (ts, v) = dedup.next().unwrap().unwrap().clone();
            out.push((ts.epoch_sec, v));
        }
        assert_eq!(out, vec![(10, Numeric::Long(1)), (20, Numeric::Long(3))]);
    }

    #[test]
    fn keep_latest_overwrites_with_later_duplicate() {
        let source = VecSource::new(vec![(10, 1), (10, 2)]);
        let mut dedup = DedupIterator::new(source, DedupPolicy::KeepLatest);
        let (_, v) = dedup.next().unwrap().unwrap().clone();
        assert_eq!(v, Numeric::Long(2));
    }
}
