//! Per-type interpolation/fill layer (spec C5, §4.5): aligns a source
//! iterator to a caller-requested timestamp, synthesizing a fill value
//! when the source has no exact point there.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::CoreResult;
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;
use crate::types::{Numeric, NumericSummary};

/// Scalar fill applied when no real value is usable (spec §4.5, §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy {
    None,
    Null,
    Nan,
    Zero,
    Min,
    Max,
    Scalar(f64),
}

impl FillPolicy {
    /// `None`/`Null` both mean "no value emitted".
    fn scalar(&self) -> Option<Numeric> {
        match self {
            FillPolicy::None | FillPolicy::Null => None,
            FillPolicy::Nan => Some(Numeric::Double(f64::NAN)),
            FillPolicy::Zero => Some(Numeric::Long(0)),
            FillPolicy::Min => Some(Numeric::Double(f64::NEG_INFINITY)),
            FillPolicy::Max => Some(Numeric::Double(f64::INFINITY)),
            FillPolicy::Scalar(v) => Some(Numeric::Double(*v)),
        }
    }
}

/// How a real neighbor value is preferred over the scalar fill (spec §4.5,
/// §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillWithRealPolicy {
    None,
    PreviousOnly,
    NextOnly,
    PreferPrevious,
    PreferNext,
}

type TsNumeric = (TimeStamp, Numeric);

/// Read-ahead interpolator over a single numeric source: keeps at most two
/// real points, `prev` and a read-ahead `peek`, surrounding the requested
/// timestamp (spec §4.5, §9 "coroutine-flavored iteration").
///
/// Before the first `next(ts)` call neither slot is populated
/// (`[ADD 4.5a]`); the first call pulls the source at least once.
pub struct ReadAheadNumericInterpolator<S> {
    source: S,
    prev: Option<TsNumeric>,
    peek: Option<TsNumeric>,
    fill_policy: FillPolicy,
    real_policy: FillWithRealPolicy,
}

impl<S> ReadAheadNumericInterpolator<S>
where
    S: PullIterator<Item = TsNumeric>,
{
    pub fn new(source: S, fill_policy: FillPolicy, real_policy: FillWithRealPolicy) -> Self {
        ReadAheadNumericInterpolator {
            source,
            prev: None,
            peek: None,
            fill_policy,
            real_policy,
        }
    }

    fn ensure_peek(&mut self) -> CoreResult<()> {
        if self.peek.is_none() && self.source.has_next() {
            self.peek = self.source.next()?.map(|(ts, v)| (ts.copy_out(), *v));
        }
        Ok(())
    }

    /// Emit a value at `ts`: the exact real point if the read-ahead has
    /// reached one, else the fill computed per `real_policy`/`fill_policy`.
    /// Idempotent for a fixed `ts` (spec §8 "Interpolator idempotence"):
    /// re-calling with the same `ts` before advancing past it returns the
    /// same answer because the read-ahead only advances while `peek.0 < ts`.
    pub fn next(&mut self, ts: &TimeStamp) -> CoreResult<Option<Numeric>> {
        self.ensure_peek()?;
        while let Some((pts, _)) = &self.peek {
            if pts < ts {
                self.prev = self.peek.take();
                self.ensure_peek()?;
            } else {
                break;
            }
        }
        if let Some((pts, pv)) = &self.peek {
            if pts == ts {
                return Ok(Some(*pv));
            }
        }
        let filled = self.fill();
        if filled.is_none() {
            tracing::trace!(epoch_sec = ts.epoch_sec, "interpolator emitted no value (NONE/NULL fill)");
        } else {
            tracing::debug!(epoch_sec = ts.epoch_sec, ?filled, "interpolator emitted fill value");
        }
        Ok(filled)
    }

    fn fill(&self) -> Option<Numeric> {
        let prev_v = self.prev.as_ref().map(|(_, v)| *v);
        let next_v = self.peek.as_ref().map(|(_, v)| *v);
        match self.real_policy {
            FillWithRealPolicy::None => self.fill_policy.scalar(),
            FillWithRealPolicy::PreviousOnly => prev_v.or_else(|| self.fill_policy.scalar()),
            FillWithRealPolicy::NextOnly => next_v.or_else(|| self.fill_policy.scalar()),
            FillWithRealPolicy::PreferPrevious => {
                prev_v.or(next_v).or_else(|| self.fill_policy.scalar())
            }
            FillWithRealPolicy::PreferNext => {
                next_v.or(prev_v).or_else(|| self.fill_policy.scalar())
            }
        }
    }

    /// The timestamp of the next real (non-fill) upstream point, used by
    /// pipelines that pull the minimum `next_real` across several sources
    /// (spec §4.5, §4.6 Expression).
    pub fn next_real(&mut self) -> CoreResult<Option<TimeStamp>> {
        self.ensure_peek()?;
        Ok(self.peek.as_ref().map(|(ts, _)| ts.copy_out()))
    }

    pub fn close(&mut self) {
        self.source.close();
    }
}

/// A cursor over a materialized point list, skipping entries where summary
/// `id` is absent or NaN — the backing source for one
/// [`ReadAheadNumericInterpolator`] in unsynced summary mode (spec §4.5
/// "treat each summary id independently").
pub struct SummaryProjectionCursor {
    points: Rc<Vec<(TimeStamp, NumericSummary)>>,
    id: i32,
    idx: usize,
    current: TsNumeric,
}

impl SummaryProjectionCursor {
    fn new(points: Rc<Vec<(TimeStamp, NumericSummary)>>, id: i32) -> Self {
        SummaryProjectionCursor {
            points,
            id,
            idx: 0,
            current: (TimeStamp::new(0, 0), Numeric::Long(0)),
        }
    }

    fn find_from(&self, start: usize) -> Option<usize> {
        (start..self.points.len()).find(|&i| {
            self.points[i]
                .1
                .get(self.id)
                .map(|v| !v.is_nan())
                .unwrap_or(false)
        })
    }
}

impl PullIterator for SummaryProjectionCursor {
    type Item = TsNumeric;

    fn has_next(&mut self) -> bool {
        self.find_from(self.idx).is_some()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        match self.find_from(self.idx) {
            Some(i) => {
                let (ts, summary) = &self.points[i];
                self.current.0.set(ts.epoch_sec, ts.nanos);
                self.current.1 = summary.get(self.id).expect("filtered for presence above");
                self.idx = i + 1;
                Ok(Some(&self.current))
            }
            None => {
                self.idx = self.points.len();
                Ok(None)
            }
        }
    }
}

/// Filter wrapper used by synced summary mode: passes through only records
/// where every id in `expected` is present with a non-null, non-NaN value
/// (spec §4.5 "Synced").
pub struct SyncedSummaryCursor {
    points: Rc<Vec<(TimeStamp, NumericSummary)>>,
    expected: Vec<i32>,
    idx: usize,
    current: (TimeStamp, NumericSummary),
}

impl SyncedSummaryCursor {
    fn new(points: Rc<Vec<(TimeStamp, NumericSummary)>>, expected: Vec<i32>) -> Self {
        SyncedSummaryCursor {
            points,
            expected,
            idx: 0,
            current: (TimeStamp::new(0, 0), NumericSummary::new()),
        }
    }

    fn satisfies(&self, summary: &NumericSummary) -> bool {
        self.expected
            .iter()
            .all(|id| summary.get(*id).map(|v| !v.is_nan()).unwrap_or(false))
    }

    fn find_from(&self, start: usize) -> Option<usize> {
        (start..self.points.len()).find(|&i| self.satisfies(&self.points[i].1))
    }
}

impl PullIterator for SyncedSummaryCursor {
    type Item = (TimeStamp, NumericSummary);

    fn has_next(&mut self) -> bool {
        self.find_from(self.idx).is_some()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        match self.find_from(self.idx) {
            Some(i) => {
                let (ts, summary) = &self.points[i];
                self.current = (ts.copy_out(), summary.clone());
                self.idx = i + 1;
                Ok(Some(&self.current))
            }
            None => {
                self.idx = self.points.len();
                Ok(None)
            }
        }
    }
}

/// Per-type summary interpolator (spec §4.5). Materializes its source
/// eagerly so each summary id can be read ahead independently in unsynced
/// mode; the planner is expected to bound how much of a series this is
/// asked to cover.
pub enum NumericSummaryInterpolator {
    Unsynced {
        points: Rc<Vec<(TimeStamp, NumericSummary)>>,
        ids: Vec<i32>,
        per_summary: RefCell<BTreeMap<i32, ReadAheadNumericInterpolator<SummaryProjectionCursor>>>,
        fill_policy: FillPolicy,
        real_policy: FillWithRealPolicy,
    },
    Synced {
        cursor: SyncedSummaryCursor,
    },
}

impl NumericSummaryInterpolator {
    pub fn new_unsynced<S>(
        source: S,
        fill_policy: FillPolicy,
        real_policy: FillWithRealPolicy,
    ) -> CoreResult<Self>
    where
        S: PullIterator<Item = (TimeStamp, NumericSummary)>,
    {
        let points = Rc::new(materialize(source)?);
        let mut ids: Vec<i32> = points.iter().flat_map(|(_, s)| s.ids()).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(NumericSummaryInterpolator::Unsynced {
            points,
            ids,
            per_summary: RefCell::new(BTreeMap::new()),
            fill_policy,
            real_policy,
        })
    }

    pub fn new_synced<S>(source: S, expected_summaries: Vec<i32>) -> CoreResult<Self>
    where
        S: PullIterator<Item = (TimeStamp, NumericSummary)>,
    {
        let points = Rc::new(materialize(source)?);
        Ok(NumericSummaryInterpolator::Synced {
            cursor: SyncedSummaryCursor::new(points, expected_summaries),
        })
    }

    /// Unsynced mode: emit a fill-or-real value per known summary id at
    /// `ts`. Synced mode ignores `ts` and advances the filter cursor,
    /// returning `None` once no further record satisfies every expected id
    /// — "emit fill when strictly past the last real point" does not apply
    /// in synced mode since there is no fill, only pass-through
    /// (spec §9 Open Questions, third bullet).
    pub fn next(&mut self, ts: &TimeStamp) -> CoreResult<Option<NumericSummary>> {
        match self {
            NumericSummaryInterpolator::Unsynced {
                points,
                ids,
                per_summary,
                fill_policy,
                real_policy,
            } => {
                let mut out = NumericSummary::new();
                let mut any = false;
                for &id in ids.iter() {
                    let mut table = per_summary.borrow_mut();
                    let interp = table.entry(id).or_insert_with(|| {
                        ReadAheadNumericInterpolator::new(
                            SummaryProjectionCursor::new(Rc::clone(points), id),
                            *fill_policy,
                            *real_policy,
                        )
                    });
                    if let Some(v) = interp.next(ts)? {
                        out.set(id, v);
                        any = true;
                    }
                }
                Ok(any.then_some(out))
            }
            NumericSummaryInterpolator::Synced { cursor } => {
                if cursor.has_next() {
                    let (_, summary) = cursor.next()?.expect("has_next just returned true");
                    Ok(Some(summary.clone()))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

fn materialize<S>(mut source: S) -> CoreResult<Vec<(TimeStamp, NumericSummary)>>
where
    S: PullIterator<Item = (TimeStamp, NumericSummary)>,
{
    let mut out = Vec::new();
    while source.has_next() {
        if let Some((ts, summary)) = source.next()? {
            out.push((ts.copy_out(), summary.clone()));
        }
    }
    out
}
