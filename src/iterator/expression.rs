//! Expression processor (spec §4.6 "Expression"): binary and ternary
//! arithmetic/relational/logical combination of two (or three) operand
//! streams, scalar or per-summary.

use crate::config::ExpressionOp;
use crate::error::CoreResult;
use crate::interpolate::ReadAheadNumericInterpolator;
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;
use crate::types::{Numeric, NumericSummary};

fn apply(op: ExpressionOp, a: f64, b: f64) -> f64 {
    use ExpressionOp::*;
    match op {
        And => bool_to_f64(a != 0.0 && b != 0.0),
        Or => bool_to_f64(a != 0.0 || b != 0.0),
        Eq => bool_to_f64(a == b),
        Ne => bool_to_f64(a != b),
        Lt => bool_to_f64(a < b),
        Le => bool_to_f64(a <= b),
        Gt => bool_to_f64(a > b),
        Ge => bool_to_f64(a >= b),
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => {
            if b == 0.0 {
                f64::NAN
            } else {
                a / b
            }
        }
        Mod => {
            if b == 0.0 {
                f64::NAN
            } else {
                a % b
            }
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Resolve a (possibly-NaN) operand pair per `infectious_nan` (spec §4.6
/// "infectious_nan config propagates NaN; else NaN operand yields the
/// other side's value for arithmetic").
fn resolve_nan(op: ExpressionOp, a: f64, b: f64, infectious_nan: bool) -> Option<f64> {
    let a_nan = a.is_nan();
    let b_nan = b.is_nan();
    if !a_nan && !b_nan {
        return None;
    }
    if infectious_nan {
        return Some(f64::NAN);
    }
    if op.is_relational() || op.is_logical() {
        return Some(f64::NAN);
    }
    // Arithmetic: the non-NaN side passes through.
    Some(if a_nan { b } else { a })
}

/// Binary scalar expression over two numeric sources, each fed through its
/// own interpolator so both sides can be read at a common timestamp (spec
/// §4.6 "pull the minimum next_real across operands, feed both through
/// interpolators at that timestamp, apply op; advance each whose next_real
/// equals the chosen timestamp").
pub struct BinaryExpressionIterator<L, R> {
    left: ReadAheadNumericInterpolator<L>,
    right: ReadAheadNumericInterpolator<R>,
    op: ExpressionOp,
    infectious_nan: bool,
    current: Option<(TimeStamp, Numeric)>,
}

impl<L, R> BinaryExpressionIterator<L, R>
where
    L: PullIterator<Item = (TimeStamp, Numeric)>,
    R: PullIterator<Item = (TimeStamp, Numeric)>,
{
    pub fn new(
        left: ReadAheadNumericInterpolator<L>,
        right: ReadAheadNumericInterpolator<R>,
        op: ExpressionOp,
        infectious_nan: bool,
    ) -> Self {
        BinaryExpressionIterator {
            left,
            right,
            op,
            infectious_nan,
            current: None,
        }
    }

    fn next_timestamp(&mut self) -> CoreResult<Option<TimeStamp>> {
        let l = self.left.next_real()?;
        let r = self.right.next_real()?;
        Ok(match (l, r) {
            (Some(a), Some(b)) => Some(if a <= b { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        })
    }
}

impl<L, R> PullIterator for BinaryExpressionIterator<L, R>
where
    L: PullIterator<Item = (TimeStamp, Numeric)>,
    R: PullIterator<Item = (TimeStamp, Numeric)>,
{
    type Item = (TimeStamp, Numeric);

    fn has_next(&mut self) -> bool {
        matches!(self.next_timestamp(), Ok(Some(_)))
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        let Some(ts) = self.next_timestamp()? else {
            self.current = None;
            return Ok(None);
        };
        let a = self.left.next(&ts)?.map(|v| v.to_f64());
        let b = self.right.next(&ts)?.map(|v| v.to_f64());
        let (a, b) = (a.unwrap_or(f64::NAN), b.unwrap_or(f64::NAN));

        let value = match resolve_nan(self.op, a, b, self.infectious_nan) {
            Some(v) => v,
            None => apply(self.op, a, b),
        };
        self.current = Some((ts, Numeric::Double(value)));
        Ok(self.current.as_ref())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }
}

/// Ternary `cond ? a : b` (spec §4.6 "Ternary"). `cond_threshold` defaults
/// to "non-zero, non-NaN is true".
pub struct TernaryExpressionIterator<C, A, B> {
    cond: ReadAheadNumericInterpolator<C>,
    a: ReadAheadNumericInterpolator<A>,
    b: ReadAheadNumericInterpolator<B>,
    cond_threshold: f64,
    current: Option<(TimeStamp, Numeric)>,
}

impl<C, A, B> TernaryExpressionIterator<C, A, B>
where
    C: PullIterator<Item = (TimeStamp, Numeric)>,
    A: PullIterator<Item = (TimeStamp, Numeric)>,
    B: PullIterator<Item = (TimeStamp, Numeric)>,
{
    pub fn new(
        cond: ReadAheadNumericInterpolator<C>,
        a: ReadAheadNumericInterpolator<A>,
        b: ReadAheadNumericInterpolator<B>,
        cond_threshold: f64,
    ) -> Self {
        TernaryExpressionIterator {
            cond,
            a,
            b,
            cond_threshold,
            current: None,
        }
    }

    fn next_timestamp(&mut self) -> CoreResult<Option<TimeStamp>> {
        let times = [self.cond.next_real()?, self.a.next_real()?, self.b.next_real()?];
        Ok(times.into_iter().flatten().min())
    }
}

impl<C, A, B> PullIterator for TernaryExpressionIterator<C, A, B>
where
    C: PullIterator<Item = (TimeStamp, Numeric)>,
    A: PullIterator<Item = (TimeStamp, Numeric)>,
    B: PullIterator<Item = (TimeStamp, Numeric)>,
{
    type Item = (TimeStamp, Numeric);

    fn has_next(&mut self) -> bool {
        matches!(self.next_timestamp(), Ok(Some(_)))
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        let Some(ts) = self.next_timestamp()? else {
            self.current = None;
            return Ok(None);
        };
        let cond = self.cond.next(&ts)?.map(|v| v.to_f64()).unwrap_or(f64::NAN);
        let a = self.a.next(&ts)?.map(|v| v.to_f64()).unwrap_or(f64::NAN);
        let b = self.b.next(&ts)?.map(|v| v.to_f64()).unwrap_or(f64::NAN);

        let is_true = !cond.is_nan() && cond >= self.cond_threshold && cond != 0.0;
        let value = if is_true { a } else { b };
        self.current = Some((ts, Numeric::Double(value)));
        Ok(self.current.as_ref())
    }

    fn close(&mut self) {
        self.cond.close();
        self.a.close();
        self.b.close();
    }
}

/// Binary summary expression: unions `summaries_available` from both
/// sides and applies `op` per summary id (spec §4.6, §8 "Expression
/// per-summary").
pub struct SummaryExpressionIterator<L, R> {
    left: L,
    right: R,
    left_peek: Option<(TimeStamp, NumericSummary)>,
    right_peek: Option<(TimeStamp, NumericSummary)>,
    op: ExpressionOp,
    infectious_nan: bool,
    current: Option<(TimeStamp, NumericSummary)>,
}

impl<L, R> SummaryExpressionIterator<L, R>
where
    L: PullIterator<Item = (TimeStamp, NumericSummary)>,
    R: PullIterator<Item = (TimeStamp, NumericSummary)>,
{
    pub fn new(left: L, right: R, op: ExpressionOp, infectious_nan: bool) -> Self {
        SummaryExpressionIterator {
            left,
            right,
            left_peek: None,
            right_peek: None,
            op,
            infectious_nan,
            current: None,
        }
    }

    fn fill(&mut self) -> CoreResult<()> {
        if self.left_peek.is_none() && self.left.has_next() {
            self.left_peek = self.left.next()?.map(|(ts, s)| (ts.copy_out(), s.clone()));
        }
        if self.right_peek.is_none() && self.right.has_next() {
            self.right_peek = self.right.next()?.map(|(ts, s)| (ts.copy_out(), s.clone()));
        }
        Ok(())
    }
}

impl<L, R> PullIterator for SummaryExpressionIterator<L, R>
where
    L: PullIterator<Item = (TimeStamp, NumericSummary)>,
    R: PullIterator<Item = (TimeStamp, NumericSummary)>,
{
    type Item = (TimeStamp, NumericSummary);

    fn has_next(&mut self) -> bool {
        self.fill().is_ok() && (self.left_peek.is_some() || self.right_peek.is_some())
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        self.fill()?;
        let ts = match (&self.left_peek, &self.right_peek) {
            (Some((a, _)), Some((b, _))) => {
                if a <= b {
                    a.copy_out()
                } else {
                    b.copy_out()
                }
            }
            (Some((a, _)), None) => a.copy_out(),
            (None, Some((b, _))) => b.copy_out(),
            (None, None) => {
                self.current = None;
                return Ok(None);
            }
        };

        let left_summary = match &self.left_peek {
            Some((t, s)) if *t == ts => {
                let s = s.clone();
                self.left_peek = None;
                Some(s)
            }
            _ => None,
        };
        let right_summary = match &self.right_peek {
            Some((t, s)) if *t == ts => {
                let s = s.clone();
                self.right_peek = None;
                Some(s)
            }
            _ => None,
        };

        let mut ids: Vec<i32> = Vec::new();
        if let Some(s) = &left_summary {
            ids.extend(s.summaries_available());
        }
        if let Some(s) = &right_summary {
            ids.extend(s.summaries_available());
        }
        ids.sort_unstable();
        ids.dedup();

        let mut out = NumericSummary::new();
        for id in ids {
            let a = left_summary.as_ref().and_then(|s| s.get(id)).map(|v| v.to_f64()).unwrap_or(f64::NAN);
            let b = right_summary.as_ref().and_then(|s| s.get(id)).map(|v| v.to_f64()).unwrap_or(f64::NAN);
            let value = match resolve_nan(self.op, a, b, self.infectious_nan) {
                Some(v) => v,
                None => apply(self.op, a, b),
            };
            out.set(id, Numeric::Double(value));
        }

        self.current = Some((ts, out));
        Ok(self.current.as_ref())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolate::{FillPolicy, FillWithRealPolicy};

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

    fn interp(points: Vec<(i64, i64)>) -> ReadAheadNumericInterpolator<VecSource> {
        ReadAheadNumericInterpolator::new(VecSource::new(points), FillPolicy::Nan, FillWithRealPolicy::None)
    }

    #[test]
    fn add_aligns_both_sides_at_common_timestamps() {
        let left = interp(vec![(10, 2), (20, 4)]);
        let right = interp(vec![(10, 3), (20, 5)]);
        let mut expr = BinaryExpressionIterator::new(left, right, ExpressionOp::Add, false);

        let (ts1, v1) = expr.next().unwrap().unwrap().clone();
        assert_eq!(ts1.epoch_sec, 10);
        assert_eq!(v1, Numeric::Double(5.0));

        let (ts2, v2) = expr.next().unwrap().unwrap().clone();
        assert_eq!(ts2.epoch_sec, 20);
        assert_eq!(v2, Numeric::Double(9.0));
    }

    #[test]
    fn div_by_zero_is_nan() {
        let left = interp(vec![(10, 4)]);
        let right = interp(vec![(10, 0)]);
        let mut expr = BinaryExpressionIterator::new(left, right, ExpressionOp::Div, false);
        let (_, v) = expr.next().unwrap().unwrap().clone();
        assert!(matches!(v, Numeric::Double(d) if d.is_nan()));
    }

    #[test]
    fn non_infectious_nan_passes_through_other_side() {
        let left = interp(vec![(10, 4)]);
        let right = interp(vec![]); // empty source -> NaN fill on every pull
        let mut expr = BinaryExpressionIterator::new(left, right, ExpressionOp::Add, false);
        let (_, v) = expr.next().unwrap().unwrap().clone();
        assert_eq!(v, Numeric::Double(4.0));
    }
}
