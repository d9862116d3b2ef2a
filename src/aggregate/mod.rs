//! Aggregator library (spec C3, §4.3): SIMD-friendly reductions over
//! primitive arrays.
//!
//! `run` never boxes individual elements — it takes a
//! [`NumericValues`] borrow over a caller-owned `&[i64]` or `&[f64]` and
//! writes its answer into a [`MutableNumeric`] out-parameter, mirroring
//! the spec's `run(values, start, end, nan_mode, out: &mut MutableNumeric)`
//! contract so repeated calls (e.g. one per rollup slot) don't allocate.

use crate::error::{CoreError, CoreResult};
use crate::types::Numeric;

/// Borrowed primitive input: the integer/double discriminator is on the
/// slice, not per element (spec §3, §4.3).
#[derive(Debug, Clone, Copy)]
pub enum NumericValues<'a> {
    Longs(&'a [i64]),
    Doubles(&'a [f64]),
}

impl<'a> NumericValues<'a> {
    pub fn len(&self) -> usize {
        match self {
            NumericValues::Longs(v) => v.len(),
            NumericValues::Doubles(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_f64(&self, i: usize) -> f64 {
        match self {
            NumericValues::Longs(v) => v[i] as f64,
            NumericValues::Doubles(v) => v[i],
        }
    }

    fn is_integral(&self) -> bool {
        matches!(self, NumericValues::Longs(_))
    }
}

/// Reusable output slot for a reducer result — avoids allocating a fresh
/// `Numeric` on every call in a hot aggregation loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutableNumeric {
    is_float: bool,
    long_value: i64,
    double_value: f64,
}

impl MutableNumeric {
    pub fn set_long(&mut self, v: i64) {
        self.is_float = false;
        self.long_value = v;
    }

    pub fn set_double(&mut self, v: f64) {
        self.is_float = true;
        self.double_value = v;
    }

    pub fn value(&self) -> Numeric {
        if self.is_float {
            Numeric::Double(self.double_value)
        } else {
            Numeric::Long(self.long_value)
        }
    }
}

/// How NaNs in the input slice are treated (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NanMode {
    /// Ignore NaNs in the input; they do not contribute to the reduction.
    Skip,
    /// If any input is NaN, the result is NaN.
    Infectious,
}

/// Reducer supported by the aggregator library (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reducer {
    Sum,
    Count,
    Avg,
    Min,
    Max,
    First,
    Last,
    /// Percentile expressed in per-mille: `p50` is `Percentile(500)`,
    /// `p999` is `Percentile(999)`.
    Percentile(u16),
}

impl Reducer {
    pub const P50: Reducer = Reducer::Percentile(500);
    pub const P75: Reducer = Reducer::Percentile(750);
    pub const P90: Reducer = Reducer::Percentile(900);
    pub const P95: Reducer = Reducer::Percentile(950);
    pub const P99: Reducer = Reducer::Percentile(990);
    pub const P999: Reducer = Reducer::Percentile(999);
}

/// Run `reducer` over `values[start..end]`, writing the result into `out`.
///
/// Fails with [`CoreError::InvalidInput`] if `end <= start` (spec §4.3
/// `EmptyInputError`).
pub fn run(
    values: NumericValues<'_>,
    start: usize,
    end: usize,
    nan_mode: NanMode,
    reducer: Reducer,
    out: &mut MutableNumeric,
) -> CoreResult<()> {
    if end <= start || end > values.len() {
        return Err(CoreError::invalid_input(format!(
            "empty or out-of-range aggregation window [{start}, {end}) over {} values",
            values.len()
        )));
    }

    let infectious = nan_mode == NanMode::Infectious;
    let mut has_nan = false;
    let filtered: Vec<f64> = (start..end)
        .map(|i| values.get_f64(i))
        .filter(|v| {
            if v.is_nan() {
                has_nan = true;
                false // dropped from the working set either way; infectious short-circuits below
            } else {
                true
            }
        })
        .collect();

    if infectious && has_nan {
        out.set_double(f64::NAN);
        return Ok(());
    }

    match reducer {
        Reducer::Count => {
            out.set_long(filtered.len() as i64);
        }
        Reducer::Sum => {
            let sum: f64 = filtered.iter().sum();
            if values.is_integral() && fits_exact_integer(&filtered, sum) {
                out.set_long(sum as i64);
            } else {
                out.set_double(sum);
            }
        }
        Reducer::Avg => {
            if filtered.is_empty() {
                out.set_double(f64::NAN);
            } else {
                let sum: f64 = filtered.iter().sum();
                out.set_double(sum / filtered.len() as f64);
            }
        }
        Reducer::Min => {
            set_extreme(out, &filtered, values.is_integral(), f64::min);
        }
        Reducer::Max => {
            set_extreme(out, &filtered, values.is_integral(), f64::max);
        }
        Reducer::First => {
            // First/last are defined by index order, not value order — the
            // NaN-skip filter above must not reorder, so index 0 of the
            // *unfiltered* window is what "first" means.
            let v = values.get_f64(start);
            write_scalar(out, v, values.is_integral());
        }
        Reducer::Last => {
            let v = values.get_f64(end - 1);
            write_scalar(out, v, values.is_integral());
        }
        Reducer::Percentile(per_mille) => {
            let p = percentile(&filtered, per_mille);
            out.set_double(p);
        }
    }
    Ok(())
}

fn fits_exact_integer(filtered: &[f64], sum: f64) -> bool {
    !filtered.is_empty() && sum.fract() == 0.0 && sum.abs() < (1i64 << 53) as f64
}

fn write_scalar(out: &mut MutableNumeric, v: f64, integral: bool) {
    if integral && v.fract() == 0.0 {
        out.set_long(v as i64);
    } else {
        out.set_double(v);
    }
}

fn set_extreme(out: &mut MutableNumeric, filtered: &[f64], integral: bool, f: fn(f64, f64) -> f64) {
    if filtered.is_empty() {
        out.set_double(f64::NAN);
        return;
    }
    let v = filtered.iter().copied().fold(filtered[0], f);
    write_scalar(out, v, integral);
}

/// Linear interpolation between closest ranks over a sorted copy of the
/// input (spec `[ADD 4.3a]`).
fn percentile(values: &[f64], per_mille: u16) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let p = per_mille as f64 / 1000.0;
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_longs(values: &[i64], reducer: Reducer, nan_mode: NanMode) -> Numeric {
        let mut out = MutableNumeric::default();
        run(
            NumericValues::Longs(values),
            0,
            values.len(),
            nan_mode,
            reducer,
            &mut out,
        )
        .unwrap();
        out.value()
    }

    #[test]
    fn sum_stable_under_sort() {
        // spec §8 "Aggregator stability": sum/min/max are order-independent.
        let xs = [5i64, 1, 3, 2, 4];
        let mut sorted = xs;
        sorted.sort();
        assert_eq!(
            run_longs(&xs, Reducer::Sum, NanMode::Skip),
            run_longs(&sorted, Reducer::Sum, NanMode::Skip)
        );
        assert_eq!(
            run_longs(&xs, Reducer::Min, NanMode::Skip),
            run_longs(&sorted, Reducer::Min, NanMode::Skip)
        );
        assert_eq!(
            run_longs(&xs, Reducer::Max, NanMode::Skip),
            run_longs(&sorted, Reducer::Max, NanMode::Skip)
        );
    }

    #[test]
    fn first_and_last_depend_on_index_order() {
        let xs = [5i64, 1, 3];
        assert_eq!(run_longs(&xs, Reducer::First, NanMode::Skip), Numeric::Long(5));
        assert_eq!(run_longs(&xs, Reducer::Last, NanMode::Skip), Numeric::Long(3));
    }

    #[test]
    fn count_and_avg() {
        let xs = [2i64, 4, 6];
        assert_eq!(run_longs(&xs, Reducer::Count, NanMode::Skip), Numeric::Long(3));
        assert_eq!(run_longs(&xs, Reducer::Avg, NanMode::Skip), Numeric::Double(4.0));
    }

    #[test]
    fn empty_window_is_an_error() {
        let mut out = MutableNumeric::default();
        let err = run(NumericValues::Longs(&[1, 2, 3]), 2, 2, NanMode::Skip, Reducer::Sum, &mut out)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }

    #[test]
    fn infectious_nan_propagates() {
        let xs = [1.0f64, f64::NAN, 3.0];
        let mut out = MutableNumeric::default();
        run(
            NumericValues::Doubles(&xs),
            0,
            3,
            NanMode::Infectious,
            Reducer::Sum,
            &mut out,
        )
        .unwrap();
        assert!(matches!(out.value(), Numeric::Double(d) if d.is_nan()));
    }

    #[test]
    fn skip_nan_ignores_it() {
        let xs = [1.0f64, f64::NAN, 3.0];
        let mut out = MutableNumeric::default();
        run(NumericValues::Doubles(&xs), 0, 3, NanMode::Skip, Reducer::Sum, &mut out).unwrap();
        assert_eq!(out.value(), Numeric::Double(4.0));
    }

    #[test]
    fn percentile_median_of_odd_count() {
        let xs = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let mut out = MutableNumeric::default();
        run(NumericValues::Doubles(&xs), 0, 5, NanMode::Skip, Reducer::P50, &mut out).unwrap();
        assert_eq!(out.value(), Numeric::Double(3.0));
    }
}
