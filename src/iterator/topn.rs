//! Top-N processor (spec §4.6 "Top-N"): reduces each series to a scalar
//! and keeps the top (or bottom) `count` by that scalar.
//!
//! Unlike the other processors in this module, Top-N is a *selection*
//! over a batch of already-reduced series rather than a pull-driven
//! per-point transform, so it is a plain function rather than a
//! [`crate::iterator::PullIterator`] impl.

use crate::aggregate::{self, MutableNumeric, NanMode, NumericValues, Reducer};
use crate::config::TopNConfig;
use crate::error::CoreResult;

/// One series' full numeric history, as a contiguous slice, ready to be
/// reduced to a scalar for ranking.
pub struct TopNCandidate<'a> {
    /// Canonical hex tsuid string — ties are broken on this, ascending
    /// (`[ADD 4.6b]`).
    pub series_id: &'a str,
    pub values: NumericValues<'a>,
}

/// Reduce every candidate with `config.aggregator` (via the C3 aggregator
/// library — Top-N never implements its own percentile math,
/// `[ADD 4.6b]`), then keep the top (or bottom, per `config.is_top`)
/// `config.count` by that scalar. Returns the **indices** into
/// `candidates` to keep, in ranked order.
pub fn select(candidates: &[TopNCandidate<'_>], config: &TopNConfig) -> CoreResult<Vec<usize>> {
    let mut scored = Vec::with_capacity(candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        if c.values.is_empty() {
            continue;
        }
        let mut out = MutableNumeric::default();
        aggregate::run(c.values, 0, c.values.len(), NanMode::Skip, config.aggregator, &mut out)?;
        scored.push((i, out.value()));
    }

    scored.sort_by(|(ia, a), (ib, b)| {
        let cmp = a.to_f64().partial_cmp(&b.to_f64()).unwrap_or(std::cmp::Ordering::Equal);
        let cmp = if config.is_top { cmp.reverse() } else { cmp };
        cmp.then_with(|| candidates[*ia].series_id.cmp(candidates[*ib].series_id))
    });

    Ok(scored.into_iter().take(config.count).map(|(i, _)| i).collect())
}
