//! Rate processor (spec §4.6 "Rate"): converts a numeric-array value into
//! a per-element rate-of-change array.

use crate::config::RateConfig;
use crate::error::{CoreError, CoreResult};
use crate::iterator::PullIterator;
use crate::timestamp::TimeStamp;
use crate::types::NumericArray;

/// Wraps a [`NumericArray`] source, emitting one rate array per input array
/// (spec §4.6 "Rate").
///
/// `interval_ns` must be positive — validated at construction rather than
/// per point (`[ADD 4.6a]`).
pub struct RateIterator<S> {
    source: S,
    config: RateConfig,
    current: (TimeStamp, NumericArray),
}

impl<S> RateIterator<S>
where
    S: PullIterator<Item = (TimeStamp, NumericArray)>,
{
    pub fn new(source: S, config: RateConfig) -> CoreResult<Self> {
        if !config.rate_to_count && !config.delta_only && config.interval_ns <= 0 {
            return Err(CoreError::invalid_input(format!(
                "RateConfig.interval_ns must be positive, got {}",
                config.interval_ns
            )));
        }
        Ok(RateIterator {
            source,
            config,
            current: (
                TimeStamp::new(0, 0),
                NumericArray::Double {
                    values: Vec::new(),
                    offset: 0,
                    end: 0,
                },
            ),
        })
    }

    fn compute(&self, src: &NumericArray, result_interval_sec: i64) -> Vec<f64> {
        let n = src.len();
        let mut out = vec![f64::NAN; n];
        if n == 0 {
            return out;
        }
        for i in 1..n {
            let prev = src.get_f64(i - 1);
            let cur = src.get_f64(i);
            if self.config.delta_only {
                let d = cur - prev;
                out[i] = if self.config.drop_resets && d < 0.0 { 0.0 } else { d };
                continue;
            }
            if self.config.rate_to_count {
                let ticks = self.config.data_interval_ms as f64 / 1000.0;
                out[i] = cur * ticks;
                continue;
            }
            let denom = (result_interval_sec * 1_000_000_000) as f64 / self.config.interval_ns as f64;
            let delta = cur - prev;
            let mut rate = if delta < 0.0 && self.config.counter {
                tracing::debug!(i, prev, cur, "counter reset detected");
                if self.config.drop_resets {
                    0.0
                } else {
                    (self.config.counter_max as f64 + cur - prev) / denom
                }
            } else {
                delta / denom
            };
            if self.config.reset_value > crate::config::RateConfig::DEFAULT_RESET
                && rate > self.config.reset_value as f64
            {
                rate = 0.0;
            }
            out[i] = rate;
        }
        out
    }
}

impl<S> PullIterator for RateIterator<S>
where
    S: PullIterator<Item = (TimeStamp, NumericArray)>,
{
    type Item = (TimeStamp, NumericArray);

    fn has_next(&mut self) -> bool {
        self.source.has_next()
    }

    fn next(&mut self) -> CoreResult<Option<&Self::Item>> {
        match self.source.next()? {
            Some((ts, arr)) => {
                // The result-series interval isn't carried per point in
                // this source type; callers configure `interval_ns` to
                // already be expressed in the desired per-point basis, so
                // `result_interval_sec` of 1 keeps the ratio as specified.
                let values = self.compute(arr, 1);
                self.current.0.set(ts.epoch_sec, ts.nanos);
                self.current.1 = NumericArray::Double {
                    end: values.len(),
                    values,
                    offset: 0,
                };
                Ok(Some(&self.current))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.source.close();
    }
}
